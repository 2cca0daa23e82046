//! FILENAME: core/pivot-engine/src/views.rs
//! Saved views and the selection/dirty bookkeeping around them.
//!
//! The registry is local state only; creating, updating and deleting views
//! on the backend is the caller's job. After a successful backend call the
//! caller mirrors the result here with `upsert` / `remove`.

use crate::definition::PivotArrangement;
use crate::error::PivotError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a saved view. `Unsaved` is the default sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewId {
    Unsaved,
    Saved(i64),
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewId::Unsaved => write!(f, "unsaved"),
            ViewId::Saved(id) => write!(f, "{}", id),
        }
    }
}

/// A named snapshot of the row/column layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedView {
    pub id: ViewId,
    pub name: String,
    pub rows: Vec<String>,
    pub cols: Vec<String>,
}

impl SavedView {
    pub fn new(id: i64, name: impl Into<String>, rows: Vec<String>, cols: Vec<String>) -> Self {
        SavedView {
            id: ViewId::Saved(id),
            name: name.into(),
            rows,
            cols,
        }
    }

    /// The sentinel used while no saved view is selected.
    pub fn default_view() -> Self {
        SavedView {
            id: ViewId::Unsaved,
            name: "Default".to_string(),
            rows: Vec::new(),
            cols: Vec::new(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == ViewId::Unsaved
    }

    /// Order-sensitive layout comparison.
    pub fn matches_layout(&self, arrangement: &PivotArrangement) -> bool {
        arrangement.same_layout(&self.rows, &self.cols)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// The layout that was applied when a view was loaded, next to the stored
/// layout it was derived from. The two differ when the stored view names
/// fields the dataset lacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LoadedLayout {
    id: ViewId,
    stored_rows: Vec<String>,
    stored_cols: Vec<String>,
    rows: Vec<String>,
    cols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRegistry {
    views: Vec<SavedView>,
    selected: ViewId,
    default_view: SavedView,
    /// Set once any view layout has been loaded into the pivot.
    view_loaded: bool,
    loaded_layout: Option<LoadedLayout>,
}

impl Default for ViewRegistry {
    fn default() -> Self {
        ViewRegistry::new()
    }
}

impl ViewRegistry {
    pub fn new() -> Self {
        ViewRegistry {
            views: Vec::new(),
            selected: ViewId::Unsaved,
            default_view: SavedView::default_view(),
            view_loaded: false,
            loaded_layout: None,
        }
    }

    /// Replaces the list with a fresh backend listing. A selection that no
    /// longer exists falls back like a delete would.
    pub fn replace(&mut self, views: Vec<SavedView>) {
        self.views = views;
        if self.get(&self.selected).is_none() {
            self.selected = self.fallback();
        }
    }

    /// Plain assignment of the selection. Guarding unsaved edits is the
    /// orchestrator's job.
    pub fn select(&mut self, id: &ViewId) -> Result<&SavedView, PivotError> {
        if self.get(id).is_none() {
            return Err(PivotError::ViewNotFound(id.to_string()));
        }
        self.selected = *id;
        self.view_loaded = true;
        Ok(self.selected())
    }

    /// Records that the selected view's layout was applied to the pivot.
    pub fn mark_loaded(&mut self) {
        self.view_loaded = true;
    }

    /// Records the layout actually applied for the selected view. Dirty
    /// tracking compares against it for as long as the stored view is
    /// unchanged.
    pub fn record_loaded(&mut self, rows: &[String], cols: &[String]) {
        let selected = self.selected();
        self.loaded_layout = Some(LoadedLayout {
            id: selected.id,
            stored_rows: selected.rows.clone(),
            stored_cols: selected.cols.clone(),
            rows: rows.to_vec(),
            cols: cols.to_vec(),
        });
        self.view_loaded = true;
    }

    pub fn was_loaded(&self) -> bool {
        self.view_loaded
    }

    /// Inserts or replaces a saved view by id.
    pub fn upsert(&mut self, view: SavedView) {
        match self.views.iter_mut().find(|v| v.id == view.id) {
            Some(existing) => *existing = view,
            None => self.views.push(view),
        }
    }

    /// Removes a view. When it was selected, the selection moves to the first
    /// remaining view, or to the default sentinel when none remain.
    pub fn remove(&mut self, id: &ViewId) -> Result<SavedView, PivotError> {
        let pos = match id {
            ViewId::Unsaved => None,
            ViewId::Saved(_) => self.views.iter().position(|v| v.id == *id),
        }
        .ok_or_else(|| PivotError::ViewNotFound(id.to_string()))?;

        let removed = self.views.remove(pos);
        if self.selected == *id {
            self.selected = self.fallback();
        }
        Ok(removed)
    }

    fn fallback(&self) -> ViewId {
        self.views.first().map_or(ViewId::Unsaved, |v| v.id)
    }

    pub fn selected(&self) -> &SavedView {
        self.get(&self.selected).unwrap_or(&self.default_view)
    }

    pub fn selected_id(&self) -> ViewId {
        self.selected
    }

    pub fn views(&self) -> &[SavedView] {
        &self.views
    }

    pub fn get(&self, id: &ViewId) -> Option<&SavedView> {
        match id {
            ViewId::Unsaved => Some(&self.default_view),
            ViewId::Saved(_) => self.views.iter().find(|v| v.id == *id),
        }
    }

    /// Sets the layout the default sentinel compares against.
    pub fn with_default_layout(mut self, rows: Vec<String>, cols: Vec<String>) -> Self {
        self.default_view.rows = rows;
        self.default_view.cols = cols;
        self
    }

    /// Whether `arrangement` differs from the selected view.
    ///
    /// Always false while the default sentinel is selected and no view has
    /// ever been loaded. A view whose layout was recorded on load is compared
    /// against that layout until the stored view changes.
    pub fn is_dirty(&self, arrangement: &PivotArrangement) -> bool {
        if self.selected == ViewId::Unsaved && !self.view_loaded {
            return false;
        }
        let selected = self.selected();
        match &self.loaded_layout {
            Some(loaded)
                if loaded.id == selected.id
                    && loaded.stored_rows == selected.rows
                    && loaded.stored_cols == selected.cols =>
            {
                !arrangement.same_layout(&loaded.rows, &loaded.cols)
            }
            _ => !selected.matches_layout(arrangement),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn registry() -> ViewRegistry {
        let mut registry = ViewRegistry::new();
        registry.replace(vec![
            SavedView::new(1, "Por usuario", s(&["User"]), vec![]),
            SavedView::new(2, "Por cliente", s(&["Client"]), s(&["Month"])),
        ]);
        registry
    }

    #[test]
    fn test_default_is_clean_before_any_load() {
        let registry = ViewRegistry::new();
        let arrangement = PivotArrangement::new("Minutes").with_rows(["User"]);
        assert!(!registry.is_dirty(&arrangement));
    }

    #[test]
    fn test_default_tracks_dirty_after_load() {
        let mut registry = ViewRegistry::new();
        registry.mark_loaded();
        let arrangement = PivotArrangement::new("Minutes").with_rows(["User"]);
        assert!(registry.is_dirty(&arrangement));
        assert!(!registry.is_dirty(&PivotArrangement::new("Minutes")));
    }

    #[test]
    fn test_dirty_is_order_sensitive() {
        let mut registry = ViewRegistry::new();
        registry.replace(vec![SavedView::new(5, "AB", s(&["User", "Client"]), vec![])]);
        registry.select(&ViewId::Saved(5)).unwrap();

        let same = PivotArrangement::new("Minutes").with_rows(["User", "Client"]);
        let swapped = PivotArrangement::new("Minutes").with_rows(["Client", "User"]);
        assert!(!registry.is_dirty(&same));
        assert!(registry.is_dirty(&swapped));
    }

    #[test]
    fn test_recorded_layout_is_the_clean_baseline() {
        let mut registry = ViewRegistry::new();
        registry.replace(vec![
            SavedView::new(1, "Legacy", s(&["Usuario", "User"]), vec![]),
            SavedView::new(2, "Other", s(&["Client"]), vec![]),
        ]);
        registry.select(&ViewId::Saved(1)).unwrap();
        registry.record_loaded(&s(&["User"]), &[]);

        let loaded = PivotArrangement::new("Minutes").with_rows(["User"]);
        assert!(!registry.is_dirty(&loaded));
        assert!(registry.is_dirty(&PivotArrangement::new("Minutes").with_rows(["Client"])));

        // Once the stored view changes it is the baseline again
        registry.upsert(SavedView::new(1, "Legacy", s(&["Client"]), vec![]));
        assert!(registry.is_dirty(&loaded));

        // A baseline recorded for another view does not apply
        registry.select(&ViewId::Saved(2)).unwrap();
        assert!(registry.is_dirty(&loaded));
    }

    #[test]
    fn test_select_unknown_view() {
        let mut registry = registry();
        assert_eq!(
            registry.select(&ViewId::Saved(99)).map(|v| v.id),
            Err(PivotError::ViewNotFound("99".to_string()))
        );
        assert_eq!(registry.selected_id(), ViewId::Unsaved);
    }

    #[test]
    fn test_remove_selected_falls_back_to_first() {
        let mut registry = registry();
        registry.select(&ViewId::Saved(2)).unwrap();
        registry.remove(&ViewId::Saved(2)).unwrap();
        assert_eq!(registry.selected_id(), ViewId::Saved(1));

        registry.remove(&ViewId::Saved(1)).unwrap();
        assert_eq!(registry.selected_id(), ViewId::Unsaved);
        assert!(registry.selected().is_default());
    }

    #[test]
    fn test_remove_unsaved_or_missing() {
        let mut registry = registry();
        assert_eq!(
            registry.remove(&ViewId::Unsaved),
            Err(PivotError::ViewNotFound("unsaved".to_string()))
        );
        registry.remove(&ViewId::Saved(1)).unwrap();
        assert!(registry.remove(&ViewId::Saved(1)).is_err());
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut registry = registry();
        registry.upsert(SavedView::new(1, "Renamed", s(&["Task"]), vec![]));
        assert_eq!(registry.views().len(), 2);
        assert_eq!(registry.views()[0].name, "Renamed");

        registry.upsert(SavedView::new(3, "New", vec![], vec![]));
        assert_eq!(registry.views().len(), 3);
    }

    #[test]
    fn test_replace_drops_stale_selection() {
        let mut registry = registry();
        registry.select(&ViewId::Saved(2)).unwrap();
        registry.replace(vec![SavedView::new(7, "Only", vec![], vec![])]);
        assert_eq!(registry.selected_id(), ViewId::Saved(7));
    }
}
