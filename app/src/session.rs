//! FILENAME: app/src/session.rs
//! PURPOSE: The report orchestrator. Owns the fact table, the field filters,
//! the pivot arrangement and the saved-view registry, and mediates every
//! backend call.
//! CONTEXT: One logical owner drives the session (`&mut self`). Backend
//! failures are turned into notifications here, the last good state is kept,
//! and the error is also returned to the caller.

use crate::error::AppError;
use crate::events::{EventBus, Notification, NotificationLevel, SessionEvent, SubscriptionId};
use crate::filters::FilterSpec;
use crate::loader::{self, LoadedFacts};
use crate::{log_debug, log_enter, log_error, log_exit, log_info, log_warn};
use chrono::NaiveDate;
use fact_model::{FactRow, FactSchema, FactTable, FactValue};
use pivot_engine::{
    derive_cross_tab, domain_of, drill_down, render, ChangeOrigin, CrossTab, CrossTabView, FieldFilterState,
    MeasureFields, MeasureUnit, PivotArrangement, PivotError, PivotEvent, PivotState, SavedView, ViewId,
    ViewRegistry,
};
use report_client::{ClientError, Label, LabelId, ProductivityRequest, ProductivityViewDto, ReportApi};
use std::path::{Path, PathBuf};

// ============================================================================
// OUTCOMES
// ============================================================================

/// Identifies one fact load. Only the most recently issued ticket may
/// replace the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The loaded table is now current.
    Applied { rows: usize },
    /// A newer load was started in the meantime; this result was dropped.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched,
    AlreadySelected,
    /// The current layout has unsaved changes. Answer with `resolve_switch`.
    DecisionRequired { target: ViewId },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchDecision {
    /// Overwrite the selected view with the current layout, then switch.
    Save,
    /// Store the current layout as a new view, then switch.
    SaveAs { name: String },
    /// Drop the unsaved layout and switch.
    Discard,
    /// Stay on the current view with the current layout.
    Cancel,
}

// ============================================================================
// SESSION
// ============================================================================

pub struct ReportSession<A: ReportApi> {
    api: A,
    schema: FactSchema,
    fields: Vec<String>,
    labels: Vec<Label>,
    filter: FilterSpec,
    raw: FactTable,
    field_filters: FieldFilterState,
    pivot: PivotState,
    views: ViewRegistry,
    pending_switch: Option<ViewId>,
    load_seq: u64,
    loading: Option<LoadTicket>,
    notifications: Vec<Notification>,
    events: EventBus,
    last_dirty: bool,
}

impl<A: ReportApi> ReportSession<A> {
    pub fn new(api: A) -> Self {
        ReportSession::with_schema(api, FactSchema::productivity(), MeasureUnit::default())
    }

    pub fn with_schema(api: A, schema: FactSchema, unit: MeasureUnit) -> Self {
        let fields = schema.field_names();
        ReportSession {
            api,
            raw: FactTable::empty(fields.clone()),
            fields,
            schema,
            labels: Vec::new(),
            filter: FilterSpec::new(),
            field_filters: FieldFilterState::new(),
            pivot: PivotState::new(MeasureFields::default(), unit),
            views: ViewRegistry::new(),
            pending_switch: None,
            load_seq: 0,
            loading: None,
            notifications: Vec::new(),
            events: EventBus::new(),
            last_dirty: false,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    /// Labels shown as selected in the filter bar.
    pub fn selected_labels(&self) -> Vec<LabelId> {
        self.filter.selected_labels(&self.label_ids())
    }

    /// The unfiltered table of the last successful load.
    pub fn raw_table(&self) -> &FactTable {
        &self.raw
    }

    pub fn field_filters(&self) -> &FieldFilterState {
        &self.field_filters
    }

    pub fn arrangement(&self) -> &PivotArrangement {
        self.pivot.arrangement()
    }

    pub fn unit(&self) -> MeasureUnit {
        self.pivot.unit()
    }

    /// Fields on neither axis (the field list of the pivot UI).
    pub fn unused_fields(&self) -> Vec<String> {
        self.pivot.arrangement().unused_fields(&self.fields)
    }

    pub fn views(&self) -> &[SavedView] {
        self.views.views()
    }

    pub fn selected_view(&self) -> &SavedView {
        self.views.selected()
    }

    pub fn pending_switch(&self) -> Option<ViewId> {
        self.pending_switch
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.views.is_dirty(self.pivot.arrangement())
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn label_ids(&self) -> Vec<LabelId> {
        self.labels.iter().map(|l| l.label_id).collect()
    }

    // ------------------------------------------------------------------
    // Mount
    // ------------------------------------------------------------------

    /// Initial load: views, labels, the first saved view's layout, then
    /// facts for every label.
    pub async fn mount(&mut self) -> Result<(), AppError> {
        log_enter!("SESSION", "mount");

        self.reload_views().await?;

        let labels = match self.api.list_labels().await {
            Ok(labels) => labels,
            Err(e) => return Err(self.surface("Could not load labels", e.into())),
        };
        self.labels = labels;
        let all = self.label_ids();
        self.filter.set_labels(all.iter().copied(), &all);

        let first = self.views.views().first().map_or(ViewId::Unsaved, |v| v.id);
        self.switch_to(first)?;

        let outcome = self.search().await?;
        log_exit!("SESSION", "mount", "{:?} views={} labels={}", outcome, self.views.views().len(), self.labels.len());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Fact loading
    // ------------------------------------------------------------------

    /// Validates the filter and issues a ticket for a new load. Any load
    /// still in flight is superseded.
    pub fn begin_search(&mut self) -> Result<(LoadTicket, ProductivityRequest), AppError> {
        self.filter.validate()?;
        self.load_seq += 1;
        let ticket = LoadTicket(self.load_seq);
        self.loading = Some(ticket);
        log_debug!("SESSION", "begin load #{}", ticket.0);
        Ok((ticket, self.filter.to_request()))
    }

    /// Applies the result of the load identified by `ticket`.
    ///
    /// Results of superseded tickets are dropped, failures included. On
    /// failure the previous table stays current.
    pub fn finish_search(
        &mut self,
        ticket: LoadTicket,
        result: Result<LoadedFacts, AppError>,
    ) -> Result<LoadOutcome, AppError> {
        if self.loading != Some(ticket) {
            log_debug!("SESSION", "load #{} superseded", ticket.0);
            self.events.emit(&SessionEvent::LoadSuperseded { ticket: ticket.0 });
            return Ok(LoadOutcome::Superseded);
        }
        self.loading = None;

        match result {
            Err(e) => {
                let err = self.surface("Could not load the report", e);
                self.events.emit(&SessionEvent::LoadFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
            Ok(loaded) => {
                let rows = if loaded.table.is_placeholder() { 0 } else { loaded.table.len() };
                self.raw = loaded.table;
                self.field_filters.reconcile(&self.raw);
                let known = self.label_ids();
                self.filter.reconcile_with(&loaded.request, &known);
                log_info!("SESSION", "load #{} applied: {} rows", ticket.0, rows);
                self.events.emit(&SessionEvent::FactsLoaded { rows });
                Ok(LoadOutcome::Applied { rows })
            }
        }
    }

    /// Fetches facts for the current filter.
    pub async fn search(&mut self) -> Result<LoadOutcome, AppError> {
        let (ticket, request) = match self.begin_search() {
            Ok(started) => started,
            Err(e) => return Err(self.warn(e)),
        };
        let result = loader::fetch(&self.api, &self.schema, &request).await;
        self.finish_search(ticket, result)
    }

    pub fn set_label_filter<I>(&mut self, labels: I)
    where
        I: IntoIterator<Item = LabelId>,
    {
        let known = self.label_ids();
        self.filter.set_labels(labels, &known);
    }

    /// Sets the day range. An inverted range is refused and the stored
    /// range is left as it was.
    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), AppError> {
        let candidate = FilterSpec {
            from_date: from,
            to_date: to,
            ..self.filter.clone()
        };
        if let Err(e) = candidate.validate() {
            return Err(self.warn(e));
        }
        self.filter = candidate;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Field filters
    // ------------------------------------------------------------------

    /// Distinct values of `field` in the unfiltered table.
    pub fn field_domain(&self, field: &str) -> Result<Vec<FactValue>, AppError> {
        Ok(domain_of(&self.raw, field)?)
    }

    pub fn set_field_filter<I>(&mut self, field: &str, selected: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = FactValue>,
    {
        self.field_filters.set_filter(&self.raw, field, selected)?;
        self.events.emit(&SessionEvent::FieldFilterChanged {
            field: field.to_string(),
        });
        Ok(())
    }

    pub fn clear_field_filter(&mut self, field: &str) -> bool {
        let cleared = self.field_filters.clear(field);
        if cleared {
            self.events.emit(&SessionEvent::FieldFilterChanged {
                field: field.to_string(),
            });
        }
        cleared
    }

    /// The raw table with field filters applied. When nothing passes, the
    /// placeholder row stands in so the pivot renders empty.
    pub fn filtered_table(&self) -> Result<FactTable, AppError> {
        let table = self.field_filters.apply(&self.raw)?;
        if table.is_empty() && !self.raw.is_empty() {
            return Ok(FactTable::placeholder(self.fields.clone()));
        }
        Ok(table)
    }

    // ------------------------------------------------------------------
    // Pivot
    // ------------------------------------------------------------------

    /// A rearrangement made by the user. Invalid layouts are refused and
    /// the current one is kept.
    pub fn rearrange(&mut self, rows: Vec<String>, cols: Vec<String>) -> Result<PivotEvent, AppError> {
        let event = match self.pivot.user_rearrange(rows, cols, &self.fields) {
            Ok(event) => event,
            Err(e) => {
                log_warn!("SESSION", "rearrange refused: {}", e);
                return Err(e.into());
            }
        };
        if event.affects_layout() {
            self.events.emit(&SessionEvent::PivotChanged {
                origin: ChangeOrigin::User,
            });
            self.refresh_dirty();
        }
        Ok(event)
    }

    /// Switches between minutes and hours. Never marks the view dirty.
    pub fn set_unit(&mut self, unit: MeasureUnit) -> PivotEvent {
        let event = self.pivot.set_unit(unit);
        self.events.emit(&SessionEvent::PivotChanged { origin: event.origin() });
        event
    }

    pub fn cross_tab(&self) -> Result<CrossTab, AppError> {
        let table = self.filtered_table()?;
        Ok(derive_cross_tab(&table, self.pivot.arrangement())?)
    }

    /// The currently rendered grid.
    pub fn view(&self) -> Result<CrossTabView, AppError> {
        Ok(render(&self.cross_tab()?))
    }

    /// The filtered facts behind one cell.
    pub fn drill_down(&self, row_key: &[FactValue], col_key: &[FactValue]) -> Result<Vec<FactRow>, AppError> {
        let table = self.filtered_table()?;
        let positions = drill_down(&table, self.pivot.arrangement(), row_key, col_key)?;
        Ok(positions.into_iter().map(|i| table.rows()[i].clone()).collect())
    }

    /// Writes the rendered grid to `<dir>/<file_name_base>.xlsx`.
    pub fn export(&mut self, dir: &Path, file_name_base: &str) -> Result<PathBuf, AppError> {
        let view = self.view()?;
        match persistence::export_view(&view, dir, file_name_base) {
            Ok(path) => {
                log_info!("SESSION", "exported {}", path.display());
                self.notify(Notification::success(format!("Exported {}", path.display())));
                Ok(path)
            }
            Err(e) => Err(self.surface("Could not export the report", e.into())),
        }
    }

    // ------------------------------------------------------------------
    // View selection
    // ------------------------------------------------------------------

    /// A click on a view in the list. With unsaved changes the switch waits
    /// for `resolve_switch`.
    pub fn click_view(&mut self, id: ViewId) -> Result<SwitchOutcome, AppError> {
        if id == self.views.selected_id() {
            return Ok(SwitchOutcome::AlreadySelected);
        }
        if self.views.get(&id).is_none() {
            return Err(AppError::NotFound(format!("view {}", id)));
        }
        if self.is_dirty() {
            log_debug!("SESSION", "switch to {} waits for a decision", id);
            self.pending_switch = Some(id);
            self.events.emit(&SessionEvent::SwitchDecisionRequired { target: id });
            return Ok(SwitchOutcome::DecisionRequired { target: id });
        }
        self.switch_to(id)?;
        Ok(SwitchOutcome::Switched)
    }

    /// Answers a pending `DecisionRequired`. When saving fails the switch
    /// stays pending and the current layout is kept.
    pub async fn resolve_switch(&mut self, decision: SwitchDecision) -> Result<SwitchOutcome, AppError> {
        let Some(target) = self.pending_switch else {
            return Err(AppError::validation("no view switch is pending"));
        };

        match decision {
            SwitchDecision::Cancel => {
                self.pending_switch = None;
                return Ok(SwitchOutcome::Cancelled);
            }
            SwitchDecision::Discard => {}
            SwitchDecision::Save => {
                if self.views.selected().is_default() {
                    return Err(self.warn(AppError::validation(
                        "the default view cannot be overwritten; save it under a name",
                    )));
                }
                self.update_selected_view().await?;
            }
            SwitchDecision::SaveAs { name } => {
                self.store_new_view(&name).await?;
            }
        }

        self.pending_switch = None;
        self.switch_to(target)?;
        Ok(SwitchOutcome::Switched)
    }

    /// Selects `id` and loads its layout as a programmatic change.
    fn switch_to(&mut self, id: ViewId) -> Result<(), AppError> {
        let view = match self.views.select(&id) {
            Ok(view) => view.clone(),
            Err(PivotError::ViewNotFound(what)) => return Err(AppError::NotFound(format!("view {}", what))),
            Err(e) => return Err(e.into()),
        };

        let event = self.pivot.load_arrangement(&view.rows, &view.cols, &self.fields);
        let applied = self.pivot.arrangement();
        self.views.record_loaded(&applied.row_fields, &applied.col_fields);
        if let PivotEvent::Loaded { dropped } = &event {
            if !dropped.is_empty() {
                log_warn!("SESSION", "view {:?} references unusable fields {:?}", view.name, dropped);
            }
        }
        log_info!("SESSION", "selected view {} ({})", id, view.name);

        self.events.emit(&SessionEvent::PivotChanged { origin: event.origin() });
        self.events.emit(&SessionEvent::ViewSelected { id });
        self.refresh_dirty();
        Ok(())
    }

    // ------------------------------------------------------------------
    // View CRUD
    // ------------------------------------------------------------------

    /// Re-reads the saved views from the backend. When the selected view
    /// disappeared, the fallback view's layout is loaded.
    pub async fn reload_views(&mut self) -> Result<(), AppError> {
        let dtos = match self.api.list_views().await {
            Ok(dtos) => dtos,
            Err(e) => return Err(self.surface("Could not load saved views", e.into())),
        };

        let mut views = Vec::with_capacity(dtos.len());
        for dto in dtos {
            match saved_view(dto) {
                Some(view) => views.push(view),
                None => log_warn!("SESSION", "skipping a saved view without id"),
            }
        }
        let previous = self.views.selected_id();
        self.views.replace(views);
        self.events.emit(&SessionEvent::ViewsChanged);

        let current = self.views.selected_id();
        if current != previous {
            log_info!("SESSION", "selected view {} is gone, falling back to {}", previous, current);
            self.switch_to(current)?;
        } else {
            self.refresh_dirty();
        }
        Ok(())
    }

    /// Saves the current layout as a new view and selects it.
    pub async fn create_view(&mut self, name: &str) -> Result<SavedView, AppError> {
        let view = self.store_new_view(name).await?;
        if let Err(e) = self.views.select(&view.id) {
            return Err(e.into());
        }
        self.events.emit(&SessionEvent::ViewSelected { id: view.id });
        self.refresh_dirty();
        Ok(view)
    }

    async fn store_new_view(&mut self, name: &str) -> Result<SavedView, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.warn(AppError::validation("a view needs a name")));
        }

        let arrangement = self.pivot.arrangement();
        let dto = ProductivityViewDto::new(name, arrangement.row_fields.clone(), arrangement.col_fields.clone());
        let created = match self.api.create_view(&dto).await {
            Ok(created) => created,
            Err(e) => return Err(self.surface("Could not save the view", e.into())),
        };
        let Some(view) = saved_view(created) else {
            let err = ClientError::Backend {
                status: 502,
                message: "created view has no id".to_string(),
            };
            return Err(self.surface("Could not save the view", err.into()));
        };

        log_info!("SESSION", "created view {} ({})", view.id, view.name);
        self.views.upsert(view.clone());
        self.events.emit(&SessionEvent::ViewsChanged);
        self.notify(Notification::success(format!("View \"{}\" saved", view.name)));
        Ok(view)
    }

    /// Overwrites a saved view. The default sentinel cannot be updated.
    pub async fn update_view(
        &mut self,
        id: ViewId,
        name: &str,
        rows: Vec<String>,
        cols: Vec<String>,
    ) -> Result<SavedView, AppError> {
        let ViewId::Saved(raw_id) = id else {
            return Err(AppError::NotFound("the default view is not stored".to_string()));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(self.warn(AppError::validation("a view needs a name")));
        }

        let dto = ProductivityViewDto::new(name, rows, cols);
        let stored = match self.api.update_view(raw_id, &dto).await {
            Ok(stored) => stored,
            Err(e) => return Err(self.surface("Could not update the view", e.into())),
        };
        let view = SavedView::new(stored.id.unwrap_or(raw_id), stored.name, stored.rows, stored.cols);

        log_info!("SESSION", "updated view {} ({})", view.id, view.name);
        self.views.upsert(view.clone());
        self.events.emit(&SessionEvent::ViewsChanged);
        self.refresh_dirty();
        self.notify(Notification::success(format!("View \"{}\" updated", view.name)));
        Ok(view)
    }

    /// Stores the current layout into the selected view.
    pub async fn update_selected_view(&mut self) -> Result<SavedView, AppError> {
        let selected = self.views.selected().clone();
        let arrangement = self.pivot.arrangement();
        let (rows, cols) = (arrangement.row_fields.clone(), arrangement.col_fields.clone());
        self.update_view(selected.id, &selected.name, rows, cols).await
    }

    /// Deletes a saved view. When it was selected, the fallback view's
    /// layout is loaded.
    pub async fn delete_view(&mut self, id: ViewId) -> Result<(), AppError> {
        let ViewId::Saved(raw_id) = id else {
            return Err(AppError::NotFound("the default view is not stored".to_string()));
        };

        if let Err(e) = self.api.delete_view(raw_id).await {
            return Err(self.surface("Could not delete the view", e.into()));
        }

        let was_selected = self.views.selected_id() == id;
        match self.views.remove(&id) {
            Ok(removed) => log_info!("SESSION", "deleted view {} ({})", id, removed.name),
            Err(e) => log_warn!("SESSION", "deleted view was not listed locally: {}", e),
        }
        if self.pending_switch == Some(id) {
            self.pending_switch = None;
        }
        self.events.emit(&SessionEvent::ViewsChanged);

        if was_selected {
            let fallback = self.views.selected_id();
            self.switch_to(fallback)?;
        }
        self.notify(Notification::success("View deleted"));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    fn notify(&mut self, notification: Notification) {
        self.events.emit(&SessionEvent::Notification(notification.clone()));
        self.notifications.push(notification);
    }

    /// Logs a failed backend or export call and raises an error toast.
    fn surface(&mut self, context: &str, err: AppError) -> AppError {
        log_error!("SESSION", "{}: {}", context, err);
        self.notify(Notification::error(format!("{}: {}", context, err)));
        err
    }

    /// Raises a warning toast for input the user must correct.
    fn warn(&mut self, err: AppError) -> AppError {
        log_warn!("SESSION", "{}", err);
        self.notify(Notification::new(NotificationLevel::Warning, err.to_string()));
        err
    }

    fn refresh_dirty(&mut self) {
        let dirty = self.is_dirty();
        if dirty != self.last_dirty {
            self.last_dirty = dirty;
            self.events.emit(&SessionEvent::DirtyChanged { dirty });
        }
    }
}

fn saved_view(dto: ProductivityViewDto) -> Option<SavedView> {
    dto.id.map(|id| SavedView::new(id, dto.name, dto.rows, dto.cols))
}
