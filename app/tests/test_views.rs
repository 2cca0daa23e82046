//! FILENAME: tests/test_views.rs
//! Integration tests for saved views: CRUD, dirty tracking and switching.

mod common;

use app_lib::{AppError, SessionEvent, SwitchDecision, SwitchOutcome};
use common::{s, TestHarness};
use pivot_engine::ViewId;
use report_client::ReportApi;

// ============================================================================
// DIRTY TRACKING
// ============================================================================

#[tokio::test]
async fn test_load_is_clean_user_change_is_dirty() {
    let mut h = TestHarness::mounted_with_views().await;
    let cliente = h.view_id("Por cliente");

    assert_eq!(h.session.click_view(cliente).unwrap(), SwitchOutcome::Switched);
    assert_eq!(h.session.arrangement().row_fields, s(&["Client"]));
    assert_eq!(h.session.arrangement().col_fields, s(&["Month"]));
    assert!(!h.session.is_dirty());

    h.session.rearrange(s(&["Client"]), vec![]).unwrap();
    assert!(h.session.is_dirty());

    // Putting the layout back makes it clean again
    h.session.rearrange(s(&["Client"]), s(&["Month"])).unwrap();
    assert!(!h.session.is_dirty());
}

#[tokio::test]
async fn test_field_order_matters() {
    let mut h = TestHarness::with_productivity_data();
    h.seed_view("Dos niveles", &["User", "Client"], &[]);
    h.session.mount().await.unwrap();

    h.session.rearrange(s(&["Client", "User"]), vec![]).unwrap();
    assert!(h.session.is_dirty());
}

#[tokio::test]
async fn test_view_with_unknown_field_loads_clean() {
    let mut h = TestHarness::with_productivity_data();
    let legacy = h.seed_view("Legacy", &["Usuario", "User"], &[]);
    let other = h.seed_view("Other", &["Client"], &[]);
    h.session.mount().await.unwrap();

    assert_eq!(h.session.selected_view().id, legacy);
    assert_eq!(h.session.arrangement().row_fields, s(&["User"]));
    assert!(!h.session.is_dirty());

    assert_eq!(h.session.click_view(other).unwrap(), SwitchOutcome::Switched);
    assert!(h.session.pending_switch().is_none());

    // Coming back is clean too, and a real edit still counts
    assert_eq!(h.session.click_view(legacy).unwrap(), SwitchOutcome::Switched);
    assert!(!h.session.is_dirty());
    h.session.rearrange(s(&["Client"]), vec![]).unwrap();
    assert!(h.session.is_dirty());
}

#[tokio::test]
async fn test_clicking_selected_view_is_a_no_op() {
    let mut h = TestHarness::mounted_with_views().await;
    let usuario = h.view_id("Por usuario");
    assert_eq!(h.session.click_view(usuario).unwrap(), SwitchOutcome::AlreadySelected);
}

// ============================================================================
// SWITCH DECISIONS
// ============================================================================

async fn dirty_harness() -> (TestHarness, ViewId, ViewId) {
    let mut h = TestHarness::mounted_with_views().await;
    let usuario = h.view_id("Por usuario");
    let cliente = h.view_id("Por cliente");
    h.session.rearrange(s(&["Client"]), vec![]).unwrap();
    assert!(h.session.is_dirty());
    (h, usuario, cliente)
}

#[tokio::test]
async fn test_dirty_switch_requires_decision() {
    let (mut h, usuario, cliente) = dirty_harness().await;
    let events = h.record_events();

    let outcome = h.session.click_view(cliente).unwrap();
    assert_eq!(outcome, SwitchOutcome::DecisionRequired { target: cliente });
    assert_eq!(h.session.selected_view().id, usuario);
    assert_eq!(h.session.arrangement().row_fields, s(&["Client"]));
    assert_eq!(h.session.pending_switch(), Some(cliente));
    assert_eq!(
        *events.lock().unwrap(),
        vec![SessionEvent::SwitchDecisionRequired { target: cliente }]
    );
}

#[tokio::test]
async fn test_cancel_keeps_everything() {
    let (mut h, usuario, cliente) = dirty_harness().await;
    h.session.click_view(cliente).unwrap();

    let outcome = h.session.resolve_switch(SwitchDecision::Cancel).await.unwrap();
    assert_eq!(outcome, SwitchOutcome::Cancelled);
    assert_eq!(h.session.selected_view().id, usuario);
    assert_eq!(h.session.arrangement().row_fields, s(&["Client"]));
    assert!(h.session.is_dirty());
    assert_eq!(h.session.pending_switch(), None);
}

#[tokio::test]
async fn test_discard_switches_without_saving() {
    let (mut h, usuario, cliente) = dirty_harness().await;
    h.session.click_view(cliente).unwrap();

    let outcome = h.session.resolve_switch(SwitchDecision::Discard).await.unwrap();
    assert_eq!(outcome, SwitchOutcome::Switched);
    assert_eq!(h.session.selected_view().id, cliente);
    assert!(!h.session.is_dirty());

    let stored = h.api.stored_views();
    let original = stored.iter().find(|v| v.id == Some(raw(usuario))).unwrap();
    assert_eq!(original.rows, s(&["User"]));
}

#[tokio::test]
async fn test_save_overwrites_then_switches() {
    let (mut h, usuario, cliente) = dirty_harness().await;
    h.session.click_view(cliente).unwrap();

    let outcome = h.session.resolve_switch(SwitchDecision::Save).await.unwrap();
    assert_eq!(outcome, SwitchOutcome::Switched);
    assert_eq!(h.session.selected_view().id, cliente);

    let stored = h.api.stored_views();
    let saved = stored.iter().find(|v| v.id == Some(raw(usuario))).unwrap();
    assert_eq!(saved.name, "Por usuario");
    assert_eq!(saved.rows, s(&["Client"]));
    assert!(saved.cols.is_empty());
}

#[tokio::test]
async fn test_save_as_creates_then_switches() {
    let (mut h, _usuario, cliente) = dirty_harness().await;
    h.session.click_view(cliente).unwrap();

    let outcome = h
        .session
        .resolve_switch(SwitchDecision::SaveAs {
            name: "Solo clientes".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, SwitchOutcome::Switched);
    assert_eq!(h.session.selected_view().id, cliente);
    assert_eq!(h.session.views().len(), 3);
    assert_eq!(h.view_id("Solo clientes"), h.session.views()[2].id);
    assert_eq!(h.session.views()[2].rows, s(&["Client"]));
}

#[tokio::test]
async fn test_failed_save_keeps_pending_switch() {
    let (mut h, usuario, cliente) = dirty_harness().await;
    h.session.click_view(cliente).unwrap();
    h.session.take_notifications();

    h.api.fail_next(500, "write failed");
    let err = h.session.resolve_switch(SwitchDecision::Save).await.unwrap_err();
    assert!(err.is_transient());

    assert_eq!(h.session.pending_switch(), Some(cliente));
    assert_eq!(h.session.selected_view().id, usuario);
    assert_eq!(h.session.arrangement().row_fields, s(&["Client"]));
    assert_eq!(h.session.notifications().len(), 1);

    // Retrying works once the backend recovers
    let outcome = h.session.resolve_switch(SwitchDecision::Save).await.unwrap();
    assert_eq!(outcome, SwitchOutcome::Switched);
}

#[tokio::test]
async fn test_save_on_default_view_needs_a_name() {
    let mut h = TestHarness::with_productivity_data();
    h.session.mount().await.unwrap();
    h.session.rearrange(s(&["User"]), vec![]).unwrap();
    assert!(h.session.is_dirty());

    let target = h.seed_view("Por cliente", &["Client"], &[]);
    h.session.reload_views().await.unwrap();

    assert_eq!(
        h.session.click_view(target).unwrap(),
        SwitchOutcome::DecisionRequired { target }
    );
    let err = h.session.resolve_switch(SwitchDecision::Save).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.session.pending_switch(), Some(target));

    let outcome = h
        .session
        .resolve_switch(SwitchDecision::SaveAs {
            name: "Por usuario".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, SwitchOutcome::Switched);
    assert_eq!(h.api.stored_views().len(), 2);
}

// ============================================================================
// CRUD
// ============================================================================

fn raw(id: ViewId) -> i64 {
    match id {
        ViewId::Saved(id) => id,
        ViewId::Unsaved => panic!("unsaved view has no id"),
    }
}

#[tokio::test]
async fn test_create_then_update_round_trip() {
    let mut h = TestHarness::mounted_with_views().await;
    h.session.rearrange(s(&["Client"]), s(&["User"])).unwrap();

    let created = h.session.create_view("  Cruce  ").await.unwrap();
    assert_eq!(created.name, "Cruce");
    assert_eq!(h.session.selected_view().id, created.id);
    assert!(!h.session.is_dirty());

    let listed = h.api.list_views().await.unwrap();
    assert!(listed
        .iter()
        .any(|v| v.name == "Cruce" && v.rows == s(&["Client"]) && v.cols == s(&["User"])));

    let updated = h
        .session
        .update_view(created.id, "Cruce mensual", s(&["Month"]), s(&["User"]))
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);

    let listed = h.api.list_views().await.unwrap();
    let stored = listed.iter().find(|v| v.id == Some(raw(created.id))).unwrap();
    assert_eq!(stored.name, "Cruce mensual");
    assert_eq!(stored.rows, s(&["Month"]));
    assert!(!listed.iter().any(|v| v.name == "Cruce"));

    // The selected view changed under the live layout
    assert!(h.session.is_dirty());
}

#[tokio::test]
async fn test_blank_name_is_refused_before_network() {
    let mut h = TestHarness::mounted_with_views().await;
    h.api.fail_next(500, "should not be consumed");

    let err = h.session.create_view("   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // The queued failure is still waiting for the first real call
    assert!(h.api.list_labels().await.is_err());
    assert_eq!(h.api.stored_views().len(), 2);
}

#[tokio::test]
async fn test_default_view_cannot_be_updated_or_deleted() {
    let mut h = TestHarness::mounted_with_views().await;

    let err = h
        .session
        .update_view(ViewId::Unsaved, "x", vec![], vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = h.session.delete_view(ViewId::Unsaved).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_missing_view_maps_to_not_found() {
    let mut h = TestHarness::mounted_with_views().await;
    h.session.take_notifications();

    let err = h
        .session
        .update_view(ViewId::Saved(404), "x", vec![], vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(!err.is_transient());
    assert_eq!(h.session.notifications().len(), 1);
}

#[tokio::test]
async fn test_update_selected_view_stores_live_layout() {
    let mut h = TestHarness::mounted_with_views().await;
    h.session.rearrange(s(&["User", "Client"]), vec![]).unwrap();
    assert!(h.session.is_dirty());

    h.session.update_selected_view().await.unwrap();
    assert!(!h.session.is_dirty());
    assert_eq!(h.session.selected_view().rows, s(&["User", "Client"]));
}

#[tokio::test]
async fn test_deleting_selected_view_falls_back() {
    let mut h = TestHarness::mounted_with_views().await;
    let usuario = h.view_id("Por usuario");
    let cliente = h.view_id("Por cliente");

    h.session.delete_view(usuario).await.unwrap();
    assert_eq!(h.session.selected_view().id, cliente);
    assert_eq!(h.session.arrangement().row_fields, s(&["Client"]));
    assert!(!h.session.is_dirty());

    h.session.delete_view(cliente).await.unwrap();
    assert_eq!(h.session.selected_view().id, ViewId::Unsaved);
    assert!(h.session.arrangement().row_fields.is_empty());
    assert!(h.session.views().is_empty());
    assert!(h.api.stored_views().is_empty());
}

#[tokio::test]
async fn test_deleting_other_view_keeps_selection() {
    let mut h = TestHarness::mounted_with_views().await;
    let usuario = h.view_id("Por usuario");
    let cliente = h.view_id("Por cliente");
    h.session.rearrange(s(&["Client"]), vec![]).unwrap();

    h.session.delete_view(cliente).await.unwrap();
    assert_eq!(h.session.selected_view().id, usuario);
    assert_eq!(h.session.arrangement().row_fields, s(&["Client"]));
    assert!(h.session.is_dirty());
}

#[tokio::test]
async fn test_stale_view_listed_elsewhere_is_dropped_on_reload() {
    let mut h = TestHarness::mounted_with_views().await;
    let usuario = h.view_id("Por usuario");

    h.api.delete_view(raw(usuario)).await.unwrap();
    h.session.reload_views().await.unwrap();

    assert_eq!(h.session.views().len(), 1);
    assert_eq!(h.session.selected_view().id, h.view_id("Por cliente"));
    assert_eq!(h.session.arrangement().row_fields, s(&["Client"]));
    assert!(!h.session.is_dirty());
}
