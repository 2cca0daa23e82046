//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for report session integration tests.

#![allow(dead_code)]

use app_lib::{ReportSession, SessionEvent};
use fact_model::FactValue;
use pivot_engine::ViewId;
use report_client::{Label, LabelId, MemoryReportApi};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub type Session = ReportSession<Arc<MemoryReportApi>>;

/// A session over an in-process backend. The harness keeps its own handle
/// on the backend to seed data and inspect requests.
pub struct TestHarness {
    pub api: Arc<MemoryReportApi>,
    pub session: Session,
}

impl TestHarness {
    /// Empty backend: no facts, no labels, no views.
    pub fn new() -> Self {
        let api = Arc::new(MemoryReportApi::new());
        let session = ReportSession::new(Arc::clone(&api));
        TestHarness { api, session }
    }

    /// Backend seeded with the productivity fixture.
    pub fn with_productivity_data() -> Self {
        let harness = Self::new();
        harness.api.set_fact_values(ProductivityFixture::records());
        harness.api.set_labels(ProductivityFixture::labels());
        harness
    }

    /// Fixture data plus the two fixture views, mounted.
    pub async fn mounted_with_views() -> Self {
        let mut harness = Self::with_productivity_data();
        harness.seed_view("Por usuario", &["User"], &[]);
        harness.seed_view("Por cliente", &["Client"], &["Month"]);
        harness.session.mount().await.unwrap();
        harness
    }

    pub fn seed_view(&self, name: &str, rows: &[&str], cols: &[&str]) -> ViewId {
        ViewId::Saved(self.api.seed_view(name, rows, cols))
    }

    /// Records every event emitted from now on.
    pub fn record_events(&mut self) -> Arc<Mutex<Vec<SessionEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        self.session.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        events
    }

    pub fn view_id(&self, name: &str) -> ViewId {
        self.session
            .views()
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.id)
            .unwrap_or_else(|| panic!("no view named {}", name))
    }

    /// Current cross-tab rendered as text rows.
    pub fn grid(&self) -> Vec<Vec<String>> {
        self.session.view().unwrap().to_text_rows()
    }
}

/// Three time entries over two users, two clients, two labels and two
/// months.
pub struct ProductivityFixture;

impl ProductivityFixture {
    pub fn records() -> Vec<Value> {
        vec![
            json!({ "user": "Ana", "client": "Acme", "label": "Impuestos", "labelId": 1,
                    "day": "2024-05-02", "month": "2024-05", "minutes": 10 }),
            json!({ "user": "Beto", "client": "Acme", "label": "Sueldos", "labelId": 2,
                    "day": "2024-05-10", "month": "2024-05", "minutes": 20 }),
            json!({ "user": "Beto", "client": "Globex", "label": "Impuestos", "labelId": 1,
                    "day": "2024-06-03", "month": "2024-06", "minutes": 5 }),
        ]
    }

    pub fn labels() -> Vec<Label> {
        vec![
            Label {
                label_id: LabelId(1),
                name: "Impuestos".to_string(),
            },
            Label {
                label_id: LabelId(2),
                name: "Sueldos".to_string(),
            },
        ]
    }
}

pub fn s(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn text(value: &str) -> FactValue {
    FactValue::text(value)
}
