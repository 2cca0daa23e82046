//! FILENAME: core/report-client/src/memory.rs
//! In-process `ReportApi` for tests and offline demos.
//!
//! Facts are filtered by `labelId` (number) and `day` (`YYYY-MM-DD`) record
//! keys when present. Failures can be queued to exercise error paths.

use crate::api::ReportApi;
use crate::error::ClientError;
use crate::types::{Label, LabelId, ProductivityRequest, ProductivityResponse, ProductivityViewDto};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct MemoryState {
    facts: Vec<Map<String, Value>>,
    labels: Vec<Label>,
    views: BTreeMap<i64, ProductivityViewDto>,
    next_view_id: i64,
    /// When set, the echoed request carries these labels instead of the
    /// requested ones.
    echo_labels: Option<Vec<LabelId>>,
    failures: VecDeque<(u16, String)>,
    requests: Vec<ProductivityRequest>,
}

#[derive(Debug, Default)]
pub struct MemoryReportApi {
    inner: RwLock<MemoryState>,
}

impl MemoryReportApi {
    pub fn new() -> Self {
        MemoryReportApi::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, ClientError> {
        self.inner
            .read()
            .map_err(|e| ClientError::backend(500, format!("Lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, ClientError> {
        self.inner
            .write()
            .map_err(|e| ClientError::backend(500, format!("Lock: {}", e)))
    }

    /// Pops a queued failure, if any.
    fn take_failure(state: &mut MemoryState) -> Result<(), ClientError> {
        match state.failures.pop_front() {
            Some((status, message)) if status == 404 => Err(ClientError::NotFound(message)),
            Some((status, message)) => Err(ClientError::backend(status, message)),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Seeding and inspection
    // ------------------------------------------------------------------

    pub fn set_facts(&self, facts: Vec<Map<String, Value>>) {
        if let Ok(mut state) = self.inner.write() {
            state.facts = facts;
        }
    }

    /// Seeds facts from JSON objects; anything else is ignored.
    pub fn set_fact_values(&self, facts: Vec<Value>) {
        let records = facts
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.set_facts(records);
    }

    pub fn set_labels(&self, labels: Vec<Label>) {
        if let Ok(mut state) = self.inner.write() {
            state.labels = labels;
        }
    }

    pub fn set_echo_labels(&self, labels: Option<Vec<LabelId>>) {
        if let Ok(mut state) = self.inner.write() {
            state.echo_labels = labels;
        }
    }

    /// Stores a view directly, bypassing validation. Returns its id.
    pub fn seed_view(&self, name: &str, rows: &[&str], cols: &[&str]) -> i64 {
        let Ok(mut state) = self.inner.write() else {
            return 0;
        };
        let id = Self::next_id(&mut state);
        state.views.insert(
            id,
            ProductivityViewDto {
                id: Some(id),
                name: name.to_string(),
                rows: rows.iter().map(|s| s.to_string()).collect(),
                cols: cols.iter().map(|s| s.to_string()).collect(),
            },
        );
        id
    }

    /// The next call of any operation fails with `status`. A 404 surfaces
    /// as `NotFound`.
    pub fn fail_next(&self, status: u16, message: &str) {
        if let Ok(mut state) = self.inner.write() {
            state.failures.push_back((status, message.to_string()));
        }
    }

    /// Every productivity request received, oldest first.
    pub fn requests(&self) -> Vec<ProductivityRequest> {
        self.read().map(|s| s.requests.clone()).unwrap_or_default()
    }

    pub fn stored_views(&self) -> Vec<ProductivityViewDto> {
        self.read()
            .map(|s| s.views.values().cloned().collect())
            .unwrap_or_default()
    }

    fn next_id(state: &mut MemoryState) -> i64 {
        state.next_view_id += 1;
        state.next_view_id
    }
}

fn record_matches(record: &Map<String, Value>, request: &ProductivityRequest) -> bool {
    if !request.label_ids.is_empty() {
        if let Some(label) = record.get("labelId").and_then(Value::as_i64) {
            if !request.label_ids.contains(&LabelId(label)) {
                return false;
            }
        }
    }

    let day = record
        .get("day")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
    if let Some(day) = day {
        if request.from_day.is_some_and(|from| day < from) || request.to_day.is_some_and(|to| day > to) {
            return false;
        }
    }
    true
}

#[async_trait]
impl ReportApi for MemoryReportApi {
    async fn fetch_productivity(&self, request: &ProductivityRequest) -> Result<ProductivityResponse, ClientError> {
        let mut state = self.write()?;
        state.requests.push(request.clone());
        Self::take_failure(&mut state)?;

        let result = state
            .facts
            .iter()
            .filter(|r| record_matches(r, request))
            .cloned()
            .collect();
        let mut echoed = request.clone();
        if let Some(labels) = &state.echo_labels {
            echoed.label_ids = labels.clone();
        }
        Ok(ProductivityResponse {
            request: echoed,
            result,
        })
    }

    async fn list_labels(&self) -> Result<Vec<Label>, ClientError> {
        let mut state = self.write()?;
        Self::take_failure(&mut state)?;
        Ok(state.labels.clone())
    }

    async fn list_views(&self) -> Result<Vec<ProductivityViewDto>, ClientError> {
        let mut state = self.write()?;
        Self::take_failure(&mut state)?;
        Ok(state.views.values().cloned().collect())
    }

    async fn create_view(&self, view: &ProductivityViewDto) -> Result<ProductivityViewDto, ClientError> {
        let mut state = self.write()?;
        Self::take_failure(&mut state)?;
        if view.name.trim().is_empty() {
            return Err(ClientError::backend(400, "name is required"));
        }

        let id = Self::next_id(&mut state);
        let stored = ProductivityViewDto {
            id: Some(id),
            ..view.clone()
        };
        state.views.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_view(&self, id: i64, view: &ProductivityViewDto) -> Result<ProductivityViewDto, ClientError> {
        let mut state = self.write()?;
        Self::take_failure(&mut state)?;
        let Some(existing) = state.views.get_mut(&id) else {
            return Err(ClientError::NotFound(format!("productivity-view/{}", id)));
        };
        *existing = ProductivityViewDto {
            id: Some(id),
            ..view.clone()
        };
        Ok(existing.clone())
    }

    async fn delete_view(&self, id: i64) -> Result<(), ClientError> {
        let mut state = self.write()?;
        Self::take_failure(&mut state)?;
        state
            .views
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound(format!("productivity-view/{}", id)))
    }
}
