//! FILENAME: core/report-client/src/types.rs
//! Wire types of the reporting backend (camelCase JSON).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque label identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(pub i64);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub label_id: LabelId,
    pub name: String,
}

/// Body of `POST /reports/productivity`, also echoed back as the effective
/// filter. `labelIds` is always serialised, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityRequest {
    #[serde(default)]
    pub label_ids: Vec<LabelId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_day: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_day: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductivityResponse {
    #[serde(default)]
    pub request: ProductivityRequest,
    /// Raw fact records; normalised by the caller's schema.
    #[serde(default)]
    pub result: Vec<Map<String, Value>>,
}

/// A saved view as stored by the backend. `productivityViewId` is absent on
/// create requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductivityViewDto {
    #[serde(rename = "productivityViewId", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub rows: Vec<String>,
    #[serde(default)]
    pub cols: Vec<String>,
}

impl ProductivityViewDto {
    pub fn new(name: impl Into<String>, rows: Vec<String>, cols: Vec<String>) -> Self {
        ProductivityViewDto {
            id: None,
            name: name.into(),
            rows,
            cols,
        }
    }
}
