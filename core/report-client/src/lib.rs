//! FILENAME: core/report-client/src/lib.rs
//! PURPOSE: Access to the reporting backend.
//! CONTEXT: The session talks to the backend only through the `ReportApi`
//! trait. `HttpReportApi` is the production implementation;
//! `MemoryReportApi` serves tests and offline demos.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use api::ReportApi;
pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpReportApi;
pub use memory::MemoryReportApi;
pub use types::{Label, LabelId, ProductivityRequest, ProductivityResponse, ProductivityViewDto};
