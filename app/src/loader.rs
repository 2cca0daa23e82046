//! FILENAME: app/src/loader.rs
//! Fact Table Loader: one backend round trip, normalised through the schema.
//!
//! Nothing here touches session state. The caller assigns the table on
//! success and keeps its previous one on failure.

use crate::error::AppError;
use crate::filters::FilterSpec;
use crate::log_debug;
use fact_model::{FactSchema, FactTable};
use report_client::{ProductivityRequest, ReportApi};

/// A normalised table plus the filter the backend reports it applied.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFacts {
    pub table: FactTable,
    pub request: ProductivityRequest,
}

pub async fn fetch<A>(api: &A, schema: &FactSchema, request: &ProductivityRequest) -> Result<LoadedFacts, AppError>
where
    A: ReportApi + ?Sized,
{
    let response = api.fetch_productivity(request).await?;
    let table = schema.normalize(&response.result)?;
    log_debug!(
        "LOADER",
        "{} records -> {} rows (labels={:?} from={:?} to={:?})",
        response.result.len(),
        table.len(),
        request.label_ids,
        request.from_day,
        request.to_day
    );
    Ok(LoadedFacts {
        table,
        request: response.request,
    })
}

pub async fn load<A>(api: &A, schema: &FactSchema, filter: &FilterSpec) -> Result<LoadedFacts, AppError>
where
    A: ReportApi + ?Sized,
{
    fetch(api, schema, &filter.to_request()).await
}
