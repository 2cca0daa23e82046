//! FILENAME: core/report-client/src/api.rs

use crate::error::ClientError;
use crate::types::{Label, ProductivityRequest, ProductivityResponse, ProductivityViewDto};
use async_trait::async_trait;
use std::sync::Arc;

/// The backend operations the report needs.
#[async_trait]
pub trait ReportApi: Send + Sync {
    /// `POST /reports/productivity`.
    async fn fetch_productivity(&self, request: &ProductivityRequest) -> Result<ProductivityResponse, ClientError>;

    /// `GET /labels`.
    async fn list_labels(&self) -> Result<Vec<Label>, ClientError>;

    /// `GET /productivity-view`.
    async fn list_views(&self) -> Result<Vec<ProductivityViewDto>, ClientError>;

    /// `POST /productivity-view`. Returns the stored view with its id.
    async fn create_view(&self, view: &ProductivityViewDto) -> Result<ProductivityViewDto, ClientError>;

    /// `PUT /productivity-view/{id}`.
    async fn update_view(&self, id: i64, view: &ProductivityViewDto) -> Result<ProductivityViewDto, ClientError>;

    /// `DELETE /productivity-view/{id}`.
    async fn delete_view(&self, id: i64) -> Result<(), ClientError>;
}

#[async_trait]
impl<T: ReportApi + ?Sized> ReportApi for Arc<T> {
    async fn fetch_productivity(&self, request: &ProductivityRequest) -> Result<ProductivityResponse, ClientError> {
        (**self).fetch_productivity(request).await
    }

    async fn list_labels(&self) -> Result<Vec<Label>, ClientError> {
        (**self).list_labels().await
    }

    async fn list_views(&self) -> Result<Vec<ProductivityViewDto>, ClientError> {
        (**self).list_views().await
    }

    async fn create_view(&self, view: &ProductivityViewDto) -> Result<ProductivityViewDto, ClientError> {
        (**self).create_view(view).await
    }

    async fn update_view(&self, id: i64, view: &ProductivityViewDto) -> Result<ProductivityViewDto, ClientError> {
        (**self).update_view(id, view).await
    }

    async fn delete_view(&self, id: i64) -> Result<(), ClientError> {
        (**self).delete_view(id).await
    }
}
