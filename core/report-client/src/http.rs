//! FILENAME: core/report-client/src/http.rs
//! reqwest-backed `ReportApi`.

use crate::api::ReportApi;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::types::{Label, ProductivityRequest, ProductivityResponse, ProductivityViewDto};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const COUNTRY_HEADER: &str = "x-country-code";

const PRODUCTIVITY_PATH: &str = "reports/productivity";
const LABELS_PATH: &str = "labels";
const VIEWS_PATH: &str = "productivity-view";

pub struct HttpReportApi {
    client: Client,
    config: ClientConfig,
}

impl HttpReportApi {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        if !config.token.is_empty() {
            let bearer = HeaderValue::from_str(&format!("Bearer {}", config.token))
                .map_err(|e| ClientError::Config(format!("token: {}", e)))?;
            headers.insert(AUTHORIZATION, bearer);
        }
        let country = HeaderValue::from_str(&config.country_code)
            .map_err(|e| ClientError::Config(format!("country_code: {}", e)))?;
        headers.insert(HeaderName::from_static(COUNTRY_HEADER), country);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(HttpReportApi { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn view_path(id: i64) -> String {
        format!("{}/{}", VIEWS_PATH, id)
    }

    /// Sends and maps the status: 404 → `NotFound(what)`, other failures →
    /// `Backend` with the response text.
    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            debug!("{} not found", what);
            return Err(ClientError::NotFound(what.to_string()));
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!("{} failed with {}: {}", what, status.as_u16(), message);
        Err(ClientError::backend(status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T, ClientError> {
        let response = self.send(request, what).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ReportApi for HttpReportApi {
    async fn fetch_productivity(&self, request: &ProductivityRequest) -> Result<ProductivityResponse, ClientError> {
        debug!(
            "POST {} labels={} from={:?} to={:?}",
            PRODUCTIVITY_PATH,
            request.label_ids.len(),
            request.from_day,
            request.to_day
        );
        let builder = self
            .client
            .post(self.config.endpoint(PRODUCTIVITY_PATH))
            .json(request);
        self.send_json(builder, PRODUCTIVITY_PATH).await
    }

    async fn list_labels(&self) -> Result<Vec<Label>, ClientError> {
        let builder = self.client.get(self.config.endpoint(LABELS_PATH));
        self.send_json(builder, LABELS_PATH).await
    }

    async fn list_views(&self) -> Result<Vec<ProductivityViewDto>, ClientError> {
        let builder = self.client.get(self.config.endpoint(VIEWS_PATH));
        self.send_json(builder, VIEWS_PATH).await
    }

    async fn create_view(&self, view: &ProductivityViewDto) -> Result<ProductivityViewDto, ClientError> {
        debug!("POST {} name={:?}", VIEWS_PATH, view.name);
        let builder = self.client.post(self.config.endpoint(VIEWS_PATH)).json(view);
        self.send_json(builder, VIEWS_PATH).await
    }

    async fn update_view(&self, id: i64, view: &ProductivityViewDto) -> Result<ProductivityViewDto, ClientError> {
        let path = Self::view_path(id);
        debug!("PUT {}", path);
        let builder = self.client.put(self.config.endpoint(&path)).json(view);
        let response = self.send(builder, &path).await?;
        let body = response.bytes().await?;
        // Some deployments answer PUT with an empty body
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ProductivityViewDto {
                id: Some(id),
                ..view.clone()
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn delete_view(&self, id: i64) -> Result<(), ClientError> {
        let path = Self::view_path(id);
        debug!("DELETE {}", path);
        let builder = self.client.delete(self.config.endpoint(&path));
        self.send(builder, &path).await?;
        Ok(())
    }
}
