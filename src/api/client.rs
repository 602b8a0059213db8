//! API Client
//!
//! Main client for the mentorship API, combining authentication and HTTP
//! functionality. Implements [`ResourceApi`] for the loader and the forms.

use super::auth::Credentials;
use super::error::{ApiError, ApiResult};
use super::http::ApiHttpClient;
use crate::resource::display::extract_records;
use crate::resource::{
    get_resource, CreateInput, PageWindow, RecordId, ResourceApi, ResourceKind, ResourceRecord,
    UpdateInput,
};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde_json::Value;
use url::Url;

/// Prefix of every API route
const API_PREFIX: &str = "api/v1";

/// Main API client
#[derive(Clone)]
pub struct ApiClient {
    pub credentials: Credentials,
    pub http: ApiHttpClient,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client for the API at `base_url`
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|| format!("Invalid API URL: {}", base_url))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("API URL must be http or https: {}", base_url);
        }

        let http = ApiHttpClient::new().context("Failed to create HTTP client")?;

        Ok(Self {
            credentials,
            http,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build an API URL from a route path
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            API_PREFIX,
            path.trim_start_matches('/')
        )
    }

    pub fn login_url(&self) -> String {
        self.api_url("login/access-token")
    }

    /// Collection URL, e.g. `/api/v1/items/`
    pub fn collection_url(&self, kind: ResourceKind) -> String {
        self.api_url(&format!("{}/", get_resource(kind).path))
    }

    /// Single record URL, e.g. `/api/v1/items/{id}`
    pub fn record_url(&self, kind: ResourceKind, id: &RecordId) -> String {
        self.api_url(&format!(
            "{}/{}",
            get_resource(kind).path,
            urlencoding::encode(&id.normalized())
        ))
    }

    // =========================================================================
    // Authenticated requests
    // =========================================================================

    /// Get the current access token, logging in when needed
    pub async fn get_token(&self) -> ApiResult<String> {
        self.credentials.get_token(&self.http, &self.login_url()).await
    }

    /// Verify the credentials by fetching a token up front
    pub async fn authenticate(&self) -> ApiResult<()> {
        self.get_token().await.map(|_| ())
    }

    async fn forget_token_on_401<T>(&self, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(ApiError::Status { status: 401, .. }) = &result {
            tracing::warn!("Token rejected, clearing cached token");
            self.credentials.clear().await;
        }
        result
    }

    pub async fn get_json(&self, url: &str) -> ApiResult<Value> {
        let token = self.get_token().await?;
        let result = self.http.get(url, &token).await;
        self.forget_token_on_401(result).await
    }

    pub async fn post_json(&self, url: &str, body: Option<&Value>) -> ApiResult<Value> {
        let token = self.get_token().await?;
        let result = self.http.post(url, &token, body).await;
        self.forget_token_on_401(result).await
    }

    pub async fn put_json(&self, url: &str, body: &Value) -> ApiResult<Value> {
        let token = self.get_token().await?;
        let result = self.http.put(url, &token, body).await;
        self.forget_token_on_401(result).await
    }

    pub async fn patch_json(&self, url: &str, body: &Value) -> ApiResult<Value> {
        let token = self.get_token().await?;
        let result = self.http.patch(url, &token, body).await;
        self.forget_token_on_401(result).await
    }

    pub async fn delete_url(&self, url: &str) -> ApiResult<Value> {
        let token = self.get_token().await?;
        let result = self.http.delete(url, &token).await;
        self.forget_token_on_401(result).await
    }

    // =========================================================================
    // Resource operations
    // =========================================================================

    /// Fetch one page of records
    pub async fn list_records(
        &self,
        kind: ResourceKind,
        window: PageWindow,
    ) -> ApiResult<Vec<ResourceRecord>> {
        let resource_def = get_resource(kind);
        let base = self.collection_url(kind);

        if resource_def.server_paginated {
            let url = format!("{}?skip={}&limit={}", base, window.skip, window.limit);
            let response = self.get_json(&url).await?;
            extract_records(&response, kind, resource_def)
        } else {
            // Endpoint returns the full collection
            let response = self.get_json(&base).await?;
            let records = extract_records(&response, kind, resource_def)?;
            Ok(window.slice(records))
        }
    }

    pub async fn create_record(&self, input: CreateInput) -> ApiResult<ResourceRecord> {
        let kind = input.kind();
        tracing::info!("create: kind={}", kind);

        let response = match &input {
            CreateInput::Item(body) => {
                self.post_json(&self.collection_url(kind), Some(&serde_json::to_value(body)?))
                    .await?
            }
            CreateInput::User(body) => {
                self.post_json(&self.collection_url(kind), Some(&serde_json::to_value(body)?))
                    .await?
            }
            CreateInput::Questionnaire(body) => {
                self.post_json(&self.collection_url(kind), Some(&serde_json::to_value(body)?))
                    .await?
            }
            CreateInput::Mentor(body) => {
                let url = self.api_url(&format!(
                    "{}/{}",
                    get_resource(kind).path,
                    urlencoding::encode(body.mentor_email.trim())
                ));
                self.post_json(&url, None).await?
            }
        };

        Ok(ResourceRecord::from_value(kind, response)?)
    }

    pub async fn update_record(&self, id: RecordId, input: UpdateInput) -> ApiResult<ResourceRecord> {
        let kind = input.kind();
        let url = self.record_url(kind, &id);
        tracing::info!("update: kind={}, id={}", kind, id);

        let response = match &input {
            UpdateInput::Item(body) => self.put_json(&url, &serde_json::to_value(body)?).await?,
            UpdateInput::User(body) => self.patch_json(&url, &serde_json::to_value(body)?).await?,
            UpdateInput::Questionnaire(body) => {
                self.put_json(&url, &serde_json::to_value(body)?).await?
            }
        };

        Ok(ResourceRecord::from_value(kind, response)?)
    }

    pub async fn delete_record(&self, kind: ResourceKind, id: RecordId) -> ApiResult<()> {
        tracing::info!("delete: kind={}, id={}", kind, id);
        self.delete_url(&self.record_url(kind, &id)).await.map(|_| ())
    }
}

impl ResourceApi for ApiClient {
    fn list(
        &self,
        kind: ResourceKind,
        window: PageWindow,
    ) -> BoxFuture<'_, ApiResult<Vec<ResourceRecord>>> {
        Box::pin(self.list_records(kind, window))
    }

    fn create(&self, input: CreateInput) -> BoxFuture<'_, ApiResult<ResourceRecord>> {
        Box::pin(self.create_record(input))
    }

    fn update(&self, id: RecordId, input: UpdateInput) -> BoxFuture<'_, ApiResult<ResourceRecord>> {
        Box::pin(self.update_record(id, input))
    }

    fn delete(&self, kind: ResourceKind, id: RecordId) -> BoxFuture<'_, ApiResult<()>> {
        Box::pin(self.delete_record(kind, id))
    }
}
