//! REST implementation of [`CollectionService`]

use crate::client::envelope::{decode_mutation, decode_page, failure_message};
use crate::config::{ResourceConfig, UpdateMethod};
use crate::core::error::ViewError;
use crate::core::query::QueryParams;
use crate::core::service::{CollectionService, FetchedPage, MutationOutcome};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;

/// Collection client for one REST resource
///
/// Speaks the endpoint family:
/// - `GET    {base}{path}?page=&limit=&search=...`
/// - `POST   {base}{path}`
/// - `PATCH  {base}{path}/{id}` (or `PUT`, per resource)
/// - `DELETE {base}{path}/{id}`
/// - `POST   {base}{path}/{id}/{action}`
///
/// Ids and action names are sent as single percent-encoded path segments.
/// Mutation responses may carry the item at the top level, under `data`, or
/// under the resource's item key; see [`decode_mutation`] for the accepted
/// shapes. Requests are never retried.
#[derive(Clone)]
pub struct RestCollectionClient {
    http: Client,
    base_url: String,
    resource: ResourceConfig,
}

impl RestCollectionClient {
    /// Create a client sharing an existing HTTP client
    pub fn new(http: Client, base_url: impl Into<String>, resource: ResourceConfig) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            resource,
        }
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.resource
    }

    fn collection_url(&self) -> Result<Url, ViewError> {
        Url::parse(&format!("{}{}", self.base_url, self.resource.path)).map_err(|e| ViewError::Config {
            message: format!("invalid URL for resource '{}': {}", self.resource.name, e),
        })
    }

    /// `{path}/{id}` or `{path}/{id}/{action}`, each appended as one encoded segment
    fn item_url(&self, id: &str, action: Option<&str>) -> Result<Url, ViewError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ViewError::validation("id", "item id must not be empty"));
        }

        let mut url = self.collection_url()?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| ViewError::Config {
                message: format!("base URL for resource '{}' cannot take a path", self.resource.name),
            })?;
            segments.pop_if_empty().push(id);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }

    /// Send a request and return the JSON body of a successful response
    ///
    /// Non-2xx responses become server errors carrying the status and the
    /// body's `message` when there is one.
    async fn send(&self, request: RequestBuilder) -> Result<Value, ViewError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(resource = %self.resource.name, error = %e, "Request did not complete");
            ViewError::network(e.to_string())
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ViewError::from)?;
        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&bytes) {
                Ok(body) => body,
                Err(e) if status.is_success() => return Err(ViewError::from(e)),
                Err(_) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
            }
        };

        if !status.is_success() {
            let message = match &body {
                Value::String(text) if !text.is_empty() => text.clone(),
                Value::Null | Value::String(_) => status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string(),
                other => failure_message(other),
            };
            tracing::warn!(
                resource = %self.resource.name,
                status = status.as_u16(),
                %message,
                "Backend rejected request"
            );
            return Err(ViewError::server(Some(status.as_u16()), message));
        }

        Ok(body)
    }

    async fn mutate(&self, request: RequestBuilder) -> Result<MutationOutcome, ViewError> {
        let body = self.send(request).await?;
        decode_mutation(body, &self.resource.id_field, &self.resource.item_key())
    }
}

#[async_trait]
impl CollectionService for RestCollectionClient {
    fn resource(&self) -> &str {
        &self.resource.name
    }

    async fn fetch(&self, params: &QueryParams) -> Result<FetchedPage, ViewError> {
        let url = self.collection_url()?;
        tracing::debug!(resource = %self.resource.name, %url, page = params.page(), "Fetching collection");

        let request = self.http.get(url).query(&params.to_pairs());
        let body = self.send(request).await?;
        decode_page(
            body,
            &self.resource.envelope,
            &self.resource.name,
            &self.resource.id_field,
        )
    }

    async fn create(&self, body: Value) -> Result<MutationOutcome, ViewError> {
        self.mutate(self.http.post(self.collection_url()?).json(&body))
            .await
    }

    async fn update(&self, id: &str, patch: Value) -> Result<MutationOutcome, ViewError> {
        let method = match self.resource.update_method {
            UpdateMethod::Patch => Method::PATCH,
            UpdateMethod::Put => Method::PUT,
        };
        let url = self.item_url(id, None)?;
        self.mutate(self.http.request(method, url).json(&patch)).await
    }

    async fn delete(&self, id: &str) -> Result<MutationOutcome, ViewError> {
        let url = self.item_url(id, None)?;
        self.mutate(self.http.delete(url)).await
    }

    async fn action(
        &self,
        id: &str,
        action: &str,
        body: Option<Value>,
    ) -> Result<MutationOutcome, ViewError> {
        let action = action.trim_matches('/');
        if action.is_empty() {
            return Err(ViewError::validation("action", "action name must not be empty"));
        }
        let url = self.item_url(id, Some(action))?;
        let request = self.http.post(url).json(&body.unwrap_or(Value::Object(Default::default())));
        self.mutate(request).await
    }
}
