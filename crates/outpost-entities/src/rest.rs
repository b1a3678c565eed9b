use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use outpost_core::CoreError;
use outpost_domain::{EntityRecord, RecordId};
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::interface::{EntityClient, EntityClientKind, SortKey};
use crate::predicate::EntityPredicate;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl RestClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Talks to the entity store's generated REST surface:
/// `GET/POST {base}/entities/{Entity}` and `PUT {base}/entities/{Entity}/{id}`.
pub struct RestEntityClient<R> {
    config: RestClientConfig,
    client: Client,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for RestEntityClient<R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            client: self.client.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: EntityRecord> RestEntityClient<R> {
    pub fn new(config: RestClientConfig) -> Result<Self, CoreError> {
        if config.base_url.trim().is_empty() {
            return Err(CoreError::Configuration(
                "entity store base URL cannot be empty".to_owned(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(api_key) = config.api_key.as_deref().map(str::trim) {
            if !api_key.is_empty() {
                let value = header::HeaderValue::from_str(&format!("Bearer {api_key}"))
                    .map_err(|error| {
                        CoreError::Configuration(format!("entity store API key is invalid: {error}"))
                    })?;
                headers.insert(header::AUTHORIZATION, value);
            }
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| {
                CoreError::Configuration(format!("failed to build entity store HTTP client: {error}"))
            })?;

        Ok(Self {
            config,
            client,
            _record: PhantomData,
        })
    }

    fn collection_url(&self) -> String {
        let base = self.config.base_url.trim().trim_end_matches('/');
        format!("{base}/entities/{}", R::ENTITY)
    }

    fn record_url(&self, id: &RecordId) -> String {
        format!("{}/{}", self.collection_url(), id.as_str())
    }

    async fn request_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, CoreError> {
        let response = request.send().await.map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "{} request to entity store failed: {error}",
                R::ENTITY
            ))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "{} response from entity store could not be read: {error}",
                R::ENTITY
            ))
        })?;

        if !status.is_success() {
            return Err(CoreError::DependencyUnavailable(format!(
                "{} request to entity store failed with status {status}: {body}",
                R::ENTITY
            )));
        }

        serde_json::from_str(&body).map_err(|error| {
            CoreError::DependencyUnavailable(format!(
                "{} response from entity store was malformed JSON: {error}",
                R::ENTITY
            ))
        })
    }
}

#[async_trait]
impl<R: EntityRecord> EntityClient<R> for RestEntityClient<R> {
    fn kind(&self) -> EntityClientKind {
        EntityClientKind::Rest
    }

    async fn list(&self, sort: Option<SortKey>) -> Result<Vec<R>, CoreError> {
        let mut request = self.client.get(self.collection_url());
        if let Some(sort) = sort {
            request = request.query(&[("sort", sort.as_param())]);
        }
        let records = self.request_json::<Vec<R>>(request).await?;
        debug!(entity = R::ENTITY, count = records.len(), "listed entity records");
        Ok(records)
    }

    async fn filter(&self, predicate: EntityPredicate) -> Result<Vec<R>, CoreError> {
        let request = self
            .client
            .get(self.collection_url())
            .query(&[("q", predicate.to_json()?)]);
        self.request_json(request).await
    }

    async fn create(&self, draft: R::Draft) -> Result<R, CoreError> {
        let request = self.client.post(self.collection_url()).json(&draft);
        self.request_json(request).await
    }

    async fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R, CoreError> {
        let request = self.client.put(self.record_url(id)).json(&patch);
        self.request_json(request).await
    }
}

#[cfg(test)]
mod tests {
    use outpost_domain::Endpoint;

    use super::*;

    #[test]
    fn urls_join_base_entity_and_id() {
        let client = RestEntityClient::<Endpoint>::new(RestClientConfig::new(
            "https://store.outpost.example/api/",
        ))
        .expect("build client");
        assert_eq!(
            client.collection_url(),
            "https://store.outpost.example/api/entities/Endpoint"
        );
        assert_eq!(
            client.record_url(&RecordId::from("ep-0001")),
            "https://store.outpost.example/api/entities/Endpoint/ep-0001"
        );
    }

    #[test]
    fn blank_base_url_is_a_configuration_error() {
        let error = RestEntityClient::<Endpoint>::new(RestClientConfig::new("  "))
            .err()
            .expect("blank url rejected");
        assert!(matches!(error, CoreError::Configuration(_)));
    }
}
