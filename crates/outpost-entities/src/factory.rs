use std::sync::Arc;
use std::time::Duration;

use outpost_domain::EntityRecord;

use crate::interface::{EntityClient, EntityClientError, EntityClientKind};
use crate::memory::InMemoryEntityClient;
use crate::rest::{RestClientConfig, RestEntityClient};

const SUPPORTED_CLIENT_KEYS: [&str; 2] = [
    EntityClientKind::Memory.as_key(),
    EntityClientKind::Rest.as_key(),
];

/// Connection settings shared by every entity collection of one console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

pub fn supported_client_keys() -> &'static [&'static str] {
    &SUPPORTED_CLIENT_KEYS
}

pub fn resolve_client_kind(client_key: &str) -> Result<EntityClientKind, EntityClientError> {
    EntityClientKind::from_key(client_key)
        .ok_or_else(|| EntityClientError::UnknownClientKey(client_key.to_owned()))
}

/// Builds the client for `R` named by `client_key`. The in-memory store is
/// seeded with `seed`; the REST client ignores it.
pub fn build_client<R: EntityRecord>(
    client_key: &str,
    settings: &ClientSettings,
    seed: Vec<R>,
) -> Result<Arc<dyn EntityClient<R>>, EntityClientError> {
    let client: Arc<dyn EntityClient<R>> = match resolve_client_kind(client_key)? {
        EntityClientKind::Memory => Arc::new(InMemoryEntityClient::seeded(seed)),
        EntityClientKind::Rest => {
            let config = RestClientConfig {
                base_url: settings.base_url.clone(),
                api_key: settings.api_key.clone(),
                request_timeout: settings.request_timeout,
            };
            let client = RestEntityClient::<R>::new(config)
                .map_err(|error| EntityClientError::ClientInitialization(error.to_string()))?;
            Arc::new(client)
        }
    };
    Ok(client)
}

#[cfg(test)]
mod tests {
    use outpost_domain::SdkIntegration;

    use super::*;

    fn settings(base_url: &str) -> ClientSettings {
        ClientSettings {
            base_url: base_url.to_owned(),
            api_key: Some("secret".to_owned()),
            request_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn supported_client_keys_round_trip_through_kind_resolution() {
        for key in supported_client_keys() {
            let kind = resolve_client_kind(key).expect("resolve key");
            assert_eq!(kind.as_key(), *key);
        }
    }

    #[test]
    fn resolve_client_kind_rejects_unknown_keys() {
        let error = resolve_client_kind("memory").expect_err("reject bare key");
        assert_eq!(error.to_string(), "unknown entity client key: memory");
    }

    #[test]
    fn build_client_returns_expected_kind() {
        let memory = build_client::<SdkIntegration>("entities.memory", &settings(""), Vec::new())
            .expect("memory client");
        let rest = build_client::<SdkIntegration>(
            "entities.rest",
            &settings("https://store.outpost.example"),
            Vec::new(),
        )
        .expect("rest client");

        assert_eq!(memory.kind(), EntityClientKind::Memory);
        assert_eq!(rest.client_key(), "entities.rest");
    }

    #[test]
    fn rest_client_without_base_url_fails_initialization() {
        let error = build_client::<SdkIntegration>("entities.rest", &settings(""), Vec::new())
            .err()
            .expect("blank base url");
        assert!(matches!(error, EntityClientError::ClientInitialization(_)));
    }
}
