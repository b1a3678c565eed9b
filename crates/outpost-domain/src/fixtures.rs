//! Seed datasets the console falls back to when the entity store is empty or
//! unreachable. Deployments can override them with files in a fixtures
//! directory; these bundled copies are only the defaults.

use crate::record::EntityRecord;

const ENDPOINT_FIXTURE: &str = include_str!("../fixtures/Endpoint.json");
const API_KEY_FIXTURE: &str = include_str!("../fixtures/ApiKey.json");
const SDK_FIXTURE: &str = include_str!("../fixtures/SdkIntegration.json");
const INSTALLER_FIXTURE: &str = include_str!("../fixtures/Installer.json");
const SAVED_QUERY_FIXTURE: &str = include_str!("../fixtures/SavedQuery.json");

pub fn bundled_json(entity: &str) -> Option<&'static str> {
    match entity {
        "Endpoint" => Some(ENDPOINT_FIXTURE),
        "ApiKey" => Some(API_KEY_FIXTURE),
        "SdkIntegration" => Some(SDK_FIXTURE),
        "Installer" => Some(INSTALLER_FIXTURE),
        "SavedQuery" => Some(SAVED_QUERY_FIXTURE),
        _ => None,
    }
}

pub fn parse<R: EntityRecord>(raw: &str) -> Result<Vec<R>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Returns `None` when no dataset is bundled for `R::ENTITY`.
pub fn bundled<R: EntityRecord>() -> Option<Result<Vec<R>, serde_json::Error>> {
    bundled_json(R::ENTITY).map(parse::<R>)
}
