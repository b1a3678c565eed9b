//! Record types shared by every Outpost Zero console page.

pub mod api_key;
pub mod endpoint;
pub mod error;
pub mod fixtures;
pub mod ids;
pub mod installer;
pub mod record;
pub mod saved_query;
pub mod sdk;

pub use api_key::{ApiKey, ApiKeyDraft, ApiKeyMetric, ApiKeyPatch, ApiKeyStatus};
pub use endpoint::{Endpoint, EndpointDraft, EndpointMetric, EndpointPatch, EndpointStatus};
pub use error::ValidationError;
pub use ids::RecordId;
pub use installer::{Installer, InstallerDraft, InstallerMetric, InstallerPatch, InstallerStatus};
pub use record::{EntityRecord, MetricKey, SearchFields, StatusKey, Validate};
pub use saved_query::{QueryStatus, SavedQuery, SavedQueryDraft, SavedQueryMetric, SavedQueryPatch};
pub use sdk::{SdkDraft, SdkIntegration, SdkMetric, SdkPatch, SdkStatus};

pub const KNOWN_PLATFORMS: &[&str] = &["windows", "linux", "macos"];

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}

/// Release versions are embedded in download URLs and script file names, so
/// only `[0-9A-Za-z.+-]` is accepted.
pub fn is_valid_version(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-'))
}

pub(crate) fn require_version(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require_non_empty(field, value)?;
    if is_valid_version(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::Invalid {
            field,
            reason: format!("'{}' may only contain letters, digits, '.', '+' and '-'", value.trim()),
        })
    }
}

pub(crate) fn require_platform(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require_non_empty(field, value)?;
    let normalized = value.trim().to_ascii_lowercase();
    if KNOWN_PLATFORMS.contains(&normalized.as_str()) {
        Ok(())
    } else {
        Err(ValidationError::Invalid {
            field,
            reason: format!(
                "unsupported platform '{}'; expected one of {}",
                value.trim(),
                KNOWN_PLATFORMS.join(", ")
            ),
        })
    }
}
