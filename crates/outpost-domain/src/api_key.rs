use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::RecordId;
use crate::record::{EntityRecord, MetricKey, SearchFields, StatusKey, Validate};
use crate::require_non_empty;

const KNOWN_SCOPES: &[&str] = &["read", "write", "admin"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    Active,
    Revoked,
    Expired,
}

impl StatusKey for ApiKeyStatus {
    const ALL: &'static [Self] = &[Self::Active, Self::Revoked, Self::Expired];

    fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
            Self::Expired => "expired",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Revoked | Self::Expired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApiKeyMetric {
    RequestCount,
}

impl MetricKey for ApiKeyMetric {
    const ALL: &'static [Self] = &[Self::RequestCount];

    fn as_str(self) -> &'static str {
        "request_count"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: RecordId,
    pub name: String,
    pub key_prefix: String,
    pub scope: String,
    pub status: ApiKeyStatus,
    #[serde(default)]
    pub request_count: u64,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyDraft {
    pub name: String,
    pub scope: String,
}

impl Validate for ApiKeyDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("scope", &self.scope)?;
        let scope = self.scope.trim().to_ascii_lowercase();
        if !KNOWN_SCOPES.contains(&scope.as_str()) {
            return Err(ValidationError::Invalid {
                field: "scope",
                reason: format!("expected one of {}", KNOWN_SCOPES.join(", ")),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApiKeyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityRecord for ApiKey {
    type Status = ApiKeyStatus;
    type Metric = ApiKeyMetric;
    type Draft = ApiKeyDraft;
    type Patch = ApiKeyPatch;

    const ENTITY: &'static str = "ApiKey";
    const ID_PREFIX: &'static str = "key";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn status(&self) -> ApiKeyStatus {
        self.status
    }

    fn category(&self) -> Option<&str> {
        Some(self.scope.as_str())
    }

    fn updated_at(&self) -> Option<&str> {
        self.last_used_at.as_deref().or(Some(self.created_at.as_str()))
    }

    fn search_fields(&self) -> SearchFields<'_> {
        SearchFields::two(&self.name, &self.key_prefix)
    }

    fn metric(&self, _metric: ApiKeyMetric) -> f64 {
        self.request_count as f64
    }

    fn from_draft(id: RecordId, draft: ApiKeyDraft, created_at: String) -> Self {
        let key_prefix = format!("oz_live_{}", id.as_str().replace('-', ""));
        Self {
            id,
            name: draft.name.trim().to_owned(),
            key_prefix,
            scope: draft.scope.trim().to_ascii_lowercase(),
            status: ApiKeyStatus::Active,
            request_count: 0,
            created_at,
            last_used_at: None,
        }
    }

    fn apply_patch(&mut self, patch: &ApiKeyPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
    }
}
