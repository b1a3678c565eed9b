use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::RecordId;
use crate::record::{EntityRecord, MetricKey, SearchFields, StatusKey, Validate};
use crate::require_non_empty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SdkStatus {
    Available,
    Installed,
    Deprecated,
}

impl StatusKey for SdkStatus {
    const ALL: &'static [Self] = &[Self::Available, Self::Installed, Self::Deprecated];

    fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Installed => "installed",
            Self::Deprecated => "deprecated",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Deprecated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SdkMetric {
    InstallCount,
}

impl MetricKey for SdkMetric {
    const ALL: &'static [Self] = &[Self::InstallCount];

    fn as_str(self) -> &'static str {
        "install_count"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdkIntegration {
    pub id: RecordId,
    pub name: String,
    pub language: String,
    pub version: String,
    pub status: SdkStatus,
    #[serde(default)]
    pub install_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkDraft {
    pub name: String,
    pub language: String,
    pub version: String,
}

impl Validate for SdkDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("language", &self.language)?;
        require_non_empty("version", &self.version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SdkStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl EntityRecord for SdkIntegration {
    type Status = SdkStatus;
    type Metric = SdkMetric;
    type Draft = SdkDraft;
    type Patch = SdkPatch;

    const ENTITY: &'static str = "SdkIntegration";
    const ID_PREFIX: &'static str = "sdk";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn status(&self) -> SdkStatus {
        self.status
    }

    fn category(&self) -> Option<&str> {
        Some(self.language.as_str())
    }

    fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    fn search_fields(&self) -> SearchFields<'_> {
        SearchFields::two(&self.name, &self.language)
    }

    fn metric(&self, _metric: SdkMetric) -> f64 {
        self.install_count as f64
    }

    fn from_draft(id: RecordId, draft: SdkDraft, created_at: String) -> Self {
        Self {
            id,
            name: draft.name.trim().to_owned(),
            language: draft.language.trim().to_ascii_lowercase(),
            version: draft.version.trim().to_owned(),
            status: SdkStatus::Available,
            install_count: 0,
            updated_at: Some(created_at),
        }
    }

    fn apply_patch(&mut self, patch: &SdkPatch) {
        if let Some(status) = patch.status {
            self.status = status;
            if status == SdkStatus::Installed {
                self.install_count = self.install_count.saturating_add(1);
            }
        }
        if let Some(version) = &patch.version {
            self.version = version.clone();
        }
    }
}
