use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::RecordId;
use crate::record::{EntityRecord, MetricKey, SearchFields, StatusKey, Validate};
use crate::{require_non_empty, require_platform, require_version};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallerStatus {
    Pending,
    Ready,
    Expired,
}

impl StatusKey for InstallerStatus {
    const ALL: &'static [Self] = &[Self::Pending, Self::Ready, Self::Expired];

    fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Expired => "expired",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Expired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InstallerMetric {
    DownloadCount,
}

impl MetricKey for InstallerMetric {
    const ALL: &'static [Self] = &[Self::DownloadCount];

    fn as_str(self) -> &'static str {
        "download_count"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installer {
    pub id: RecordId,
    pub name: String,
    pub platform: String,
    pub version: String,
    pub enrollment_token: String,
    pub status: InstallerStatus,
    #[serde(default)]
    pub download_count: u64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerDraft {
    pub name: String,
    pub platform: String,
    pub version: String,
}

impl Validate for InstallerDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_platform("platform", &self.platform)?;
        require_version("version", &self.version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InstallerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_count: Option<u64>,
}

impl EntityRecord for Installer {
    type Status = InstallerStatus;
    type Metric = InstallerMetric;
    type Draft = InstallerDraft;
    type Patch = InstallerPatch;

    const ENTITY: &'static str = "Installer";
    const ID_PREFIX: &'static str = "inst";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn status(&self) -> InstallerStatus {
        self.status
    }

    fn category(&self) -> Option<&str> {
        Some(self.platform.as_str())
    }

    fn updated_at(&self) -> Option<&str> {
        Some(self.created_at.as_str())
    }

    fn search_fields(&self) -> SearchFields<'_> {
        SearchFields::two(&self.name, &self.platform)
    }

    fn metric(&self, _metric: InstallerMetric) -> f64 {
        self.download_count as f64
    }

    fn from_draft(id: RecordId, draft: InstallerDraft, created_at: String) -> Self {
        let enrollment_token = format!("ozt_{}", id.as_str().replace('-', "_"));
        Self {
            id,
            name: draft.name.trim().to_owned(),
            platform: draft.platform.trim().to_ascii_lowercase(),
            version: draft.version.trim().to_owned(),
            enrollment_token,
            status: InstallerStatus::Ready,
            download_count: 0,
            created_at,
        }
    }

    fn apply_patch(&mut self, patch: &InstallerPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(download_count) = patch.download_count {
            self.download_count = download_count;
        }
    }
}
