use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::RecordId;
use crate::record::{EntityRecord, MetricKey, SearchFields, StatusKey, Validate};
use crate::{require_non_empty, require_platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStatus {
    Online,
    Offline,
    Isolated,
    Wiped,
}

impl StatusKey for EndpointStatus {
    const ALL: &'static [Self] = &[Self::Online, Self::Offline, Self::Isolated, Self::Wiped];

    fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Isolated => "isolated",
            Self::Wiped => "wiped",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Wiped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EndpointMetric {
    RiskScore,
    OpenAlerts,
}

impl MetricKey for EndpointMetric {
    const ALL: &'static [Self] = &[Self::RiskScore, Self::OpenAlerts];

    fn as_str(self) -> &'static str {
        match self {
            Self::RiskScore => "risk_score",
            Self::OpenAlerts => "open_alerts",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: RecordId,
    pub hostname: String,
    pub ip_address: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    pub status: EndpointStatus,
    #[serde(default)]
    pub risk_score: u32,
    #[serde(default)]
    pub open_alerts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDraft {
    pub hostname: String,
    pub ip_address: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
}

impl Validate for EndpointDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("hostname", &self.hostname)?;
        require_non_empty("ip_address", &self.ip_address)?;
        require_platform("platform", &self.platform)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EndpointStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_alerts: Option<u32>,
}

impl EndpointPatch {
    pub fn status(status: EndpointStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl EntityRecord for Endpoint {
    type Status = EndpointStatus;
    type Metric = EndpointMetric;
    type Draft = EndpointDraft;
    type Patch = EndpointPatch;

    const ENTITY: &'static str = "Endpoint";
    const ID_PREFIX: &'static str = "ep";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn status(&self) -> EndpointStatus {
        self.status
    }

    fn category(&self) -> Option<&str> {
        Some(self.platform.as_str())
    }

    fn updated_at(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    fn search_fields(&self) -> SearchFields<'_> {
        SearchFields::two(&self.hostname, &self.ip_address)
    }

    fn metric(&self, metric: EndpointMetric) -> f64 {
        match metric {
            EndpointMetric::RiskScore => f64::from(self.risk_score),
            EndpointMetric::OpenAlerts => f64::from(self.open_alerts),
        }
    }

    fn from_draft(id: RecordId, draft: EndpointDraft, created_at: String) -> Self {
        Self {
            id,
            hostname: draft.hostname.trim().to_owned(),
            ip_address: draft.ip_address.trim().to_owned(),
            platform: draft.platform.trim().to_ascii_lowercase(),
            os_version: draft.os_version,
            status: EndpointStatus::Offline,
            risk_score: 0,
            open_alerts: 0,
            last_seen: Some(created_at),
        }
    }

    fn apply_patch(&mut self, patch: &EndpointPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(risk_score) = patch.risk_score {
            self.risk_score = risk_score;
        }
        if let Some(open_alerts) = patch.open_alerts {
            self.open_alerts = open_alerts;
        }
    }
}
