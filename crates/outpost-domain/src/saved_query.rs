use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::RecordId;
use crate::record::{EntityRecord, MetricKey, SearchFields, StatusKey, Validate};
use crate::require_non_empty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Active,
    Archived,
}

impl StatusKey for QueryStatus {
    const ALL: &'static [Self] = &[Self::Active, Self::Archived];

    fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Archived)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SavedQueryMetric {
    RunCount,
}

impl MetricKey for SavedQueryMetric {
    const ALL: &'static [Self] = &[Self::RunCount];

    fn as_str(self) -> &'static str {
        "run_count"
    }
}

/// A named OZQL hunt saved from the query workbench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: RecordId,
    pub name: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    pub status: QueryStatus,
    #[serde(default)]
    pub run_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQueryDraft {
    pub name: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
}

impl Validate for SavedQueryDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("query", &self.query)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQueryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<QueryStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityRecord for SavedQuery {
    type Status = QueryStatus;
    type Metric = SavedQueryMetric;
    type Draft = SavedQueryDraft;
    type Patch = SavedQueryPatch;

    const ENTITY: &'static str = "SavedQuery";
    const ID_PREFIX: &'static str = "q";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn status(&self) -> QueryStatus {
        self.status
    }

    fn category(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    fn search_fields(&self) -> SearchFields<'_> {
        SearchFields::two(&self.name, &self.query)
    }

    fn metric(&self, _metric: SavedQueryMetric) -> f64 {
        self.run_count as f64
    }

    fn from_draft(id: RecordId, draft: SavedQueryDraft, created_at: String) -> Self {
        Self {
            id,
            name: draft.name.trim().to_owned(),
            query: draft.query.trim().to_owned(),
            folder: draft
                .folder
                .map(|folder| folder.trim().to_owned())
                .filter(|folder| !folder.is_empty()),
            status: QueryStatus::Active,
            run_count: 0,
            updated_at: Some(created_at),
        }
    }

    fn apply_patch(&mut self, patch: &SavedQueryPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
    }
}
