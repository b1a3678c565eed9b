use outpost_core::CoreError;
use outpost_domain::{EntityRecord, RecordId};
use thiserror::Error;

use crate::predicate::EntityPredicate;

/// Sort order in the store's `"-updated_at"` notation: a leading `-` means
/// descending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(field) => (field.trim(), true),
            None => (raw, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_owned(),
            descending,
        })
    }

    pub fn as_param(&self) -> String {
        if self.descending {
            format!("-{}", self.field)
        } else {
            self.field.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityClientKind {
    Memory,
    Rest,
}

impl EntityClientKind {
    pub const fn as_key(self) -> &'static str {
        match self {
            Self::Memory => "entities.memory",
            Self::Rest => "entities.rest",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "entities.memory" => Some(Self::Memory),
            "entities.rest" => Some(Self::Rest),
            _ => None,
        }
    }
}

/// Generic CRUD surface of one entity collection on the remote store.
#[async_trait::async_trait]
pub trait EntityClient<R: EntityRecord>: Send + Sync {
    fn kind(&self) -> EntityClientKind;

    async fn list(&self, sort: Option<SortKey>) -> Result<Vec<R>, CoreError>;

    async fn filter(&self, predicate: EntityPredicate) -> Result<Vec<R>, CoreError>;

    async fn create(&self, draft: R::Draft) -> Result<R, CoreError>;

    async fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R, CoreError>;

    fn client_key(&self) -> &'static str {
        self.kind().as_key()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityClientError {
    #[error("unknown entity client key: {0}")]
    UnknownClientKey(String),
    #[error("failed to initialize entity client: {0}")]
    ClientInitialization(String),
}
