use std::fmt::Debug;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ValidationError;
use crate::ids::RecordId;

/// Closed set of lifecycle values a record type can be in.
///
/// `ALL` lists every value so statistics can report zero-count buckets.
pub trait StatusKey:
    Copy + Eq + Ord + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn is_terminal(self) -> bool;

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(raw))
    }
}

/// Numeric field of a record that summary cards may sum or average.
pub trait MetricKey: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;
}

/// The one or two text fields the page search box matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchFields<'a> {
    pub primary: &'a str,
    pub secondary: Option<&'a str>,
}

impl<'a> SearchFields<'a> {
    pub fn one(primary: &'a str) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn two(primary: &'a str, secondary: &'a str) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> {
        std::iter::once(self.primary).chain(self.secondary)
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub trait EntityRecord:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Status: StatusKey;
    type Metric: MetricKey;
    type Draft: Clone + Debug + PartialEq + Serialize + Validate + Send + Sync + 'static;
    type Patch: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Entity collection name on the remote store and fixture file stem.
    const ENTITY: &'static str;
    const ID_PREFIX: &'static str;

    fn id(&self) -> &RecordId;

    fn status(&self) -> Self::Status;

    fn category(&self) -> Option<&str>;

    fn updated_at(&self) -> Option<&str>;

    fn search_fields(&self) -> SearchFields<'_>;

    fn metric(&self, metric: Self::Metric) -> f64;

    fn from_draft(id: RecordId, draft: Self::Draft, created_at: String) -> Self;

    /// Applies a partial update. Remote stores and the local reducer both
    /// go through this so the two stay identical.
    fn apply_patch(&mut self, patch: &Self::Patch);
}
