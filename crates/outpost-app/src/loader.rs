use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use outpost_core::CoreError;
use outpost_domain::{fixtures, EntityRecord};
use outpost_entities::{EntityClient, SortKey};
use tracing::{debug, warn};

/// Records a page shows when the store has nothing to offer. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureSet<R> {
    records: Vec<R>,
}

impl<R: EntityRecord> FixtureSet<R> {
    pub fn new(records: Vec<R>) -> Result<Self, CoreError> {
        if records.is_empty() {
            return Err(CoreError::Configuration(format!(
                "{} fixture set must contain at least one record",
                R::ENTITY
            )));
        }
        Ok(Self { records })
    }

    pub fn bundled() -> Result<Self, CoreError> {
        let parsed = fixtures::bundled::<R>().ok_or_else(|| {
            CoreError::Configuration(format!("no bundled fixture set for {}", R::ENTITY))
        })?;
        let records = parsed.map_err(|error| {
            CoreError::Configuration(format!(
                "bundled {} fixture set is malformed: {error}",
                R::ENTITY
            ))
        })?;
        Self::new(records)
    }

    /// Reads `<dir>/<Entity>.json`, falling back to the bundled set when the
    /// directory has no file for this entity.
    pub fn from_dir(dir: &Path) -> Result<Self, CoreError> {
        let path = dir.join(format!("{}.json", R::ENTITY));
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    entity = R::ENTITY,
                    path = %path.display(),
                    "no fixture override; using bundled set"
                );
                return Self::bundled();
            }
            Err(error) => {
                return Err(CoreError::Configuration(format!(
                    "failed to read fixture file '{}': {error}",
                    path.display()
                )));
            }
        };

        let records = fixtures::parse::<R>(&raw).map_err(|error| {
            CoreError::Configuration(format!(
                "fixture file '{}' is malformed: {error}",
                path.display()
            ))
        })?;
        Self::new(records)
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn to_vec(&self) -> Vec<R> {
        self.records.clone()
    }
}

/// Shared "a load is in flight" indicator. Raised while at least one
/// [`LoadingGuard`] is alive.
#[derive(Debug, Clone, Default)]
pub struct LoadingFlag {
    in_flight: Arc<AtomicUsize>,
}

impl LoadingFlag {
    pub fn raise(&self) -> LoadingGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

#[derive(Debug)]
pub struct LoadingGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    /// The store answered with an empty collection.
    FixtureEmpty,
    /// The store call failed with the given message.
    FixtureError(String),
}

impl LoadSource {
    pub fn is_fixture(&self) -> bool {
        !matches!(self, Self::Remote)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome<R> {
    pub records: Vec<R>,
    pub source: LoadSource,
}

pub struct DataLoader<R: EntityRecord> {
    client: Arc<dyn EntityClient<R>>,
    fixtures: FixtureSet<R>,
    loading: LoadingFlag,
    sort: Option<SortKey>,
}

impl<R: EntityRecord> Clone for DataLoader<R> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            fixtures: self.fixtures.clone(),
            loading: self.loading.clone(),
            sort: self.sort.clone(),
        }
    }
}

impl<R: EntityRecord> DataLoader<R> {
    pub fn new(client: Arc<dyn EntityClient<R>>, fixtures: FixtureSet<R>) -> Self {
        Self {
            client,
            fixtures,
            loading: LoadingFlag::default(),
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: Option<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    pub fn loading_flag(&self) -> &LoadingFlag {
        &self.loading
    }

    /// A copy of this loader that raises `loading` instead of its own flag.
    pub fn reporting_to(&self, loading: LoadingFlag) -> Self {
        Self {
            loading,
            ..self.clone()
        }
    }

    pub fn client(&self) -> Arc<dyn EntityClient<R>> {
        Arc::clone(&self.client)
    }

    /// Lists the collection from the store. An empty answer or a failed call
    /// yields the fixture set instead, so the outcome is never empty.
    pub async fn load(&self) -> LoadOutcome<R> {
        let _guard = self.loading.raise();
        match self.client.list(self.sort.clone()).await {
            Ok(records) if records.is_empty() => {
                debug!(entity = R::ENTITY, "entity store returned no records; using fixtures");
                LoadOutcome {
                    records: self.fixtures.to_vec(),
                    source: LoadSource::FixtureEmpty,
                }
            }
            Ok(records) => LoadOutcome {
                records,
                source: LoadSource::Remote,
            },
            Err(error) => {
                warn!(
                    entity = R::ENTITY,
                    client = self.client.client_key(),
                    error = %error,
                    "failed to load entity records; using fixtures"
                );
                LoadOutcome {
                    records: self.fixtures.to_vec(),
                    source: LoadSource::FixtureError(error.to_string()),
                }
            }
        }
    }
}
