use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use outpost_core::CoreError;
use outpost_domain::{EntityRecord, RecordId, Validate};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::interface::{EntityClient, EntityClientKind, SortKey};
use crate::predicate::{record_value, sort_records, EntityPredicate};

#[derive(Debug, Default, Clone)]
struct FailurePlan {
    reads: Option<String>,
    writes: Option<String>,
}

/// Process-local entity store. Backs offline demos and tests; failures can be
/// injected to exercise the fallback and rejection paths.
#[derive(Debug)]
pub struct InMemoryEntityClient<R: EntityRecord> {
    records: Mutex<Vec<R>>,
    next_sequence: AtomicU64,
    failures: Mutex<FailurePlan>,
}

impl<R: EntityRecord> Default for InMemoryEntityClient<R> {
    fn default() -> Self {
        Self::seeded(Vec::new())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<R: EntityRecord> InMemoryEntityClient<R> {
    pub fn seeded(records: Vec<R>) -> Self {
        let next_sequence = records.len() as u64 + 1;
        Self {
            records: Mutex::new(records),
            next_sequence: AtomicU64::new(next_sequence),
            failures: Mutex::new(FailurePlan::default()),
        }
    }

    pub fn fail_reads(&self, message: impl Into<String>) {
        lock(&self.failures).reads = Some(message.into());
    }

    pub fn fail_writes(&self, message: impl Into<String>) {
        lock(&self.failures).writes = Some(message.into());
    }

    pub fn clear_failures(&self) {
        *lock(&self.failures) = FailurePlan::default();
    }

    pub fn snapshot(&self) -> Vec<R> {
        lock(&self.records).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }

    fn check_reads(&self) -> Result<(), CoreError> {
        match &lock(&self.failures).reads {
            Some(message) => Err(CoreError::DependencyUnavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn check_writes(&self) -> Result<(), CoreError> {
        match &lock(&self.failures).writes {
            Some(message) => Err(CoreError::DependencyUnavailable(message.clone())),
            None => Ok(()),
        }
    }

    fn allocate_id(&self, records: &[R]) -> RecordId {
        loop {
            let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
            let candidate = RecordId::sequenced(R::ID_PREFIX, sequence);
            if records.iter().all(|record| *record.id() != candidate) {
                return candidate;
            }
        }
    }
}

fn now_rfc3339() -> Result<String, CoreError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|error| CoreError::Configuration(format!("failed to format timestamp: {error}")))
}

#[async_trait]
impl<R: EntityRecord> EntityClient<R> for InMemoryEntityClient<R> {
    fn kind(&self) -> EntityClientKind {
        EntityClientKind::Memory
    }

    async fn list(&self, sort: Option<SortKey>) -> Result<Vec<R>, CoreError> {
        self.check_reads()?;
        let mut records = self.snapshot();
        if let Some(sort) = sort {
            sort_records(&mut records, &sort)?;
        }
        Ok(records)
    }

    async fn filter(&self, predicate: EntityPredicate) -> Result<Vec<R>, CoreError> {
        self.check_reads()?;
        let mut matched = Vec::new();
        for record in self.snapshot() {
            if predicate.matches_value(&record_value(&record)?) {
                matched.push(record);
            }
        }
        Ok(matched)
    }

    async fn create(&self, draft: R::Draft) -> Result<R, CoreError> {
        self.check_writes()?;
        draft.validate()?;
        let created_at = now_rfc3339()?;
        let mut records = lock(&self.records);
        let id = self.allocate_id(&records);
        let record = R::from_draft(id, draft, created_at);
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R, CoreError> {
        self.check_writes()?;
        let mut records = lock(&self.records);
        let record = records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| CoreError::NotFound {
                entity: R::ENTITY,
                id: id.clone(),
            })?;
        record.apply_patch(&patch);
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use outpost_domain::{ApiKey, ApiKeyDraft, ApiKeyPatch, ApiKeyStatus, Endpoint};

    use super::*;

    fn seeded() -> InMemoryEntityClient<ApiKey> {
        let records = outpost_domain::fixtures::bundled::<ApiKey>()
            .expect("bundled api keys")
            .expect("parse api keys");
        InMemoryEntityClient::seeded(records)
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("test runtime")
            .block_on(future)
    }

    #[test]
    fn newest_first_orders_endpoints_by_last_seen() {
        let endpoints = outpost_domain::fixtures::bundled::<Endpoint>()
            .expect("bundled endpoints")
            .expect("parse endpoints");
        let client = InMemoryEntityClient::seeded(endpoints);

        let listed = block_on(client.list(SortKey::parse("-updated_at"))).expect("list");

        let ids = listed.iter().map(|endpoint| endpoint.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["ep-0001", "ep-0005", "ep-0002", "ep-0003", "ep-0004"]);
    }

    #[test]
    fn create_assigns_unused_sequenced_id() {
        let client = seeded();
        let before = client.len();

        let created = block_on(client.create(ApiKeyDraft {
            name: "Threat intel feed".to_owned(),
            scope: "read".to_owned(),
        }))
        .expect("create key");

        assert_eq!(created.id.as_str(), "key-0005");
        assert_eq!(created.status, ApiKeyStatus::Active);
        assert_eq!(client.len(), before + 1);
    }

    #[test]
    fn create_rejects_invalid_draft() {
        let client = seeded();
        let error = block_on(client.create(ApiKeyDraft {
            name: " ".to_owned(),
            scope: "read".to_owned(),
        }))
        .expect_err("blank name");
        assert!(error.is_validation());
    }

    #[test]
    fn update_applies_patch_and_reports_unknown_ids() {
        let client = seeded();
        let revoked = block_on(client.update(
            &RecordId::from("key-0001"),
            ApiKeyPatch {
                status: Some(ApiKeyStatus::Revoked),
                name: None,
            },
        ))
        .expect("revoke");
        assert_eq!(revoked.status, ApiKeyStatus::Revoked);

        let missing = block_on(client.update(&RecordId::from("key-9999"), ApiKeyPatch::default()))
            .expect_err("unknown key");
        assert!(matches!(missing, CoreError::NotFound { .. }));
    }

    #[test]
    fn filter_uses_serialized_field_equality() {
        let client = seeded();
        let active = block_on(client.filter(EntityPredicate::new().with("status", "active")))
            .expect("filter");
        assert!(!active.is_empty());
        assert!(active.iter().all(|key| key.status == ApiKeyStatus::Active));
    }

    #[test]
    fn injected_failures_surface_as_dependency_errors() {
        let client = seeded();
        client.fail_reads("store offline");
        client.fail_writes("store read-only");

        assert_eq!(
            block_on(client.list(None)).expect_err("read failure"),
            CoreError::DependencyUnavailable("store offline".to_owned())
        );
        assert!(block_on(client.update(&RecordId::from("key-0001"), ApiKeyPatch::default())).is_err());

        client.clear_failures();
        assert!(block_on(client.list(Some(SortKey::descending("request_count")))).is_ok());
    }
}
