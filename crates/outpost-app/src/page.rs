use outpost_core::{
    compute_stats, filter, Choice, DerivedStats, DetailPresentation, FilterState,
    SelectionCoordinator, StatsScope, ViewMode,
};
use outpost_domain::{EntityRecord, RecordId};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::dispatcher::{DispatchOutcome, MutationDispatcher, MutationRequest};
use crate::loader::{DataLoader, LoadOutcome, LoadSource, LoadingFlag};

/// A load started for one mount of a page. It can be awaited inline or
/// spawned, then handed back to [`ListPage::apply_load`].
pub struct PendingLoad<R: EntityRecord> {
    epoch: u64,
    loader: DataLoader<R>,
}

impl<R: EntityRecord> PendingLoad<R> {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub async fn run(self) -> EpochLoad<R> {
        let outcome = self.loader.load().await;
        EpochLoad {
            epoch: self.epoch,
            outcome,
        }
    }

    pub fn spawn(self) -> JoinHandle<EpochLoad<R>> {
        tokio::spawn(self.run())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochLoad<R> {
    pub epoch: u64,
    pub outcome: LoadOutcome<R>,
}

/// State of one list page: the collection, the filter controls, and the
/// detail selection. Each page owns its state; nothing is shared between
/// pages.
pub struct ListPage<R: EntityRecord> {
    loader: DataLoader<R>,
    records: Vec<R>,
    filter: FilterState<R::Status>,
    selection: SelectionCoordinator,
    compact_breakpoint_px: u32,
    epoch: u64,
    /// Raised by loads of the current mount only.
    loading: LoadingFlag,
    mounted: bool,
    source: Option<LoadSource>,
}

impl<R: EntityRecord> ListPage<R> {
    pub fn new(loader: DataLoader<R>, compact_breakpoint_px: u32) -> Self {
        Self {
            loader,
            records: Vec::new(),
            filter: FilterState::default(),
            selection: SelectionCoordinator::default(),
            compact_breakpoint_px,
            epoch: 0,
            loading: LoadingFlag::default(),
            mounted: false,
            source: None,
        }
    }

    /// Starts a new mount and its initial load.
    pub fn mount(&mut self) -> PendingLoad<R> {
        self.epoch += 1;
        self.loading = LoadingFlag::default();
        self.mounted = true;
        debug!(entity = R::ENTITY, epoch = self.epoch, "page mounted");
        self.reload()
    }

    /// Leaves the page. Loads still in flight for this mount are ignored
    /// when they settle.
    pub fn unmount(&mut self) {
        self.epoch += 1;
        self.loading = LoadingFlag::default();
        self.mounted = false;
        self.selection.close();
        debug!(entity = R::ENTITY, epoch = self.epoch, "page unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn reload(&self) -> PendingLoad<R> {
        PendingLoad {
            epoch: self.epoch,
            loader: self.loader.reporting_to(self.loading.clone()),
        }
    }

    /// Installs a settled load. Returns `false` and changes nothing when
    /// the load belongs to an earlier mount.
    pub fn apply_load(&mut self, load: EpochLoad<R>) -> bool {
        if !self.mounted || load.epoch != self.epoch {
            debug!(
                entity = R::ENTITY,
                load_epoch = load.epoch,
                page_epoch = self.epoch,
                "ignoring stale load"
            );
            return false;
        }

        let EpochLoad { outcome, .. } = load;
        info!(
            entity = R::ENTITY,
            count = outcome.records.len(),
            fixture = outcome.source.is_fixture(),
            "page records loaded"
        );
        self.records = outcome.records;
        self.source = Some(outcome.source);
        if self.selection.reconcile(&self.records) {
            debug!(entity = R::ENTITY, "selected record left the collection");
        }
        true
    }

    /// Mounts if needed, then loads and applies in one step.
    pub async fn load_now(&mut self) -> bool {
        let pending = if self.mounted {
            self.reload()
        } else {
            self.mount()
        };
        let load = pending.run().await;
        self.apply_load(load)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn source(&self) -> Option<&LoadSource> {
        self.source.as_ref()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn filter_state(&self) -> &FilterState<R::Status> {
        &self.filter
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
    }

    pub fn set_category(&mut self, category: Choice<String>) {
        self.filter.category = category;
    }

    pub fn set_status(&mut self, status: Choice<R::Status>) {
        self.filter.status = status;
    }

    pub fn clear_filters(&mut self) {
        self.filter = FilterState::default();
    }

    /// The rows the table shows, in collection order.
    pub fn visible(&self) -> Vec<R> {
        filter(&self.records, &self.filter)
    }

    pub fn stats(
        &self,
        scope: StatsScope,
        metrics: &[R::Metric],
    ) -> DerivedStats<R::Status, R::Metric> {
        match scope {
            StatsScope::Filtered => compute_stats(&self.visible(), metrics),
            StatsScope::Global => compute_stats(&self.records, metrics),
        }
    }

    pub fn select(&mut self, id: RecordId) {
        self.selection.select(id);
    }

    pub fn close_detail(&mut self) {
        self.selection.close();
    }

    pub fn set_viewport_width(&mut self, width_px: u32) {
        self.selection
            .set_view_mode(ViewMode::from_width(width_px, self.compact_breakpoint_px));
    }

    pub fn view_mode(&self) -> ViewMode {
        self.selection.view_mode()
    }

    pub fn presentation(&self) -> DetailPresentation {
        self.selection.presentation()
    }

    pub fn selected(&self) -> Option<&R> {
        self.selection.current(&self.records)
    }

    pub fn find(&self, id: &RecordId) -> Option<&R> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub async fn dispatch(
        &mut self,
        dispatcher: &MutationDispatcher<R>,
        request: MutationRequest<R>,
    ) -> DispatchOutcome<R> {
        dispatcher.dispatch(&mut self.records, request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use outpost_core::{CoreError, DEFAULT_COMPACT_BREAKPOINT_PX};
    use outpost_domain::{
        Endpoint, EndpointDraft, EndpointMetric, EndpointPatch, EndpointStatus, MetricKey,
        StatusKey,
    };
    use outpost_entities::{
        EntityClient, EntityClientKind, EntityPredicate, InMemoryEntityClient, SortKey,
    };
    use tokio::sync::Notify;

    use super::*;
    use crate::loader::FixtureSet;

    fn page() -> (Arc<InMemoryEntityClient<Endpoint>>, ListPage<Endpoint>) {
        let fixtures = FixtureSet::<Endpoint>::bundled().expect("bundled endpoints");
        let client = Arc::new(InMemoryEntityClient::seeded(fixtures.to_vec()));
        let loader = DataLoader::new(client.clone(), fixtures);
        (client, ListPage::new(loader, DEFAULT_COMPACT_BREAKPOINT_PX))
    }

    /// Holds the first `list` call until `release` is called.
    struct GatedClient {
        inner: InMemoryEntityClient<Endpoint>,
        gate: Notify,
        held: AtomicBool,
    }

    impl GatedClient {
        fn release(&self) {
            self.gate.notify_one();
        }
    }

    #[async_trait::async_trait]
    impl EntityClient<Endpoint> for GatedClient {
        fn kind(&self) -> EntityClientKind {
            EntityClientKind::Memory
        }

        async fn list(&self, sort: Option<SortKey>) -> Result<Vec<Endpoint>, CoreError> {
            if !self.held.swap(true, Ordering::SeqCst) {
                self.gate.notified().await;
            }
            self.inner.list(sort).await
        }

        async fn filter(&self, predicate: EntityPredicate) -> Result<Vec<Endpoint>, CoreError> {
            self.inner.filter(predicate).await
        }

        async fn create(&self, draft: EndpointDraft) -> Result<Endpoint, CoreError> {
            self.inner.create(draft).await
        }

        async fn update(&self, id: &RecordId, patch: EndpointPatch) -> Result<Endpoint, CoreError> {
            self.inner.update(id, patch).await
        }
    }

    #[tokio::test]
    async fn hung_load_from_previous_mount_does_not_mark_new_mount_loading() {
        let fixtures = FixtureSet::<Endpoint>::bundled().expect("bundled endpoints");
        let client = Arc::new(GatedClient {
            inner: InMemoryEntityClient::seeded(fixtures.to_vec()),
            gate: Notify::new(),
            held: AtomicBool::new(false),
        });
        let mut page = ListPage::new(
            DataLoader::new(client.clone(), fixtures),
            DEFAULT_COMPACT_BREAKPOINT_PX,
        );

        let hung = page.mount().spawn();
        tokio::task::yield_now().await;
        assert!(page.is_loading());
        page.unmount();
        assert!(!page.is_loading());

        let fresh = page.mount().run().await;
        assert!(page.apply_load(fresh));
        assert!(!page.is_loading());

        client.release();
        let stale = hung.await.expect("join hung load");
        assert!(!page.apply_load(stale));
        assert!(!page.is_loading());
    }

    #[tokio::test]
    async fn load_after_unmount_is_ignored() {
        let (_client, mut page) = page();
        let pending = page.mount();
        page.unmount();

        let settled = pending.spawn().await.expect("join load");
        assert!(!page.apply_load(settled));
        assert!(page.records().is_empty());
        assert!(page.source().is_none());
    }

    #[tokio::test]
    async fn remount_ignores_the_previous_mounts_load() {
        let (_client, mut page) = page();
        let first = page.mount();
        page.unmount();
        let second = page.mount();

        let stale = first.run().await;
        let fresh = second.run().await;
        assert!(!page.apply_load(stale));
        assert!(page.apply_load(fresh));
        assert_eq!(page.source(), Some(&LoadSource::Remote));
    }

    #[tokio::test]
    async fn selection_follows_viewport_and_reload() {
        let (client, mut page) = page();
        assert!(page.load_now().await);

        let id = page.records()[0].id.clone();
        page.select(id.clone());
        page.set_viewport_width(1280);
        assert_eq!(page.presentation(), DetailPresentation::SidePanel(id.clone()));
        page.set_viewport_width(390);
        assert_eq!(page.presentation(), DetailPresentation::Drawer(id.clone()));

        page.select(RecordId::from("ep-9999"));
        client.fail_reads("offline");
        assert!(page.load_now().await);
        assert_eq!(page.presentation(), DetailPresentation::Hidden);
        assert!(!page.is_loading());
    }

    #[tokio::test]
    async fn stats_scope_is_chosen_by_the_caller() {
        let (_client, mut page) = page();
        page.load_now().await;
        page.set_status(Choice::Only(EndpointStatus::Online));

        let global = page.stats(StatsScope::Global, EndpointMetric::ALL);
        let filtered = page.stats(StatsScope::Filtered, EndpointMetric::ALL);

        assert_eq!(global.total, page.records().len());
        assert_eq!(filtered.total, page.visible().len());
        assert_eq!(filtered.count(EndpointStatus::Online), filtered.total);
        for status in EndpointStatus::ALL {
            assert!(filtered.count(*status) <= global.count(*status));
        }
    }
}
