use std::sync::Arc;
use std::time::Duration;

use outpost_config::OutpostConfig;
use outpost_core::CoreError;
use outpost_domain::EntityRecord;
use outpost_entities::{build_client, ClientSettings, SortKey};
use tracing::info;

use crate::confirm::ConfirmPrompt;
use crate::dispatcher::MutationDispatcher;
use crate::loader::{DataLoader, FixtureSet};
use crate::notify::Notifier;
use crate::page::ListPage;

/// Shared wiring for every page of one console session.
pub struct Console {
    config: OutpostConfig,
    settings: ClientSettings,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn ConfirmPrompt>,
}

/// A page together with the dispatcher bound to the same store.
pub struct PageHandle<R: EntityRecord> {
    pub page: ListPage<R>,
    pub dispatcher: MutationDispatcher<R>,
}

impl Console {
    pub fn new(
        config: OutpostConfig,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Self {
        let settings = ClientSettings {
            base_url: config.entities.base_url.clone(),
            api_key: config.entity_api_key(),
            request_timeout: Duration::from_secs(config.entities.request_timeout_secs),
        };
        Self {
            config,
            settings,
            notifier,
            confirm,
        }
    }

    pub fn config(&self) -> &OutpostConfig {
        &self.config
    }

    pub fn fixtures<R: EntityRecord>(&self) -> Result<FixtureSet<R>, CoreError> {
        match self.config.fixtures_dir() {
            Some(dir) => FixtureSet::from_dir(&dir),
            None => FixtureSet::bundled(),
        }
    }

    /// Builds the page for `R`. The in-memory store starts from the same
    /// fixture set the page falls back to.
    pub fn page<R: EntityRecord>(&self) -> Result<PageHandle<R>, CoreError> {
        let fixtures = self.fixtures::<R>()?;
        let client = build_client::<R>(&self.config.entities.client, &self.settings, fixtures.to_vec())
            .map_err(|error| CoreError::Configuration(error.to_string()))?;
        info!(
            entity = R::ENTITY,
            client = client.client_key(),
            "entity client ready"
        );

        let sort = SortKey::parse(&self.config.entities.default_sort);
        let loader = DataLoader::new(Arc::clone(&client), fixtures).with_sort(sort);
        let mut page = ListPage::new(loader, self.config.layout.compact_breakpoint_px);
        page.set_viewport_width(self.config.layout.viewport_width_px);
        let dispatcher =
            MutationDispatcher::new(client, Arc::clone(&self.notifier), Arc::clone(&self.confirm));

        Ok(PageHandle { page, dispatcher })
    }
}
