use std::sync::Arc;

use outpost_core::{apply_effect, CoreError, LocalEffect};
use outpost_domain::{EntityRecord, RecordId, Validate, ValidationError};
use outpost_entities::EntityClient;
use tracing::{info, warn};

use crate::confirm::ConfirmPrompt;
use crate::notify::Notifier;

#[derive(Debug, Clone, PartialEq)]
pub enum MutationKind<R: EntityRecord> {
    Create(R::Draft),
    Update { id: RecordId, patch: R::Patch },
}

/// One user-initiated change to a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest<R: EntityRecord> {
    pub label: String,
    pub kind: MutationKind<R>,
    /// Prompt shown before a destructive change; `None` skips confirmation.
    pub confirmation: Option<String>,
    pub success_message: String,
}

impl<R: EntityRecord> MutationRequest<R> {
    pub fn create(label: impl Into<String>, draft: R::Draft) -> Self {
        let label = label.into();
        Self {
            success_message: format!("{label} succeeded"),
            label,
            kind: MutationKind::Create(draft),
            confirmation: None,
        }
    }

    pub fn update(label: impl Into<String>, id: RecordId, patch: R::Patch) -> Self {
        let label = label.into();
        Self {
            success_message: format!("{label} succeeded"),
            label,
            kind: MutationKind::Update { id, patch },
            confirmation: None,
        }
    }

    pub fn confirm_with(mut self, prompt: impl Into<String>) -> Self {
        self.confirmation = Some(prompt.into());
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }

    pub fn is_destructive(&self) -> bool {
        self.confirmation.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome<R> {
    /// The store accepted the change and the local collection reflects it.
    Applied(R),
    /// The operator declined the confirmation prompt.
    Cancelled,
    /// The store refused or could not be reached; nothing changed locally.
    Rejected(CoreError),
    /// Input failed validation before any remote call.
    Invalid(ValidationError),
}

impl<R> DispatchOutcome<R> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn applied(self) -> Option<R> {
        match self {
            Self::Applied(record) => Some(record),
            _ => None,
        }
    }
}

pub struct MutationDispatcher<R: EntityRecord> {
    client: Arc<dyn EntityClient<R>>,
    notifier: Arc<dyn Notifier>,
    confirm: Arc<dyn ConfirmPrompt>,
}

impl<R: EntityRecord> Clone for MutationDispatcher<R> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            notifier: Arc::clone(&self.notifier),
            confirm: Arc::clone(&self.confirm),
        }
    }
}

impl<R: EntityRecord> MutationDispatcher<R> {
    pub fn new(
        client: Arc<dyn EntityClient<R>>,
        notifier: Arc<dyn Notifier>,
        confirm: Arc<dyn ConfirmPrompt>,
    ) -> Self {
        Self {
            client,
            notifier,
            confirm,
        }
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Runs `request` against the store and, only once the store accepted it,
    /// applies the same change to `records`.
    pub async fn dispatch(
        &self,
        records: &mut Vec<R>,
        request: MutationRequest<R>,
    ) -> DispatchOutcome<R> {
        let MutationRequest {
            label,
            kind,
            confirmation,
            success_message,
        } = request;

        if let MutationKind::Create(draft) = &kind {
            if let Err(error) = draft.validate() {
                self.notifier.error(&format!("{label} failed: {error}"));
                return DispatchOutcome::Invalid(error);
            }
        }

        if let Some(prompt) = confirmation.as_deref() {
            if !self.confirm.confirm(prompt).await {
                info!(entity = R::ENTITY, mutation = %label, "mutation cancelled by operator");
                return DispatchOutcome::Cancelled;
            }
        }

        let (remote, effect) = match kind {
            MutationKind::Create(draft) => match self.client.create(draft).await {
                Ok(created) => (created.clone(), LocalEffect::Append(created)),
                Err(error) => return self.reject(&label, error),
            },
            MutationKind::Update { id, patch } => {
                match self.client.update(&id, patch.clone()).await {
                    Ok(updated) => (updated, LocalEffect::Patch { id, patch }),
                    Err(error) => return self.reject(&label, error),
                }
            }
        };

        let record_id = effect.record_id().clone();
        let applied = match apply_effect(records, effect) {
            Ok(()) => records
                .iter()
                .find(|record| *record.id() == record_id)
                .cloned()
                .unwrap_or(remote),
            Err(error) => {
                warn!(
                    entity = R::ENTITY,
                    mutation = %label,
                    error = %error,
                    "store accepted mutation for a record missing from the local collection"
                );
                remote
            }
        };

        info!(entity = R::ENTITY, mutation = %label, id = %record_id, "mutation applied");
        self.notifier.success(&success_message);
        DispatchOutcome::Applied(applied)
    }

    fn reject(&self, label: &str, error: CoreError) -> DispatchOutcome<R> {
        warn!(entity = R::ENTITY, mutation = %label, error = %error, "mutation rejected");
        self.notifier.error(&format!("{label} failed: {error}"));
        DispatchOutcome::Rejected(error)
    }
}
