//! List-page controllers for the Outpost Zero console: loading with fixture
//! fallback, filtering, summary cards, detail selection and mutations.

pub mod composition;
pub mod confirm;
pub mod dispatcher;
pub mod export;
pub mod installers;
pub mod keys;
pub mod loader;
pub mod mutations;
pub mod notify;
pub mod page;

pub use composition::{Console, PageHandle};
pub use confirm::{ConfirmPrompt, StaticConfirm};
pub use dispatcher::{DispatchOutcome, MutationDispatcher, MutationKind, MutationRequest};
pub use export::{DirectoryExporter, Exporter};
pub use installers::{generate_and_export, InstallerGeneration};
pub use keys::{issue_and_copy, KeyIssue};
pub use loader::{DataLoader, FixtureSet, LoadOutcome, LoadSource, LoadingFlag, LoadingGuard};
pub use notify::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use page::{EpochLoad, ListPage, PendingLoad};
