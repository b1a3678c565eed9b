use std::path::PathBuf;

use outpost_core::CoreError;
use outpost_domain::{ApiKey, ApiKeyDraft};
use tracing::warn;

use crate::dispatcher::{DispatchOutcome, MutationDispatcher};
use crate::export::Exporter;
use crate::mutations;
use crate::page::ListPage;

#[derive(Debug, Clone, PartialEq)]
pub enum KeyIssue {
    Copied {
        key: ApiKey,
        clipboard_path: PathBuf,
    },
    /// The key exists but its value did not reach the clipboard.
    CopyFailed {
        key: ApiKey,
        error: CoreError,
    },
    NotIssued(DispatchOutcome<ApiKey>),
}

/// Issues an API key, then copies its value to the clipboard through
/// `exporter`.
pub async fn issue_and_copy(
    page: &mut ListPage<ApiKey>,
    dispatcher: &MutationDispatcher<ApiKey>,
    exporter: &dyn Exporter,
    draft: ApiKeyDraft,
) -> KeyIssue {
    let key = match page
        .dispatch(dispatcher, mutations::issue_api_key(draft))
        .await
    {
        DispatchOutcome::Applied(key) => key,
        other => return KeyIssue::NotIssued(other),
    };

    let label = format!("api-key-{}", key.id);
    match exporter.copy_text(&label, &key.key_prefix).await {
        Ok(clipboard_path) => {
            dispatcher.notifier().info("API key copied to clipboard");
            KeyIssue::Copied {
                key,
                clipboard_path,
            }
        }
        Err(error) => {
            warn!(id = %key.id, error = %error, "failed to copy api key");
            dispatcher
                .notifier()
                .error(&format!("Copying the API key failed: {error}"));
            KeyIssue::CopyFailed { key, error }
        }
    }
}
