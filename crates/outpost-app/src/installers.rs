use std::path::PathBuf;

use outpost_core::installer::render_script;
use outpost_core::CoreError;
use outpost_domain::{Installer, InstallerDraft};
use tracing::warn;

use crate::dispatcher::{DispatchOutcome, MutationDispatcher};
use crate::export::Exporter;
use crate::mutations;
use crate::page::ListPage;

#[derive(Debug, Clone, PartialEq)]
pub enum InstallerGeneration {
    Exported {
        installer: Installer,
        script_path: PathBuf,
    },
    /// The record exists but its script could not be rendered or written.
    ExportFailed {
        installer: Installer,
        error: CoreError,
    },
    NotCreated(DispatchOutcome<Installer>),
}

/// Creates an installer record, then renders its enrollment script and
/// hands it to `exporter` as a download.
pub async fn generate_and_export(
    page: &mut ListPage<Installer>,
    dispatcher: &MutationDispatcher<Installer>,
    exporter: &dyn Exporter,
    draft: InstallerDraft,
    server_url: &str,
) -> InstallerGeneration {
    let installer = match page
        .dispatch(dispatcher, mutations::generate_installer(draft))
        .await
    {
        DispatchOutcome::Applied(installer) => installer,
        other => return InstallerGeneration::NotCreated(other),
    };

    let exported = match render_script(&installer, server_url) {
        Ok(script) => {
            exporter
                .download(&script.file_name, script.contents.as_bytes())
                .await
        }
        Err(error) => Err(error),
    };

    match exported {
        Ok(script_path) => {
            dispatcher
                .notifier()
                .info(&format!("Installer script saved to {}", script_path.display()));
            InstallerGeneration::Exported {
                installer,
                script_path,
            }
        }
        Err(error) => {
            warn!(id = %installer.id, error = %error, "failed to export installer script");
            dispatcher
                .notifier()
                .error(&format!("Installer script export failed: {error}"));
            InstallerGeneration::ExportFailed { installer, error }
        }
    }
}
