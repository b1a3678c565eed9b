//! The console's stock mutations, one constructor per action button.

use outpost_domain::{
    ApiKey, ApiKeyDraft, ApiKeyPatch, ApiKeyStatus, Endpoint, EndpointPatch, EndpointStatus,
    Installer, InstallerDraft, QueryStatus, SavedQuery, SavedQueryDraft, SavedQueryPatch,
    SdkIntegration, SdkPatch, SdkStatus,
};

use crate::dispatcher::MutationRequest;

pub fn revoke_api_key(key: &ApiKey) -> MutationRequest<ApiKey> {
    MutationRequest::update(
        "Revoke API key",
        key.id.clone(),
        ApiKeyPatch {
            status: Some(ApiKeyStatus::Revoked),
            name: None,
        },
    )
    .confirm_with(format!(
        "Revoke API key '{}' ({})? Integrations using it stop working immediately.",
        key.name, key.key_prefix
    ))
    .with_success_message(format!("API key '{}' revoked", key.name))
}

pub fn issue_api_key(draft: ApiKeyDraft) -> MutationRequest<ApiKey> {
    let message = format!("API key '{}' issued", draft.name.trim());
    MutationRequest::create("Issue API key", draft).with_success_message(message)
}

pub fn install_sdk(sdk: &SdkIntegration) -> MutationRequest<SdkIntegration> {
    MutationRequest::update(
        "Install SDK",
        sdk.id.clone(),
        SdkPatch {
            status: Some(SdkStatus::Installed),
            version: None,
        },
    )
    .with_success_message(format!("{} SDK {} installed", sdk.name, sdk.version))
}

pub fn isolate_endpoint(endpoint: &Endpoint) -> MutationRequest<Endpoint> {
    MutationRequest::update(
        "Isolate endpoint",
        endpoint.id.clone(),
        EndpointPatch::status(EndpointStatus::Isolated),
    )
    .with_success_message(format!("{} isolated from the network", endpoint.hostname))
}

pub fn wipe_endpoint(endpoint: &Endpoint) -> MutationRequest<Endpoint> {
    MutationRequest::update(
        "Wipe endpoint",
        endpoint.id.clone(),
        EndpointPatch::status(EndpointStatus::Wiped),
    )
    .confirm_with(format!(
        "Wipe {} ({})? All data on the device is erased and cannot be recovered.",
        endpoint.hostname, endpoint.ip_address
    ))
    .with_success_message(format!("Wipe issued for {}", endpoint.hostname))
}

pub fn generate_installer(draft: InstallerDraft) -> MutationRequest<Installer> {
    let message = format!(
        "Installer '{}' generated for {}",
        draft.name.trim(),
        draft.platform.trim().to_ascii_lowercase()
    );
    MutationRequest::create("Generate installer", draft).with_success_message(message)
}

pub fn save_query(draft: SavedQueryDraft) -> MutationRequest<SavedQuery> {
    let message = format!("Query '{}' saved", draft.name.trim());
    MutationRequest::create("Save query", draft).with_success_message(message)
}

pub fn archive_query(query: &SavedQuery) -> MutationRequest<SavedQuery> {
    MutationRequest::update(
        "Archive query",
        query.id.clone(),
        SavedQueryPatch {
            status: Some(QueryStatus::Archived),
            name: None,
        },
    )
    .with_success_message(format!("Query '{}' archived", query.name))
}
