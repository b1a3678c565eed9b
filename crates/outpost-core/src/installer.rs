use outpost_domain::{is_valid_version, Installer, ValidationError};

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerScript {
    pub file_name: String,
    pub contents: String,
}

/// Renders the enrollment script a generated installer is downloaded as.
pub fn render_script(installer: &Installer, server_url: &str) -> Result<InstallerScript, CoreError> {
    let server_url = server_url.trim().trim_end_matches('/');
    if server_url.is_empty() {
        return Err(ValidationError::MissingField { field: "server_url" }.into());
    }
    if server_url.contains(['\'', '"', '`', '$']) || server_url.chars().any(char::is_whitespace) {
        return Err(ValidationError::Invalid {
            field: "server_url",
            reason: "quotes, whitespace and shell expansions are not allowed".to_owned(),
        }
        .into());
    }
    let token = installer.enrollment_token.as_str();
    if token.is_empty()
        || !token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Err(ValidationError::Invalid {
            field: "enrollment_token",
            reason: "expected letters, digits, '_' and '-'".to_owned(),
        }
        .into());
    }
    let version = installer.version.as_str();
    if !is_valid_version(version) {
        return Err(ValidationError::Invalid {
            field: "version",
            reason: format!("'{version}' cannot be embedded in an installer script"),
        }
        .into());
    }

    let (file_name, contents) = match installer.platform.as_str() {
        "windows" => (
            format!("outpost-agent-{version}.ps1"),
            format!(
                "$ErrorActionPreference = 'Stop'\r\n\
                 $installer = Join-Path $env:TEMP 'outpost-agent-{version}.msi'\r\n\
                 Invoke-WebRequest -Uri '{server_url}/downloads/agent/{version}/windows' -OutFile $installer\r\n\
                 Start-Process msiexec.exe -Wait -ArgumentList '/i', $installer, '/qn', 'ENROLLMENT_TOKEN={token}', 'SERVER_URL={server_url}'\r\n"
            ),
        ),
        "linux" => (
            format!("outpost-agent-{version}.sh"),
            format!(
                "#!/bin/sh\n\
                 set -eu\n\
                 curl -fsSL '{server_url}/downloads/agent/{version}/linux' -o /tmp/outpost-agent.tar.gz\n\
                 tar -xzf /tmp/outpost-agent.tar.gz -C /opt\n\
                 /opt/outpost-agent/bin/outpost-agent enroll --server '{server_url}' --token '{token}'\n"
            ),
        ),
        "macos" => (
            format!("outpost-agent-{version}.command"),
            format!(
                "#!/bin/sh\n\
                 set -eu\n\
                 curl -fsSL '{server_url}/downloads/agent/{version}/macos' -o /tmp/outpost-agent.pkg\n\
                 sudo installer -pkg /tmp/outpost-agent.pkg -target /\n\
                 sudo /Library/Outpost/outpost-agent enroll --server '{server_url}' --token '{token}'\n"
            ),
        ),
        other => {
            return Err(ValidationError::Invalid {
                field: "platform",
                reason: format!("no installer template for '{other}'"),
            }
            .into())
        }
    };

    Ok(InstallerScript {
        file_name,
        contents,
    })
}
