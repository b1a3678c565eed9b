use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_OUTPOST_CONFIG: &str = "OUTPOST_CONFIG";

const DEFAULT_ENTITY_CLIENT: &str = "entities.memory";
const DEFAULT_ENTITY_API_KEY_ENV: &str = "OUTPOST_ENTITY_API_KEY";
const DEFAULT_ENTITY_REQUEST_TIMEOUT_SECS: u64 = 20;
const DEFAULT_ENTITY_SORT: &str = "-updated_at";
const DEFAULT_COMPACT_BREAKPOINT_PX: u32 = 768;
const DEFAULT_VIEWPORT_WIDTH_PX: u32 = 1280;
const DEFAULT_INSTALLER_SERVER_URL: &str = "https://console.outpost.example";
const DEFAULT_LOG_FILE_NAME: &str = "outpost.log";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    fn configuration(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutpostConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub entities: EntitiesConfigToml,
    #[serde(default)]
    pub fixtures: FixturesConfigToml,
    #[serde(default)]
    pub layout: LayoutConfigToml,
    #[serde(default)]
    pub export: ExportConfigToml,
    #[serde(default)]
    pub logging: LoggingConfigToml,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntitiesConfigToml {
    #[serde(default = "default_entity_client")]
    pub client: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_entity_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_entity_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_entity_sort")]
    pub default_sort: String,
}

impl Default for EntitiesConfigToml {
    fn default() -> Self {
        Self {
            client: default_entity_client(),
            base_url: String::new(),
            api_key_env: default_entity_api_key_env(),
            request_timeout_secs: default_entity_request_timeout_secs(),
            default_sort: default_entity_sort(),
        }
    }
}

/// Seed datasets shown when the entity store is empty or unreachable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixturesConfigToml {
    /// Directory holding `<Entity>.json` overrides of the bundled fixtures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutConfigToml {
    #[serde(default = "default_compact_breakpoint_px")]
    pub compact_breakpoint_px: u32,
    #[serde(default = "default_viewport_width_px")]
    pub viewport_width_px: u32,
}

impl Default for LayoutConfigToml {
    fn default() -> Self {
        Self {
            compact_breakpoint_px: default_compact_breakpoint_px(),
            viewport_width_px: default_viewport_width_px(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportConfigToml {
    #[serde(default)]
    pub dir: String,
    #[serde(default = "default_installer_server_url")]
    pub installer_server_url: String,
}

impl Default for ExportConfigToml {
    fn default() -> Self {
        Self {
            dir: String::new(),
            installer_server_url: default_installer_server_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfigToml {
    #[serde(default = "default_log_file_name")]
    pub file_name: String,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfigToml {
    fn default() -> Self {
        Self {
            file_name: default_log_file_name(),
            filter: default_log_filter(),
        }
    }
}

impl Default for OutpostConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            entities: EntitiesConfigToml::default(),
            fixtures: FixturesConfigToml::default(),
            layout: LayoutConfigToml::default(),
            export: ExportConfigToml::default(),
            logging: LoggingConfigToml::default(),
        }
    }
}

impl OutpostConfig {
    pub fn log_file_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.logging.file_name)
    }

    /// Export directory; falls back to `<data_dir>/exports` when unset.
    pub fn export_dir(&self) -> PathBuf {
        if self.export.dir.trim().is_empty() {
            Path::new(&self.data_dir).join("exports")
        } else {
            PathBuf::from(self.export.dir.trim())
        }
    }

    pub fn fixtures_dir(&self) -> Option<PathBuf> {
        self.fixtures
            .dir
            .as_deref()
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
    }

    /// Reads the entity store API key from the configured environment
    /// variable. Blank values count as unset.
    pub fn entity_api_key(&self) -> Option<String> {
        std::env::var(self.entities.api_key_env.as_str())
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }
}

pub fn load_from_env() -> Result<OutpostConfig, ConfigError> {
    let path = config_path_from_env()?;
    load_from_path(path)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<OutpostConfig, ConfigError> {
    load_or_create_config(path.as_ref())
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = resolve_home_dir().ok_or_else(|| {
        ConfigError::configuration("Unable to resolve home directory from HOME or USERPROFILE")
    })?;

    Ok(home.join(".config").join("outpost").join("config.toml"))
}

fn config_path_from_env() -> Result<PathBuf, ConfigError> {
    match std::env::var(ENV_OUTPOST_CONFIG) {
        Ok(raw) => {
            if raw.trim().is_empty() {
                default_config_path()
            } else {
                Ok(raw.into())
            }
        }
        Err(std::env::VarError::NotPresent) => default_config_path(),
        Err(_) => Err(ConfigError::configuration(
            "OUTPOST_CONFIG contained invalid UTF-8",
        )),
    }
}

fn resolve_data_local_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(path) = std::env::var("LOCALAPPDATA") {
            let path = path.trim();
            if !path.is_empty() {
                return absolutize_path(PathBuf::from(path));
            }
        }
        if let Some(home) = resolve_home_dir() {
            return home.join("AppData").join("Local");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = resolve_home_dir() {
            return home.join("Library").join("Application Support");
        }
    }

    #[cfg(all(not(target_os = "windows"), not(target_os = "macos")))]
    {
        if let Ok(path) = std::env::var("XDG_DATA_HOME") {
            let path = path.trim();
            if !path.is_empty() {
                return absolutize_path(PathBuf::from(path));
            }
        }
        if let Some(home) = resolve_home_dir() {
            return home.join(".local").join("share");
        }
    }

    std::env::temp_dir()
}

fn resolve_home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("USERPROFILE")
                .ok()
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
}

fn absolutize_path(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }

    if let Ok(current) = std::env::current_dir() {
        return current.join(path);
    }

    std::env::temp_dir().join(path)
}

fn default_data_dir() -> String {
    resolve_data_local_dir()
        .join("outpost")
        .to_string_lossy()
        .to_string()
}

fn default_entity_client() -> String {
    DEFAULT_ENTITY_CLIENT.to_owned()
}

fn default_entity_api_key_env() -> String {
    DEFAULT_ENTITY_API_KEY_ENV.to_owned()
}

fn default_entity_request_timeout_secs() -> u64 {
    DEFAULT_ENTITY_REQUEST_TIMEOUT_SECS
}

fn default_entity_sort() -> String {
    DEFAULT_ENTITY_SORT.to_owned()
}

fn default_compact_breakpoint_px() -> u32 {
    DEFAULT_COMPACT_BREAKPOINT_PX
}

fn default_viewport_width_px() -> u32 {
    DEFAULT_VIEWPORT_WIDTH_PX
}

fn default_installer_server_url() -> String {
    DEFAULT_INSTALLER_SERVER_URL.to_owned()
}

fn default_log_file_name() -> String {
    DEFAULT_LOG_FILE_NAME.to_owned()
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

fn persist_config(path: &Path, config: &OutpostConfig) -> Result<(), ConfigError> {
    let rendered = toml::to_string_pretty(config).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to serialize OUTPOST_CONFIG for {}: {err}",
            path.display()
        ))
    })?;

    std::fs::write(path, rendered.as_bytes()).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to write OUTPOST_CONFIG to {}: {err}",
            path.display()
        ))
    })
}

fn load_or_create_config(path: &Path) -> Result<OutpostConfig, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|err| {
                        ConfigError::configuration(format!(
                            "Failed to create parent directory {} for OUTPOST_CONFIG: {err}",
                            parent.display()
                        ))
                    })?;
                }
            }

            let default_config = OutpostConfig::default();
            persist_config(path, &default_config)?;
            return Ok(default_config);
        }
        Err(err) => {
            return Err(ConfigError::configuration(format!(
                "Failed to read OUTPOST_CONFIG from {}: {err}",
                path.display()
            )));
        }
    };

    let mut config: OutpostConfig = toml::from_str(&raw).map_err(|err| {
        ConfigError::configuration(format!(
            "Failed to parse OUTPOST_CONFIG from {}: {err}",
            path.display()
        ))
    })?;

    let changed = normalize_config(&mut config)?;
    if changed {
        persist_config(path, &config)?;
    }

    Ok(config)
}

fn normalize_config(config: &mut OutpostConfig) -> Result<bool, ConfigError> {
    let mut changed = false;

    changed |= normalize_non_empty_string(&mut config.data_dir, default_data_dir());
    changed |= normalize_client_selection(&mut config.entities.client)?;
    changed |= normalize_trimmed(&mut config.entities.base_url);
    if config.entities.client == "entities.rest" && config.entities.base_url.is_empty() {
        return Err(ConfigError::configuration(
            "Invalid OUTPOST_CONFIG: `entities.base_url` is required when `entities.client` is `entities.rest`.",
        ));
    }
    changed |= normalize_non_empty_string(
        &mut config.entities.api_key_env,
        default_entity_api_key_env(),
    );
    changed |= normalize_non_empty_string(&mut config.entities.default_sort, default_entity_sort());

    let normalized_timeout = if config.entities.request_timeout_secs == 0 {
        default_entity_request_timeout_secs()
    } else {
        config.entities.request_timeout_secs.clamp(1, 300)
    };
    if normalized_timeout != config.entities.request_timeout_secs {
        config.entities.request_timeout_secs = normalized_timeout;
        changed = true;
    }

    if let Some(dir) = config.fixtures.dir.as_mut() {
        changed |= normalize_trimmed(dir);
    }
    if config.fixtures.dir.as_deref() == Some("") {
        config.fixtures.dir = None;
        changed = true;
    }

    changed |= normalize_layout_config(&mut config.layout);

    changed |= normalize_trimmed(&mut config.export.dir);
    changed |= normalize_non_empty_string(
        &mut config.export.installer_server_url,
        default_installer_server_url(),
    );

    changed |= normalize_non_empty_string(&mut config.logging.file_name, default_log_file_name());
    changed |= normalize_non_empty_string(&mut config.logging.filter, default_log_filter());

    Ok(changed)
}

fn normalize_layout_config(config: &mut LayoutConfigToml) -> bool {
    let mut changed = false;

    let normalized_breakpoint = config.compact_breakpoint_px.clamp(320, 4096);
    if normalized_breakpoint != config.compact_breakpoint_px {
        config.compact_breakpoint_px = normalized_breakpoint;
        changed = true;
    }

    let normalized_width = if config.viewport_width_px == 0 {
        default_viewport_width_px()
    } else {
        config.viewport_width_px.clamp(240, 7680)
    };
    if normalized_width != config.viewport_width_px {
        config.viewport_width_px = normalized_width;
        changed = true;
    }

    changed
}

fn normalize_client_selection(value: &mut String) -> Result<bool, ConfigError> {
    let normalized = value.trim().to_ascii_lowercase();
    let canonical = if normalized.is_empty() {
        DEFAULT_ENTITY_CLIENT.to_owned()
    } else {
        normalized
    };

    if !canonical.starts_with("entities.") {
        return Err(ConfigError::configuration(format!(
            "Invalid `entities.client` value '{canonical}' in OUTPOST_CONFIG: client keys must be namespaced under `entities.*` (for example `{DEFAULT_ENTITY_CLIENT}`)."
        )));
    }
    let suffix = canonical["entities.".len()..].trim();
    if suffix.is_empty()
        || !suffix
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-')
    {
        return Err(ConfigError::configuration(format!(
            "Invalid `entities.client` value '{canonical}' in OUTPOST_CONFIG: expected format `entities.<client_key>` using lowercase letters, digits, `_`, or `-`."
        )));
    }

    if *value != canonical {
        *value = canonical;
        return Ok(true);
    }

    Ok(false)
}

fn normalize_non_empty_string(value: &mut String, default: String) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        if *value != default {
            *value = default;
            return true;
        }
        return false;
    }

    if trimmed != value {
        *value = trimmed.to_owned();
        return true;
    }
    false
}

fn normalize_trimmed(value: &mut String) -> bool {
    let trimmed = value.trim();
    if trimmed != value {
        *value = trimmed.to_owned();
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn with_env_vars<F>(vars: &[(&str, Option<&str>)], test: F)
    where
        F: FnOnce(),
    {
        let _guard = env_lock().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let backup = vars
            .iter()
            .map(|(name, _)| ((*name).to_owned(), std::env::var(name).ok()))
            .collect::<Vec<_>>();

        for (name, value) in vars {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }

        test();

        for (name, value) in backup {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "outpost-config-{prefix}-{nanos}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).expect("create temp dir");
        path
    }

    fn remove_temp_path(path: &Path) {
        let _ = std::fs::remove_dir_all(path);
    }

    fn write_config_file(path: &Path, raw: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture config parent");
        }
        std::fs::write(path, raw.as_bytes()).expect("write fixture config");
    }

    #[test]
    fn load_from_env_creates_default_config_when_missing() {
        let home = unique_temp_dir("home-defaults");
        let expected = home.join(".config").join("outpost").join("config.toml");

        with_env_vars(
            &[
                ("HOME", Some(home.to_str().expect("home path"))),
                ("USERPROFILE", None),
                (ENV_OUTPOST_CONFIG, None),
                ("XDG_DATA_HOME", None),
            ],
            || {
                let config = load_from_env().expect("load defaults");
                assert_eq!(config.entities.client, "entities.memory");
                assert_eq!(config.layout.compact_breakpoint_px, 768);
                assert_eq!(config.entities.default_sort, "-updated_at");
                assert!(expected.exists());
            },
        );

        remove_temp_path(&home);
    }

    #[test]
    fn load_from_env_treats_blank_outpost_config_as_unset() {
        let home = unique_temp_dir("home-blank-path");
        let expected = home.join(".config").join("outpost").join("config.toml");

        with_env_vars(
            &[
                ("HOME", Some(home.to_str().expect("home path"))),
                ("USERPROFILE", None),
                (ENV_OUTPOST_CONFIG, Some("  ")),
            ],
            || {
                load_from_env().expect("load config from default path");
                assert!(expected.exists());
            },
        );

        remove_temp_path(&home);
    }

    #[test]
    fn load_from_path_normalizes_and_persists_changes() {
        let root = unique_temp_dir("normalize");
        let path = root.join("config.toml");
        write_config_file(
            &path,
            r#"
data_dir = "/var/lib/outpost"

[entities]
client = " Entities.Memory "
request_timeout_secs = 0
default_sort = "  "

[fixtures]
dir = "   "

[layout]
compact_breakpoint_px = 10
viewport_width_px = 0
"#,
        );

        let config = load_from_path(&path).expect("load config");
        assert_eq!(config.entities.client, "entities.memory");
        assert_eq!(config.entities.request_timeout_secs, 20);
        assert_eq!(config.entities.default_sort, "-updated_at");
        assert_eq!(config.fixtures.dir, None);
        assert_eq!(config.layout.compact_breakpoint_px, 320);
        assert_eq!(config.layout.viewport_width_px, 1280);
        assert_eq!(config.export_dir(), PathBuf::from("/var/lib/outpost/exports"));

        let persisted = std::fs::read_to_string(&path).expect("read persisted config");
        assert!(persisted.contains("client = \"entities.memory\""));

        remove_temp_path(&root);
    }

    #[test]
    fn load_from_path_rejects_unnamespaced_client() {
        let root = unique_temp_dir("bad-client");
        let path = root.join("config.toml");
        write_config_file(&path, "[entities]\nclient = \"rest\"\n");

        let error = load_from_path(&path).expect_err("reject bare client key");
        assert!(error.to_string().contains("namespaced under `entities.*`"));

        remove_temp_path(&root);
    }

    #[test]
    fn rest_client_requires_base_url() {
        let root = unique_temp_dir("rest-no-url");
        let path = root.join("config.toml");
        write_config_file(&path, "[entities]\nclient = \"entities.rest\"\n");

        let error = load_from_path(&path).expect_err("missing base url");
        assert!(error.to_string().contains("entities.base_url"));

        remove_temp_path(&root);
    }

    #[test]
    fn entity_api_key_reads_configured_variable() {
        let mut config = OutpostConfig::default();
        config.entities.api_key_env = "OUTPOST_TEST_ENTITY_KEY".to_owned();

        with_env_vars(&[("OUTPOST_TEST_ENTITY_KEY", Some(" abc123 "))], || {
            assert_eq!(config.entity_api_key().as_deref(), Some("abc123"));
        });
        with_env_vars(&[("OUTPOST_TEST_ENTITY_KEY", Some("   "))], || {
            assert_eq!(config.entity_api_key(), None);
        });
    }
}
