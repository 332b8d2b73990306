use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};

use liverlens_core::field::FieldRegistry;
use liverlens_store::client::StoreClient;
use liverlens_view::pipeline::ViewContext;
use liverlens_view::predicate::CompileOptions;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
pub const CURRENT_VERSION: u32 = 1;

const FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    /// Root of the Record Store Service.
    pub base_url: String,
    pub page_size: usize,
    /// Quiet period before a filter edit is dispatched.
    pub debounce_ms: u64,
    /// IANA zone that decides where a day starts for date filters. Added in
    /// v1.
    pub time_zone: String,
    pub request_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            base_url: "http://localhost:5001".to_string(),
            page_size: 10,
            debounce_ms: 500,
            time_zone: "UTC".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl EngineConfig {
    pub fn time_zone(&self) -> eyre::Result<TimeZone> {
        let name = self.time_zone.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("utc") {
            return Ok(TimeZone::UTC);
        }
        TimeZone::get(name).map_err(|e| eyre::eyre!("unknown time zone {name:?}: {e}"))
    }

    pub fn compile_options(&self) -> eyre::Result<CompileOptions> {
        Ok(CompileOptions {
            time_zone: self.time_zone()?,
            now: None,
        })
    }

    pub fn view_context(&self, registry: FieldRegistry) -> eyre::Result<Arc<ViewContext>> {
        Ok(Arc::new(ViewContext::new(registry, self.compile_options()?)))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn store_client(&self) -> eyre::Result<StoreClient> {
        StoreClient::new(&self.base_url, self.request_timeout())
            .map_err(|e| eyre::eyre!("invalid record store URL {}: {e}", self.base_url))
    }
}

pub fn config_dir() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("liverlens"))
}

pub fn config_path() -> eyre::Result<PathBuf> {
    Ok(config_dir()?.join(FILE_NAME))
}

/// Load from the platform config dir, or defaults if nothing is saved.
pub fn load_config() -> eyre::Result<EngineConfig> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> eyre::Result<EngineConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(EngineConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: EngineConfig = serde_json::from_value(migrated)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION})"
        ));
    }

    // v0 → v1: date filters became zone-aware
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        obj.entry("time_zone")
            .or_insert(serde_json::Value::String("UTC".to_string()));
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (added time_zone)");
    }

    Ok(json)
}

pub fn save_config(config: &EngineConfig) -> eyre::Result<PathBuf> {
    save_config_to(&config_dir()?, config)
}

/// Write `config.json` into `dir` atomically. Returns the file path.
pub fn save_config_to(dir: &Path, config: &EngineConfig) -> eyre::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;

    let path = dir.join(FILE_NAME);
    let json = serde_json::to_string_pretty(&stamped)?;

    let tmp_path = dir.join("config.json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, &path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(path)
}

pub fn delete_config() -> eyre::Result<()> {
    delete_config_at(&config_path()?)
}

pub fn delete_config_at(path: &Path) -> eyre::Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
        tracing::info!(path = %path.display(), "config deleted");
    }
    Ok(())
}
