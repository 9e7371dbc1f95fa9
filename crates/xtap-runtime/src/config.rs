use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "XTAP_PATH";
pub const CONFIG_FILE: &str = "config.toml";
pub const DATABASE_FILE: &str = "xtap.db";

/// Resolve the data directory based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. XTAP_PATH environment variable (with tilde expansion)
/// 3. Platform data directory
/// 4. ~/.xtap (fallback for systems without one)
pub fn resolve_workspace_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var(DATA_DIR_ENV) {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("xtap"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".xtap"));
    }

    Err(Error::Config(
        "Could not determine data directory: no HOME directory or platform data directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Cookie sub-keys that must all be present before a composite is stored
    pub required_cookies: Vec<String>,
    /// Sub-key refreshed through `set-cookie` and merged into the composite
    pub rotating_cookie: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            required_cookies: vec!["auth_token".into(), "ct0".into(), "gt".into()],
            rotating_cookie: "gt".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// URL markers of responses decoded as home timelines
    pub endpoints: Vec<String>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["HomeTimeline".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// URL substring selecting assistant calls
    pub url_filter: String,
    pub status: u16,
    pub feature_flags: Vec<String>,
    /// URL marker of the explore sidebar response
    pub explore_endpoint: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            url_filter: "grok".to_string(),
            status: 200,
            feature_flags: vec![
                "grok_analyze_button_fetch_trends_enabled".into(),
                "grok_analyze_post_followups_enabled".into(),
                "grok_share_attachment_enabled".into(),
                "grok_image_annotation_enabled".into(),
            ],
            explore_endpoint: "ExploreSidebar".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Verbose capture logging (decoded posts, harvested credentials)
    pub debug: bool,
    /// Database location; `<data dir>/xtap.db` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    pub harvest: HarvestConfig,
    pub timeline: TimelineConfig,
    pub flows: FlowConfig,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(resolve_workspace_path(None)?.join(CONFIG_FILE))
    }

    /// Database path, relative entries resolved against `data_dir`
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        match &self.database {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => data_dir.join(path),
            None => data_dir.join(DATABASE_FILE),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.harvest.rotating_cookie.trim().is_empty() {
            return Err(Error::Config(
                "harvest.rotating_cookie must not be empty".to_string(),
            ));
        }
        if self.flows.url_filter.is_empty() {
            return Err(Error::Config("flows.url_filter must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(!config.debug);
        assert_eq!(config.harvest.required_cookies, vec!["auth_token", "ct0", "gt"]);
        assert_eq!(config.harvest.rotating_cookie, "gt");
        assert_eq!(config.timeline.endpoints, vec!["HomeTimeline"]);
        assert_eq!(config.flows.status, 200);
        assert_eq!(config.flows.feature_flags.len(), 4);
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = Config::default();
        config.debug = true;
        config.timeline.endpoints.push("HomeLatestTimeline".to_string());

        config.save_to(&config_path)?;
        assert!(config_path.exists());

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join(CONFIG_FILE);
        std::fs::write(&config_path, "[flows]\nurl_filter = \"assistant\"\n")?;

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded.flows.url_filter, "assistant");
        assert_eq!(loaded.flows.status, 200);
        assert_eq!(loaded.harvest, HarvestConfig::default());
        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join(CONFIG_FILE);

        std::fs::write(&config_path, "[harvest]\nrotating_cookie = \"\"\n")?;
        assert!(matches!(Config::load_from(&config_path), Err(Error::Config(_))));

        std::fs::write(&config_path, "debug = \"yes\"\n")?;
        assert!(matches!(Config::load_from(&config_path), Err(Error::Config(_))));
        Ok(())
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::load_from(&temp_dir.path().join("missing.toml"))?;
        assert_eq!(config, Config::default());
        Ok(())
    }

    #[test]
    fn test_database_path() {
        let data_dir = Path::new("/data/xtap");
        let mut config = Config::default();
        assert_eq!(config.database_path(data_dir), data_dir.join(DATABASE_FILE));

        config.database = Some(PathBuf::from("captures/main.db"));
        assert_eq!(config.database_path(data_dir), data_dir.join("captures/main.db"));

        config.database = Some(PathBuf::from("/var/lib/xtap.db"));
        assert_eq!(config.database_path(data_dir), PathBuf::from("/var/lib/xtap.db"));
    }

    #[test]
    fn test_explicit_workspace_path_wins() -> Result<()> {
        assert_eq!(
            resolve_workspace_path(Some("/tmp/xtap-explicit"))?,
            PathBuf::from("/tmp/xtap-explicit")
        );
        Ok(())
    }
}
