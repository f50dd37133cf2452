use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SignozError};

pub const QUERY_RANGE_PATH: &str = "/api/v4/query_range";

#[derive(Clone, PartialEq)]
pub struct Config {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            timeout: Duration::from_secs(20),
            user_agent: format!("signoz-mcp/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides();
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    /// Full `query_range` URL. Fails when the base URL or API key is missing.
    pub fn query_range_url(&self) -> Result<String> {
        self.require_credentials()?;
        let base = self.base_url.as_deref().unwrap_or_default();
        Ok(format!("{}{QUERY_RANGE_PATH}", base.trim_end_matches('/')))
    }

    pub fn require_credentials(&self) -> Result<()> {
        let missing = [
            ("SIGNOZ_API_BASE_URL", self.base_url.as_deref()),
            ("SIGNOZ_API_KEY", self.api_key.as_deref()),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none_or(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SignozError::Config(format!(
                "{} not set (config file: {})",
                missing.join(" and "),
                config_file_path().display()
            )))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout: Option<String>,
    user_agent: Option<String>,
}

pub fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("SIGNOZ_MCP_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("signoz-mcp/config.toml")
}

fn load_file_overrides(path: &Path) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| SignozError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| SignozError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> ConfigOverrides {
    ConfigOverrides {
        base_url: env::var("SIGNOZ_API_BASE_URL").ok(),
        api_key: env::var("SIGNOZ_API_KEY").ok(),
        timeout: env::var("SIGNOZ_TIMEOUT").ok(),
        user_agent: None,
    }
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.base_url {
        cfg.base_url = Some(v);
    }
    if let Some(v) = overrides.api_key {
        cfg.api_key = Some(v);
    }
    if let Some(v) = overrides.timeout {
        cfg.timeout = humantime::parse_duration(&v).map_err(|e| {
            SignozError::Config(format!("bad timeout in {source}: {e} (value={v})"))
        })?;
    }
    if let Some(v) = overrides.user_agent {
        cfg.user_agent = v;
    }
    Ok(())
}
