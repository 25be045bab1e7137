use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::domain::ApiLayout;
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "plagcheck.toml";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_LOGOUT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    pub layout: ApiLayout,
    pub request_timeout: Duration,
    pub logout_delay: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::for_layout(ApiLayout::default())
    }
}

impl ClientSettings {
    pub fn for_layout(layout: ApiLayout) -> Self {
        Self {
            base_url: layout.default_base_url().into(),
            layout,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            logout_delay: DEFAULT_LOGOUT_DELAY,
        }
    }
}

/// One layer of settings. Later layers win field by field.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsOverrides {
    pub base_url: Option<String>,
    pub layout: Option<ApiLayout>,
    pub request_timeout_secs: Option<u64>,
    pub logout_delay_ms: Option<u64>,
}

impl SettingsOverrides {
    pub fn merge(self, later: SettingsOverrides) -> SettingsOverrides {
        SettingsOverrides {
            base_url: later.base_url.or(self.base_url),
            layout: later.layout.or(self.layout),
            request_timeout_secs: later.request_timeout_secs.or(self.request_timeout_secs),
            logout_delay_ms: later.logout_delay_ms.or(self.logout_delay_ms),
        }
    }

    /// The base url falls back to the chosen layout's default when unset.
    /// A zero request timeout would fail every request and is refused.
    pub fn resolve(self) -> Result<ClientSettings, ConfigError> {
        let mut settings = ClientSettings::for_layout(self.layout.unwrap_or_default());
        if let Some(base_url) = self.base_url {
            settings.base_url = base_url.trim().trim_end_matches('/').to_string();
        }
        match self.request_timeout_secs {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "request_timeout_secs",
                    value: "0".to_string(),
                })
            }
            Some(secs) => settings.request_timeout = Duration::from_secs(secs),
            None => {}
        }
        if let Some(ms) = self.logout_delay_ms {
            settings.logout_delay = Duration::from_millis(ms);
        }
        Ok(settings)
    }
}

pub fn read_settings_file(path: &Path) -> Result<SettingsOverrides, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Reads `APP__*` variables, with the shorter `PLAGCHECK_*` names as fallback.
pub fn env_overrides<F>(lookup: F) -> Result<SettingsOverrides, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |primary: &str, fallback: &str| lookup(primary).or_else(|| lookup(fallback));

    let layout = match read("APP__API_LAYOUT", "PLAGCHECK_API_LAYOUT") {
        Some(v) => Some(v.parse::<ApiLayout>().map_err(|_| ConfigError::InvalidValue {
            key: "APP__API_LAYOUT",
            value: v,
        })?),
        None => None,
    };

    Ok(SettingsOverrides {
        base_url: read("APP__BASE_URL", "PLAGCHECK_BASE_URL"),
        layout,
        request_timeout_secs: parse_number(
            "APP__REQUEST_TIMEOUT_SECS",
            read("APP__REQUEST_TIMEOUT_SECS", "PLAGCHECK_REQUEST_TIMEOUT_SECS"),
        )?,
        logout_delay_ms: parse_number(
            "APP__LOGOUT_DELAY_MS",
            read("APP__LOGOUT_DELAY_MS", "PLAGCHECK_LOGOUT_DELAY_MS"),
        )?,
    })
}

fn parse_number(key: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue { key, value })
    })
    .transpose()
}

/// Defaults, then the settings file, then the process environment.
///
/// An explicitly named file must exist; the default `plagcheck.toml` is
/// optional.
pub fn load_settings(path: Option<&Path>) -> Result<SettingsOverrides, ConfigError> {
    let file = match path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_SETTINGS_FILE);
            if default_path.exists() {
                read_settings_file(default_path)?
            } else {
                SettingsOverrides::default()
            }
        }
    };
    let env = env_overrides(|key| std::env::var(key).ok())?;
    Ok(file.merge(env))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
