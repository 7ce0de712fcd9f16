use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{ApiKey, BaseUrl, BaseUrlError};

const DEFAULT_CONFIG_PATH: &str = "dashboard.yml";
const API_BASE_URL_ENV: &str = "FORGEIQ_API_BASE_URL";
const API_KEY_ENV: &str = "FORGEIQ_API_KEY";
const REQUEST_TIMEOUT_ENV: &str = "FORGEIQ_REQUEST_TIMEOUT_S";
const REFRESH_INTERVAL_ENV: &str = "FORGEIQ_REFRESH_INTERVAL_S";
const DEFAULT_REQUEST_TIMEOUT_S: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FORGEIQ_API_BASE_URL is not set and dashboard.yml has no api_base_url")]
    MissingBaseUrl,
    #[error("invalid backend base address: {0}")]
    InvalidBaseUrl(#[from] BaseUrlError),
    #[error("failed to parse {name}")]
    InvalidValue { name: &'static str },
    #[error("could not read {name} from env")]
    Unreadable { name: &'static str },
    #[error("failed to read config file: {0}")]
    Source(#[from] config::ConfigError),
    #[error("failed to build the HTTP client: {0}")]
    ClientBuild(String),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: BaseUrl,
    pub api_key: Option<ApiKey>,
    pub request_timeout: Duration,
    /// Set when the dashboard should keep refreshing instead of loading once.
    pub refresh_interval: Option<Duration>,
}

/// Values found in the optional settings file.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_s: Option<u64>,
    pub refresh_interval_s: Option<u64>,
}

/// Values found in the process environment.
#[derive(Debug, Default)]
pub struct EnvConfig {
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_s: Option<u64>,
    pub refresh_interval_s: Option<u64>,
}

fn load_file_config() -> Result<FileConfig, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_PATH).required(false))
        .build()?;

    Ok(settings.try_deserialize::<FileConfig>()?)
}

/// Try to parse env variable. If it's not set, return None. If it's invalid, treat it as an error.
fn try_from_env<T, F>(env_var: &'static str, f: F) -> Result<Option<T>, ConfigError>
where
    F: FnOnce(String) -> Option<T>,
{
    match std::env::var(env_var) {
        Ok(raw) => {
            let val = f(raw).ok_or(ConfigError::InvalidValue { name: env_var })?;
            Ok(Some(val))
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(_) => Err(ConfigError::Unreadable { name: env_var }),
    }
}

fn load_env_config() -> Result<EnvConfig, ConfigError> {
    Ok(EnvConfig {
        api_base_url: try_from_env(API_BASE_URL_ENV, Some)?,
        api_key: try_from_env(API_KEY_ENV, Some)?,
        request_timeout_s: try_from_env(REQUEST_TIMEOUT_ENV, |raw| raw.trim().parse().ok())?,
        refresh_interval_s: try_from_env(REFRESH_INTERVAL_ENV, |raw| raw.trim().parse().ok())?,
    })
}

impl Settings {
    /// Merges env over file values. A missing base address is fatal; there is no local default.
    pub fn resolve(env: EnvConfig, file: FileConfig) -> Result<Settings, ConfigError> {
        let raw_base_url = match env.api_base_url {
            Some(val) => val,
            None => {
                let val = file.api_base_url.ok_or(ConfigError::MissingBaseUrl)?;
                tracing::warn!("{API_BASE_URL_ENV} is not set, using value from {DEFAULT_CONFIG_PATH}");
                val
            }
        };
        let api_base_url = BaseUrl::try_from(raw_base_url)?;

        let api_key = env.api_key.or(file.api_key).and_then(ApiKey::new);

        let timeout_s = env
            .request_timeout_s
            .or(file.request_timeout_s)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_S);
        if timeout_s == 0 {
            return Err(ConfigError::InvalidValue {
                name: REQUEST_TIMEOUT_ENV,
            });
        }

        let refresh_interval = match env.refresh_interval_s.or(file.refresh_interval_s) {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    name: REFRESH_INTERVAL_ENV,
                });
            }
            other => other.map(Duration::from_secs),
        };

        Ok(Settings {
            api_base_url,
            api_key,
            request_timeout: Duration::from_secs(timeout_s),
            refresh_interval,
        })
    }
}

/// Load configuration from env with fallback to the optional settings file.
pub fn load() -> Result<Settings, ConfigError> {
    let env = load_env_config()?;
    let file = load_file_config()?;

    let settings = Settings::resolve(env, file)?;
    tracing::info!(
        base_url = %settings.api_base_url,
        authenticated = settings.api_key.is_some(),
        "configuration loaded"
    );
    Ok(settings)
}
