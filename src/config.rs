use log::LevelFilter;
use reqwest::Url;
use serde::Deserialize;
use std::{
    env,
    fmt::Debug,
    fs::read_to_string,
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::Path,
    time::Duration,
};
use thiserror::Error;

/// Environment variable key to load the config from
const CONFIG_ENV_KEY: &str = "SENSOR_RELAY_CONFIG_JSON";
/// Config file checked when the env config is not set
const CONFIG_FILE: &str = "config.json";
/// Environment variable overriding the port to bind
const PORT_ENV_KEY: &str = "PORT";
/// Environment variable containing the store endpoint URL
const STORE_URL_ENV_KEY: &str = "SUPABASE_URL";
/// Environment variable containing the store access key
const STORE_KEY_ENV_KEY: &str = "SUPABASE_KEY";

/// Errors that prevent the server from starting
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing required environment variable {0}")]
    MissingVariable(&'static str),
    #[error("Invalid store URL: {0}")]
    InvalidStoreUrl(String),
    #[error("Store access key contains characters not allowed in a header")]
    InvalidStoreKey,
    #[error("Invalid port: {0}")]
    InvalidPort(String),
    #[error("Invalid CORS origin: {0}")]
    InvalidOrigin(String),
    #[error("Failed to read config file: {0}")]
    ReadFile(#[from] io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to create store client: {0}")]
    StoreClient(#[from] reqwest::Error),
}

/// Loads the config from the process environment and the config
/// file in the working directory
pub fn load_config() -> Result<Config, ConfigurationError> {
    load_config_from(|key| env::var(key).ok(), Path::new(CONFIG_FILE))
}

/// Loads the config using the provided variable lookup, the JSON config
/// is taken from the env if present otherwise from `file` when it exists
pub fn load_config_from<F>(lookup: F, file: &Path) -> Result<Config, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = match lookup(CONFIG_ENV_KEY) {
        Some(value) => serde_json::from_str(&value)?,
        None => {
            if file.exists() {
                let data = read_to_string(file)?;
                serde_json::from_str(&data)?
            } else {
                Config::default()
            }
        }
    };

    if let Some(port) = lookup(PORT_ENV_KEY) {
        config.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigurationError::InvalidPort(port))?;
    }

    Ok(config)
}

pub type Port = u16;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: IpAddr,
    pub port: Port,
    /// Whether the server is behind a reverse proxy, forwarding headers
    /// are only trusted when this is enabled
    pub reverse_proxy: bool,
    pub logging: LevelFilter,
    pub cors: CorsConfig,
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            reverse_proxy: false,
            logging: LevelFilter::Info,
            cors: Default::default(),
            store: Default::default(),
        }
    }
}

impl Config {
    /// Address the HTTP server binds to
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Cross-origin policy for the API
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the API, when empty all
    /// origins are allowed
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Timeout applied to each store request, when not set the
    /// store client never times out requests itself
    pub timeout_secs: Option<u64>,
}

impl StoreConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Connection details for the store, these are only ever
/// sourced from the environment
pub struct StoreCredentials {
    /// Base URL of the hosted store
    pub url: Url,
    /// Access key sent with every request
    pub key: String,
}

impl StoreCredentials {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigurationError::MissingVariable(key))
        };

        let url = required(STORE_URL_ENV_KEY)?;
        let key = required(STORE_KEY_ENV_KEY)?;

        let url = Url::parse(&url)
            .map_err(|err| ConfigurationError::InvalidStoreUrl(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigurationError::InvalidStoreUrl(format!(
                "unsupported scheme {}",
                url.scheme()
            )));
        }

        Ok(Self { url, key })
    }
}

impl Debug for StoreCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("url", &self.url.as_str())
            .field("key", &"<redacted>")
            .finish()
    }
}
