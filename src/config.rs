use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default FanMaker API root
pub const DEFAULT_BASE_URL: &str = "https://api.fanmaker.com/api/v2";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub identifiers: Identifiers,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

/// Host-app identifiers forwarded as request headers.
///
/// Every field is optional; unset identifiers produce no header.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Identifiers {
    pub user_id: Option<String>,
    pub member_id: Option<String>,
    pub student_id: Option<String>,
    pub ticketmaster_id: Option<String>,
    pub yinzid: Option<String>,
    pub push_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("fanmaker-data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ApiConfig {
    /// An SDK without an API key cannot authenticate any request
    pub fn is_initialized(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Join an endpoint path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Identifiers {
    /// Header name/value pairs for every configured identifier
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        [
            ("X-FanMaker-UserID", &self.user_id),
            ("X-Member-ID", &self.member_id),
            ("X-Student-ID", &self.student_id),
            ("X-Ticketmaster-ID", &self.ticketmaster_id),
            ("X-Yinzid", &self.yinzid),
            ("X-PushNotification-Token", &self.push_token),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }
}
