use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_web_address")]
    pub address: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Extra static assets served under /static (map tiles, chart scripts)
    pub static_dir: Option<String>,
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_web_address(),
            port: default_web_port(),
            static_dir: None,
            max_upload_bytes: default_max_upload(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Utf8,
    /// DataCo exports are Latin-1
    #[default]
    Latin1,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ImportConfig {
    #[serde(default)]
    pub encoding: Encoding,
    /// CSV files imported once at startup
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Size of the top and bottom supplier lists
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Memoize the scoreboard per store snapshot
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            cache_enabled: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    #[serde(default = "default_horizon")]
    pub horizon_days: u32,
    /// Distinct order days needed before a trend is fitted
    #[serde(default = "default_min_history")]
    pub min_history_days: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon(),
            min_history_days: default_min_history(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_web_address() -> String { "0.0.0.0".to_string() }
fn default_web_port() -> u16 { 8000 }
fn default_max_upload() -> usize { 64 * 1024 * 1024 }
fn default_top_n() -> usize { 5 }
fn default_horizon() -> u32 { 30 }
fn default_min_history() -> usize { 2 }

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config '{}': {}", path, e))?;
        Ok(config)
    }
}
