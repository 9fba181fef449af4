use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Directory backing the local key-value cache.
    pub cache_dir: PathBuf,
    /// How often the content stores re-read the cache.
    pub poll_interval: Duration,
    /// Round-trip budget for form submissions.
    pub submit_timeout: Duration,
    pub news_page_size: usize,
    pub reviews_page_size: usize,
    pub products_page_size: usize,
    pub gifts_page_size: usize,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./.wasui-cache"),
            poll_interval: Duration::from_millis(5000),
            submit_timeout: Duration::from_millis(10_000),
            news_page_size: 6,
            reviews_page_size: 6,
            products_page_size: 6,
            gifts_page_size: 6,
            event_bus_capacity: 256,
            log_level: "info".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            cache_dir: lookup("WASUI_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            poll_interval: Duration::from_millis(nonzero(
                &lookup,
                "WASUI_POLL_INTERVAL_MS",
                5000,
            )?),
            submit_timeout: Duration::from_millis(nonzero(
                &lookup,
                "WASUI_SUBMIT_TIMEOUT_MS",
                10_000,
            )?),
            news_page_size: nonzero(&lookup, "WASUI_NEWS_PAGE_SIZE", 6)?,
            reviews_page_size: nonzero(&lookup, "WASUI_REVIEWS_PAGE_SIZE", 6)?,
            products_page_size: nonzero(&lookup, "WASUI_PRODUCTS_PAGE_SIZE", 6)?,
            gifts_page_size: nonzero(&lookup, "WASUI_GIFTS_PAGE_SIZE", 6)?,
            event_bus_capacity: nonzero(&lookup, "WASUI_EVENT_BUS_CAPACITY", 256)?,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// Page sizes, intervals and channel capacities all break on zero.
fn nonzero<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Default + PartialEq,
{
    let value = parse_var(lookup, key, default)?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
        });
    }
    Ok(value)
}
