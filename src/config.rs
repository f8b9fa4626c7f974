//! Environment-driven configuration
//!
//! Values come from `BULLION_*` environment variables. Before reading them,
//! the first `.bullion_desk_env` file found in the current directory, the
//! home directory or the data directory is loaded into the environment.

use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const ENV_FILE_NAME: &str = ".bullion_desk_env";

const DEFAULT_DATA_DIR_NAME: &str = "bullion-desk";
const DEFAULT_DB_FILE: &str = "bullion-desk.db";
const DEFAULT_LOG_FILE: &str = "bullion-desk.log";
const DEFAULT_FEED_URL: &str = "https://rest.altinkaynak.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Payload format of the price feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Json,
    Xml,
}

impl FeedFormat {
    fn default_metals_path(&self) -> &'static str {
        match self {
            FeedFormat::Json => "Gold.json",
            FeedFormat::Xml => "Gold.xml",
        }
    }

    fn default_currencies_path(&self) -> &'static str {
        match self {
            FeedFormat::Json => "Currency.json",
            FeedFormat::Xml => "Currency.xml",
        }
    }
}

impl FromStr for FeedFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(FeedFormat::Json),
            "xml" => Ok(FeedFormat::Xml),
            other => Err(AppError::Config(format!(
                "BULLION_FEED_FORMAT must be 'json' or 'xml', got '{}'",
                other
            ))),
        }
    }
}

/// Price feed settings
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub format: FeedFormat,
    /// Always ends with '/', so catalog paths join beneath it
    pub base_url: Url,
    pub metals_path: String,
    pub currencies_path: String,
    pub timeout: Duration,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub feed: FeedConfig,
    pub refresh_interval: Duration,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        let home = std::env::var_os("HOME").map(PathBuf::from);

        if let Some(env_file) = Self::find_env_file(home.as_deref()) {
            dotenvy::from_path(&env_file).map_err(|e| {
                AppError::Config(format!("Failed to load {}: {}", env_file.display(), e))
            })?;
        }

        Self::from_lookup(home.as_deref(), |key| std::env::var(key).ok())
    }

    /// Locate the env file: current directory, home directory, data directory
    fn find_env_file(home: Option<&Path>) -> Option<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(ENV_FILE_NAME));
        }
        if let Some(home) = home {
            candidates.push(home.join(ENV_FILE_NAME));
        }
        if let Ok(data_dir) = Self::resolve_data_dir(home, |key| std::env::var(key).ok()) {
            candidates.push(data_dir.join(ENV_FILE_NAME));
        }

        candidates.into_iter().find(|path| path.is_file())
    }

    fn resolve_data_dir<F>(home: Option<&Path>, lookup: F) -> Result<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        match non_empty(&lookup, "BULLION_DATA_DIR") {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => home
                .map(|home| home.join(DEFAULT_DATA_DIR_NAME))
                .ok_or_else(|| {
                    AppError::Config(
                        "Neither BULLION_DATA_DIR nor HOME is set; cannot choose a data directory"
                            .to_string(),
                    )
                }),
        }
    }

    /// Build configuration from a variable lookup
    pub fn from_lookup<F>(home: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = Self::resolve_data_dir(home, &lookup)?;

        let db_path = non_empty(&lookup, "BULLION_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DEFAULT_DB_FILE));
        let log_path = non_empty(&lookup, "BULLION_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DEFAULT_LOG_FILE));

        let format = match non_empty(&lookup, "BULLION_FEED_FORMAT") {
            Some(value) => value.parse()?,
            None => FeedFormat::Json,
        };

        let base_url = parse_base_url(
            &non_empty(&lookup, "BULLION_FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
        )?;

        let metals_path = non_empty(&lookup, "BULLION_FEED_METALS_PATH")
            .unwrap_or_else(|| format.default_metals_path().to_string());
        let currencies_path = non_empty(&lookup, "BULLION_FEED_CURRENCIES_PATH")
            .unwrap_or_else(|| format.default_currencies_path().to_string());

        let timeout = parse_seconds(&lookup, "BULLION_FEED_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let refresh_interval = parse_seconds(
            &lookup,
            "BULLION_REFRESH_INTERVAL_SECS",
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;

        Ok(Self {
            data_dir,
            db_path,
            log_path,
            feed: FeedConfig {
                format,
                base_url,
                metals_path,
                currencies_path,
                timeout,
            },
            refresh_interval,
        })
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| AppError::Config(format!("Invalid BULLION_FEED_URL '{}': {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Config(format!(
            "BULLION_FEED_URL must be http or https, got '{}'",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

fn parse_seconds<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match non_empty(lookup, key) {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| AppError::Config(format!("{} must be a whole number of seconds, got '{}'", key, value)))?,
        None => default,
    };

    if secs == 0 {
        return Err(AppError::Config(format!("{} must be greater than zero", key)));
    }

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(Some(Path::new("/home/tester")), |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/home/tester/bullion-desk"));
        assert_eq!(config.db_path, PathBuf::from("/home/tester/bullion-desk/bullion-desk.db"));
        assert_eq!(config.log_path, PathBuf::from("/home/tester/bullion-desk/bullion-desk.log"));
        assert_eq!(config.feed.format, FeedFormat::Json);
        assert_eq!(config.feed.base_url.as_str(), "https://rest.altinkaynak.com/");
        assert_eq!(config.feed.metals_path, "Gold.json");
        assert_eq!(config.feed.currencies_path, "Currency.json");
        assert_eq!(config.feed.timeout, Duration::from_secs(30));
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BULLION_DATA_DIR", "/srv/desk"),
            ("BULLION_FEED_FORMAT", "XML"),
            ("BULLION_FEED_URL", "http://localhost:8080/rates"),
            ("BULLION_FEED_TIMEOUT_SECS", "5"),
            ("BULLION_REFRESH_INTERVAL_SECS", "60"),
        ])
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/srv/desk/bullion-desk.db"));
        assert_eq!(config.feed.format, FeedFormat::Xml);
        assert_eq!(config.feed.metals_path, "Gold.xml");
        assert_eq!(config.feed.base_url.as_str(), "http://localhost:8080/rates/");
        assert_eq!(config.feed.timeout, Duration::from_secs(5));
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("BULLION_FEED_FORMAT", "  "), ("BULLION_DB_PATH", "")]).unwrap();
        assert_eq!(config.feed.format, FeedFormat::Json);
        assert_eq!(config.db_path, PathBuf::from("/home/tester/bullion-desk/bullion-desk.db"));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for vars in [
            vec![("BULLION_FEED_URL", "not a url")],
            vec![("BULLION_FEED_URL", "ftp://rates.example.com")],
            vec![("BULLION_FEED_FORMAT", "csv")],
            vec![("BULLION_FEED_TIMEOUT_SECS", "soon")],
            vec![("BULLION_REFRESH_INTERVAL_SECS", "0")],
        ] {
            assert!(
                matches!(config_from(&vars), Err(AppError::Config(_))),
                "expected config error for {:?}",
                vars
            );
        }
    }

    #[test]
    fn test_missing_home_without_data_dir() {
        let result = AppConfig::from_lookup(None, |_| None);
        assert!(matches!(result, Err(AppError::Config(_))));

        let config = AppConfig::from_lookup(None, |key| {
            (key == "BULLION_DATA_DIR").then(|| "/data".to_string())
        })
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data"));
    }
}
