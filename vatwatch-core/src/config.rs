//! Configuration file management for vatwatch.
//!
//! Reads/writes `~/.vatwatch/config.yaml` with feed endpoints, poll
//! periods, dashboard listen address, and the default airport/airline.

use std::path::{Path, PathBuf};

use crate::types::{Result, VatwatchError};

pub const DEFAULT_FEED_URL: &str = "https://data.vatsim.net/v3/vatsim-data.json";
pub const DEFAULT_METAR_URL: &str = "https://metar.vatsim.net/metar.php";

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub feed: FeedConfig,
    pub dashboard: DashboardConfig,
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    pub url: String,
    pub metar_url: String,
    pub poll_secs: u64,
    pub weather_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultsConfig {
    pub airport: Option<String>,
    pub airline: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            feed: FeedConfig {
                url: DEFAULT_FEED_URL.into(),
                metar_url: DEFAULT_METAR_URL.into(),
                poll_secs: 60,
                weather_secs: 300,
            },
            dashboard: DashboardConfig {
                host: "127.0.0.1".into(),
                port: 8080,
            },
            defaults: DefaultsConfig::default(),
        }
    }
}

/// Get the config directory path (`~/.vatwatch/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".vatwatch")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.vatwatch/config.yaml`.
///
/// Returns default config if the file doesn't exist or can't be read.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_config(&text),
        Err(_) => Config::default(),
    }
}

/// Save config to `~/.vatwatch/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| VatwatchError::Config(e.to_string()))?;
    }
    std::fs::write(path, serialize_config(config))
        .map_err(|e| VatwatchError::Config(e.to_string()))
}

/// Parse simple YAML-like config text. Unknown keys are ignored and bad
/// values keep their defaults.
pub fn parse_config(text: &str) -> Config {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            current_section = val.is_empty().then(|| key.to_string());
            continue;
        }

        match (current_section.as_deref(), key) {
            (Some("feed"), "url") => {
                if let Some(v) = parse_string_value(val) {
                    config.feed.url = v;
                }
            }
            (Some("feed"), "metar_url") => {
                if let Some(v) = parse_string_value(val) {
                    config.feed.metar_url = v;
                }
            }
            (Some("feed"), "poll_secs") => {
                if let Some(v) = parse_secs(val) {
                    config.feed.poll_secs = v;
                }
            }
            (Some("feed"), "weather_secs") => {
                if let Some(v) = parse_secs(val) {
                    config.feed.weather_secs = v;
                }
            }
            (Some("dashboard"), "host") => {
                if let Some(v) = parse_string_value(val) {
                    config.dashboard.host = v;
                }
            }
            (Some("dashboard"), "port") => {
                if let Ok(v) = val.parse::<u16>() {
                    config.dashboard.port = v;
                }
            }
            (Some("defaults"), "airport") => {
                config.defaults.airport = parse_string_value(val).map(|v| v.to_ascii_uppercase())
            }
            (Some("defaults"), "airline") => {
                config.defaults.airline = parse_string_value(val).map(|v| v.to_ascii_uppercase())
            }
            _ => {}
        }
    }

    config
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

/// Poll periods must be at least one second.
fn parse_secs(val: &str) -> Option<u64> {
    val.parse::<u64>().ok().filter(|&v| v > 0)
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# vatwatch configuration".to_string(), String::new()];

    lines.push("feed:".into());
    lines.push(format!("  url: \"{}\"", config.feed.url));
    lines.push(format!("  metar_url: \"{}\"", config.feed.metar_url));
    lines.push(format!("  poll_secs: {}", config.feed.poll_secs));
    lines.push(format!("  weather_secs: {}", config.feed.weather_secs));
    lines.push(String::new());

    lines.push("dashboard:".into());
    lines.push(format!("  host: \"{}\"", config.dashboard.host));
    lines.push(format!("  port: {}", config.dashboard.port));
    lines.push(String::new());

    lines.push("defaults:".into());
    for (key, value) in [
        ("airport", &config.defaults.airport),
        ("airline", &config.defaults.airline),
    ] {
        match value {
            Some(v) => lines.push(format!("  {key}: \"{v}\"")),
            None => lines.push(format!("  {key}: null")),
        }
    }

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed.poll_secs, 60);
        assert_eq!(config.feed.weather_secs, 300);
        assert_eq!(config.dashboard.port, 8080);
        assert!(config.defaults.airport.is_none());
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
feed:
  url: "http://localhost:9000/feed.json"
  metar_url: 'http://localhost:9000/metar'
  poll_secs: 15
  weather_secs: 120

dashboard:
  host: "0.0.0.0"
  port: 9090

defaults:
  airport: klax
  airline: "baw"
"#;
        let config = parse_config(text);
        assert_eq!(config.feed.url, "http://localhost:9000/feed.json");
        assert_eq!(config.feed.metar_url, "http://localhost:9000/metar");
        assert_eq!(config.feed.poll_secs, 15);
        assert_eq!(config.feed.weather_secs, 120);
        assert_eq!(config.dashboard.host, "0.0.0.0");
        assert_eq!(config.dashboard.port, 9090);
        assert_eq!(config.defaults.airport.as_deref(), Some("KLAX"));
        assert_eq!(config.defaults.airline.as_deref(), Some("BAW"));
    }

    #[test]
    fn test_parse_config_null_and_bad_values() {
        let text = r#"
feed:
  poll_secs: 0
  weather_secs: soon

dashboard:
  port: 99999

defaults:
  airport: null
  airline: ~
"#;
        let config = parse_config(text);
        assert_eq!(config.feed.poll_secs, 60);
        assert_eq!(config.feed.weather_secs, 300);
        assert_eq!(config.dashboard.port, 8080);
        assert!(config.defaults.airport.is_none());
        assert!(config.defaults.airline.is_none());
    }

    #[test]
    fn test_keys_outside_section_ignored() {
        let config = parse_config("port: 1234\n  port: 4321\n");
        assert_eq!(config.dashboard.port, 8080);
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.feed.poll_secs = 30;
        config.dashboard.host = "0.0.0.0".into();
        config.defaults.airport = Some("EGLL".into());

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config_from(&dir.path().join("nope.yaml")), Config::default());
    }
}
