use serde::{Deserialize, Deserializer};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::altitude::GridLimits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid bind address '{0}'")]
    InvalidBind(String),
    #[error("Invalid limits: {0}")]
    InvalidLimits(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    pub tle: TleConfig,
    #[serde(default)]
    pub limits: GridLimits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct TleConfig {
    pub folder: PathBuf,
    #[serde(default = "default_source_tag")]
    pub source_tag: String,
    /// How often the folder is re-read, e.g. "15m". Never when absent.
    #[serde(default, deserialize_with = "deserialize_interval")]
    pub reload_interval: Option<Duration>,
}

fn default_source_tag() -> String {
    "local".to_string()
}

fn deserialize_interval<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(s) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let interval = humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)?;
    if interval.is_zero() {
        return Err(serde::de::Error::custom("reload_interval must be positive"));
    }
    Ok(Some(interval))
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.bind_addr()?;
        config.limits.validate().map_err(ConfigError::InvalidLimits)?;
        Ok(config)
    }

    /// `HOST` and `PORT` replace the parts of `web.bind`; `ALLOWED_ORIGINS`
    /// is a comma separated origin list.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let current = self.bind_addr()?;
        let host = lookup("HOST").unwrap_or_else(|| current.ip().to_string());
        let port = lookup("PORT").unwrap_or_else(|| current.port().to_string());
        if lookup("HOST").is_some() || lookup("PORT").is_some() {
            self.web.bind = format!("{}:{}", host, port);
            self.bind_addr()?;
        }

        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.web.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.web
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.web.bind.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = "tle:\n  folder: /var/lib/tle\n";

    #[test]
    fn defaults_fill_missing_sections() {
        let config = Config::from_str(MINIMAL).unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8000");
        assert_eq!(config.web.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.tle.source_tag, "local");
        assert_eq!(config.tle.reload_interval, None);
        assert_eq!(config.limits, GridLimits::default());
    }

    #[test]
    fn reads_full_file() {
        let yaml = r#"
web:
  bind: "127.0.0.1:9000"
  allowed_origins: ["https://a.example", "https://b.example"]
tle:
  folder: ./tle
  source_tag: celestrak
  reload_interval: 15m
limits:
  max_points: 500
  max_step_seconds: 600
"#;
        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.bind_addr().unwrap().port(), 9000);
        assert_eq!(config.web.allowed_origins.len(), 2);
        assert_eq!(config.tle.source_tag, "celestrak");
        assert_eq!(config.tle.reload_interval, Some(Duration::from_secs(900)));
        assert_eq!(config.limits.max_points, 500);
        assert_eq!(config.limits.max_step_seconds, 600);
    }

    #[test]
    fn partial_limits_keep_defaults() {
        let yaml = format!("{}limits:\n  max_points: 10\n", MINIMAL);
        let config = Config::from_str(&yaml).unwrap();
        assert_eq!(config.limits.max_points, 10);
        assert_eq!(config.limits.max_step_seconds, 3600);
    }

    #[test]
    fn rejects_bad_interval() {
        let yaml = "tle:\n  folder: /tmp\n  reload_interval: soon\n";
        assert!(matches!(Config::from_str(yaml), Err(ConfigError::Yaml(_))));
        let yaml = "tle:\n  folder: /tmp\n  reload_interval: 0s\n";
        assert!(matches!(Config::from_str(yaml), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn rejects_unusable_limits() {
        for limits in [
            "limits:\n  max_step_seconds: 0\n",
            "limits:\n  max_step_seconds: 9223372036854775807\n",
            "limits:\n  max_points: 0\n",
        ] {
            let yaml = format!("{}{}", MINIMAL, limits);
            assert!(
                matches!(Config::from_str(&yaml), Err(ConfigError::InvalidLimits(_))),
                "{}",
                limits
            );
        }
    }

    #[test]
    fn rejects_bad_bind() {
        let yaml = format!("{}web:\n  bind: nowhere\n", MINIMAL);
        assert!(matches!(
            Config::from_str(&yaml),
            Err(ConfigError::InvalidBind(_))
        ));
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8123"),
            ("ALLOWED_ORIGINS", "https://x.example, https://y.example,"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::from_str(MINIMAL).unwrap();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8123");
        assert_eq!(
            config.web.allowed_origins,
            vec!["https://x.example", "https://y.example"]
        );
    }

    #[test]
    fn env_without_overrides_leaves_config() {
        let mut config = Config::from_str(MINIMAL).unwrap();
        config.apply_env(|_| None).unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8000");
    }
}
