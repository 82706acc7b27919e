use anyhow::{Result, bail};
use clap::Parser;
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "numberlike")]
#[command(about = "Runs the numberlike service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".numberlike")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

/// Used when no config file is present: everything comes from the environment.
const DEFAULT_CONFIG: &str = r#"
store:
  addr: ${REDIS_ADDR}
  token: ${REDIS_TOKEN:-}
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for App {
    fn default() -> Self {
        App {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl App {
    pub fn get_host(&self) -> &str {
        &self.host
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub addr: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_tls")]
    pub tls: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_tls() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    2000
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connection URL for the store, with the credential URL-encoded.
    pub fn url(&self) -> String {
        let scheme = if self.tls { "rediss" } else { "redis" };
        match self.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => format!("{}://:{}@{}", scheme, urlencoding::encode(token), self.addr),
            None => format!("{}://{}", scheme, self.addr),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    pub store: StoreConfig,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    /// Loads `path` if given, else the default config file if it exists, else the
    /// environment-only defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Config::new(path);
        }

        let default_path = default_config_path();
        if default_path.exists() {
            tracing::info!(path = ?default_path, "loading default config file");
            return Config::new(&default_path.to_string_lossy());
        }

        tracing::info!("no config file found, reading store settings from environment");
        Config::from_yaml(DEFAULT_CONFIG)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.store.addr.trim().is_empty() {
            bail!("store.addr must not be empty (set REDIS_ADDR)");
        }
        if self.store.timeout_ms == 0 {
            bail!("store.timeout_ms must be greater than zero");
        }
        Ok(())
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(var = %var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_env_vars_with_default() {
        let out =
            Config::substitute_env_vars("a: ${NUMBERLIKE_SURELY_UNSET_VAR:-fallback}").unwrap();
        assert_eq!(out, "a: fallback");
    }

    #[test]
    fn test_substitute_env_vars_missing_is_empty() {
        let out = Config::substitute_env_vars("a: '${NUMBERLIKE_SURELY_UNSET_VAR_2}'").unwrap();
        assert_eq!(out, "a: ''");
    }

    #[test]
    fn test_from_yaml_defaults() {
        let cfg = Config::from_yaml("store:\n  addr: localhost:6379\n").unwrap();
        assert_eq!(cfg.app.get_port(), 3000);
        assert_eq!(cfg.app.get_host(), "0.0.0.0");
        assert!(cfg.store.tls);
        assert_eq!(cfg.store.timeout(), Duration::from_millis(2000));
        assert_eq!(cfg.store.url(), "rediss://localhost:6379");
    }

    #[test]
    fn test_from_yaml_rejects_empty_addr() {
        assert!(Config::from_yaml("store:\n  addr: ''\n").is_err());
    }

    #[test]
    fn test_from_yaml_rejects_zero_timeout() {
        assert!(Config::from_yaml("store:\n  addr: h:1\n  timeout_ms: 0\n").is_err());
    }

    #[test]
    fn test_url_encodes_token() {
        let store = StoreConfig {
            addr: "cache.example.com:6379".to_string(),
            token: Some("p@ss/word".to_string()),
            tls: false,
            timeout_ms: 100,
        };
        assert_eq!(store.url(), "redis://:p%40ss%2Fword@cache.example.com:6379");
    }
}
