//! Server configuration from environment variables.

use crate::app::resource_explorer::aggregator::DEFAULT_MAX_CONCURRENT_REGIONS;
use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    pub bind_addr: String,
    pub static_dir: PathBuf,
    pub cache_ttl: Duration,
    pub command_config_path: PathBuf,
    pub profile_store_path: PathBuf,
    pub aws_cli_path: PathBuf,
    pub max_concurrent_regions: usize,
    pub cli_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: "0.0.0.0".to_string(),
            static_dir: PathBuf::from("./static"),
            cache_ttl: Duration::from_secs(60),
            command_config_path: PathBuf::from("./command-config.json"),
            profile_store_path: PathBuf::from("./.aws-local-dashboard-profiles.json"),
            aws_cli_path: PathBuf::from("aws"),
            max_concurrent_regions: DEFAULT_MAX_CONCURRENT_REGIONS,
            cli_timeout: Duration::from_secs(120),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset, blank or unparsable values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            port: parse_or(get("PORT"), "PORT", defaults.port),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            static_dir: get("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
            cache_ttl: Duration::from_secs(parse_or(
                get("CACHE_TTL_SECONDS"),
                "CACHE_TTL_SECONDS",
                defaults.cache_ttl.as_secs(),
            )),
            command_config_path: get("COMMAND_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.command_config_path),
            profile_store_path: get("PROFILE_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.profile_store_path),
            aws_cli_path: get("AWS_CLI_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.aws_cli_path),
            max_concurrent_regions: Some(parse_or(
                get("MAX_CONCURRENT_REGIONS"),
                "MAX_CONCURRENT_REGIONS",
                defaults.max_concurrent_regions,
            ))
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_concurrent_regions),
            cli_timeout: Duration::from_secs(parse_or(
                get("CLI_TIMEOUT_SECONDS"),
                "CLI_TIMEOUT_SECONDS",
                defaults.cli_timeout.as_secs(),
            )),
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.bind_addr, self.port))
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        None => default,
        Some(raw) => match raw.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
    }
}
