//! Server Configuration
//!
//! Configuration comes from environment variables, with built-in
//! defaults when a variable is unset. A present-but-malformed value
//! falls back to the default with a warning rather than aborting
//! startup.
//!
//! | Variable                    | Default   | Meaning                          |
//! |-----------------------------|-----------|----------------------------------|
//! | `EMBERKV_HOST`              | `0.0.0.0` | Listen address                   |
//! | `EMBERKV_PORT`              | `6379`    | Listen port                      |
//! | `EMBERKV_CLEANUP_INTERVAL`  | `60`      | Sweep interval, seconds          |
//! | `EMBERKV_DEFAULT_TTL`       | `300`     | Default TTL for writes, seconds  |

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Default listen address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 6379;

/// Default expired-key sweep interval in seconds
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Default TTL in seconds applied to writes that do not specify one
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Runtime configuration for the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the listener binds to
    pub host: String,
    /// Port the listener binds to
    pub port: u16,
    /// How often the background sweeper scans for expired keys
    pub cleanup_interval: Duration,
    /// TTL applied to writes that do not specify one; zero disables it
    pub default_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }
}

impl Config {
    /// Builds a configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            host: env::var("EMBERKV_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env_parse("EMBERKV_PORT", DEFAULT_PORT),
            cleanup_interval: Duration::from_secs(env_parse(
                "EMBERKV_CLEANUP_INTERVAL",
                DEFAULT_CLEANUP_INTERVAL_SECS,
            )),
            default_ttl: Duration::from_secs(env_parse("EMBERKV_DEFAULT_TTL", DEFAULT_TTL_SECS)),
        }
    }

    /// The `host:port` string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reads and parses an environment variable, falling back to `default`
/// when unset or malformed.
fn env_parse<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(var = name, value = %raw, "malformed value, using default");
            default
        }),
        Err(_) => default,
    }
}
