//! Checkout server configuration.
//!
//! Loads configuration from a TOML file with support for environment variable
//! expansion in string values. Variables use `$VAR` or `${VAR}` syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 3000
//!
//! [reflect]
//! base_url = "https://api.reflect.money/earn"
//! timeout_secs = 30
//! api_key = "$REFLECT_API_KEY"
//!
//! [session]
//! wallet_prefixes = ["/pay", "/product"]
//! loader_delay_ms = 400
//! cluster = "mainnet-beta"
//! storage_path = "data/referrals.json"
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `config.toml`)
//! - `HOST` — Override server bind address
//! - `PORT` — Override server port
//! - `REFLECT_URL` — Override the reflect earn-pool base URL
//! - Secrets such as the reflect API key referenced by `$VAR` in the file

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use verxio::networks::SolanaCluster;
use verxio::route::{DEFAULT_WALLET_PREFIXES, RouteClassifier};
use verxio_http::constants::DEFAULT_REFLECT_URL;

/// Top-level checkout server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (default: `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Server port (default: `3000`).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Reflect earn-pool client settings.
    #[serde(default)]
    pub reflect: ReflectConfig,

    /// Checkout session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Settings for the reflect earn-pool delegate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectConfig {
    /// Base URL of the reflect earn service.
    #[serde(default = "default_reflect_url")]
    pub base_url: String,

    /// Request timeout in seconds. Requests wait indefinitely when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// API key sent as `x-api-key` with every pool request.
    /// Supports `$VAR` / `${VAR}` for environment variable expansion.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Settings for checkout sessions minted by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Route prefixes that mount the wallet context.
    #[serde(default = "default_wallet_prefixes")]
    pub wallet_prefixes: Vec<String>,

    /// Page loader delay in milliseconds.
    #[serde(default = "default_loader_delay_ms")]
    pub loader_delay_ms: u64,

    /// Solana cluster wallet contexts connect to.
    #[serde(default = "default_cluster")]
    pub cluster: SolanaCluster,

    /// File the referral store persists to. Referrals are held in memory
    /// only when absent.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    3000
}

fn default_reflect_url() -> String {
    DEFAULT_REFLECT_URL.to_owned()
}

fn default_wallet_prefixes() -> Vec<String> {
    DEFAULT_WALLET_PREFIXES
        .iter()
        .map(|prefix| (*prefix).to_owned())
        .collect()
}

fn default_loader_delay_ms() -> u64 {
    400
}

fn default_cluster() -> SolanaCluster {
    SolanaCluster::MainnetBeta
}

impl Default for ReflectConfig {
    fn default() -> Self {
        Self {
            base_url: default_reflect_url(),
            timeout_secs: None,
            api_key: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wallet_prefixes: default_wallet_prefixes(),
            loader_delay_ms: default_loader_delay_ms(),
            cluster: default_cluster(),
            storage_path: None,
        }
    }
}

impl ReflectConfig {
    /// Request timeout as a [`Duration`], if one is configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl SessionConfig {
    /// Builds the route classifier described by `wallet_prefixes`.
    #[must_use]
    pub fn classifier(&self) -> RouteClassifier {
        RouteClassifier::new(self.wallet_prefixes.iter().map(String::as_str))
    }

    /// The loader delay as a [`Duration`].
    #[must_use]
    pub const fn loader_delay(&self) -> Duration {
        Duration::from_millis(self.loader_delay_ms)
    }
}

impl ServerConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `config.toml` in the current directory.
    ///
    /// After loading, all string values with `$VAR` / `${VAR}` references
    /// are expanded from the process environment. `HOST`, `PORT`, and
    /// `REFLECT_URL` env vars override the file values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "config.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path)?
        } else {
            // If no config file exists, use empty TOML and rely on defaults
            String::new()
        };

        // Expand environment variables in the raw TOML string
        let expanded = expand_env_vars(&content);

        let mut config: Self = toml::from_str(&expanded)?;

        // Allow HOST / PORT / REFLECT_URL env overrides
        if let Ok(host) = std::env::var("HOST") {
            if let Ok(addr) = host.parse() {
                config.host = addr;
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }
        if let Ok(url) = std::env::var("REFLECT_URL") {
            config.reflect.base_url = url;
        }

        Ok(config)
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let braced = chars.peek() == Some(&'{');
            if braced {
                chars.next(); // consume '{'
            }

            let mut var_name = String::new();
            while let Some(&c) = chars.peek() {
                if braced {
                    if c == '}' {
                        chars.next();
                        break;
                    }
                } else if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                var_name.push(c);
                chars.next();
            }

            if var_name.is_empty() {
                result.push('$');
                if braced {
                    result.push('{');
                }
            } else if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            } else {
                // Leave unresolved variable as-is
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced {
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}
