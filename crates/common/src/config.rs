//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Federation configuration.
    pub federation: FederationConfig,
    /// Delivery/ingestion throttling configuration.
    #[serde(default)]
    pub throttle: ThrottleConfig,
    /// Local registration configuration.
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Federation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FederationConfig {
    /// Whether federation is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Instance name.
    pub instance_name: String,
    /// Instance description.
    #[serde(default)]
    pub instance_description: Option<String>,
    /// Instance maintainer name.
    #[serde(default)]
    pub maintainer_name: Option<String>,
    /// Instance maintainer email.
    #[serde(default)]
    pub maintainer_email: Option<String>,
    /// Date (RFC 3339) after which inbound requests must carry an RFC 9421
    /// signature; legacy draft-cavage signatures are rejected from this
    /// point on. `None` means legacy signatures remain accepted indefinitely.
    #[serde(default)]
    pub rfc9421_threshold: Option<String>,
    /// Date (RFC 3339) after which locally generated keys are Ed25519-only;
    /// before it, new local actors still get an RSA key for interop with
    /// legacy-only peers.
    #[serde(default)]
    pub ed25519_threshold: Option<String>,
    /// Disable data-integrity proof verification on portable-actor
    /// activities, falling back to transport-level signatures only.
    #[serde(default)]
    pub disable_integrity_proofs: bool,
    /// Maximum number of redirects the fetcher will follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u8,
    /// Maximum response body size accepted from a remote server, in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

/// Rate limits protecting inbound delivery and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    /// Maximum inbox deliveries accepted per remote host per minute.
    #[serde(default = "default_inbox_per_host_per_minute")]
    pub inbox_per_host_per_minute: u32,
    /// Consecutive outbound delivery failures to a host before it is
    /// quarantined by the circuit breaker.
    #[serde(default = "default_circuit_breaker_threshold")]
    pub circuit_breaker_threshold: u32,
    /// How long a quarantined host stays excluded from delivery, in seconds.
    #[serde(default = "default_circuit_breaker_cooldown_secs")]
    pub circuit_breaker_cooldown_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            inbox_per_host_per_minute: default_inbox_per_host_per_minute(),
            circuit_breaker_threshold: default_circuit_breaker_threshold(),
            circuit_breaker_cooldown_secs: default_circuit_breaker_cooldown_secs(),
        }
    }
}

/// Local registration configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    /// Whether new local actors require a valid invitation code.
    #[serde(default)]
    pub invite_only: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self { invite_only: false }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_redis_prefix() -> String {
    "plaza".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_max_redirects() -> u8 {
    3
}

const fn default_max_response_bytes() -> usize {
    10 * 1024 * 1024
}

const fn default_inbox_per_host_per_minute() -> u32 {
    120
}

const fn default_circuit_breaker_threshold() -> u32 {
    5
}

const fn default_circuit_breaker_cooldown_secs() -> u64 {
    900
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `PLAZA_ENV`)
    /// 3. Environment variables with `PLAZA_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("PLAZA_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PLAZA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("PLAZA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
