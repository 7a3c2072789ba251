/// Configuration management for the TaskVault API
///
/// Handles server binding, store credentials, CORS, tier limits, rate limiting
/// and the event sink. Every value can be overridden from the environment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Hosted table store configuration
    pub store: StoreConfig,
    /// Plan name -> team member ceiling
    pub tiers: TierConfig,
    /// Fixed-window rate limiting
    pub rate_limit: RateLimitConfig,
    /// Background audit / analytics writer
    pub events: EventsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
    /// Browser origins allowed by CORS
    pub cors_allow_origins: Vec<String>,
}

/// Which table store implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hosted PostgREST-style store
    Rest,
    /// Process-local tables (development, tests)
    Memory,
}

/// Hosted store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Base URL, e.g. "https://xyz.supabase.co"
    pub url: Option<String>,
    /// Service-level credential sent as `apikey` and bearer token
    #[serde(skip_serializing)]
    pub service_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Team size ceilings per subscription plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    /// Lowercase plan name -> maximum members
    pub limits: BTreeMap<String, u32>,
    /// Ceiling applied to plans missing from `limits`
    pub fallback_limit: u32,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Ceiling for GET requests per window
    pub read_per_window: u32,
    /// Ceiling for mutating requests per window
    pub write_per_window: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Event sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Whether usage events are recorded at all (audit entries always are)
    pub usage_analytics_enabled: bool,
    /// Bounded queue size; events beyond it are dropped
    pub queue_capacity: usize,
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_string(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    match env_string(key) {
        Some(v) => matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
        None => default,
    }
}

/// Parse "free=2,pro=10" into a plan table; malformed entries are skipped
pub fn parse_plan_limits(raw: &str) -> BTreeMap<String, u32> {
    raw.split(',')
        .filter_map(|entry| {
            let (plan, limit) = entry.split_once('=')?;
            let plan = plan.trim().to_lowercase();
            if plan.is_empty() {
                return None;
            }
            Some((plan, limit.trim().parse().ok()?))
        })
        .collect()
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            limits: parse_plan_limits("free=2,pro=10"),
            fallback_limit: 2,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            read_per_window: 60,
            write_per_window: 10,
            window_secs: 60,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            usage_analytics_enabled: true,
            queue_capacity: 1024,
        }
    }
}

impl Config {
    /// Configuration for tests and local runs: in-memory store, built-in defaults
    pub fn in_memory() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_allow_origins: Vec::new(),
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                url: None,
                service_key: None,
                timeout_secs: 10,
            },
            tiers: TierConfig::default(),
            rate_limit: RateLimitConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        let tier_defaults = TierConfig::default();
        let limits = env_string("TASKVAULT_PLAN_LIMITS")
            .map(|raw| parse_plan_limits(&raw))
            .filter(|limits| !limits.is_empty())
            .unwrap_or(tier_defaults.limits);
        let fallback_limit = limits
            .get("free")
            .copied()
            .unwrap_or(tier_defaults.fallback_limit);

        let backend = match env_string("TASKVAULT_STORE_BACKEND").as_deref() {
            Some("memory") => StoreBackend::Memory,
            _ => StoreBackend::Rest,
        };

        let rate_defaults = RateLimitConfig::default();
        let event_defaults = EventsConfig::default();

        Self {
            server: ServerConfig {
                host: env_string("TASKVAULT_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: env_parse("TASKVAULT_PORT", 8000),
                cors_allow_origins: parse_origins(
                    &env_string("CORS_ALLOW_ORIGINS")
                        .unwrap_or_else(|| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
                ),
            },
            store: StoreConfig {
                backend,
                url: env_string("SUPABASE_URL"),
                service_key: env_string("SUPABASE_SERVICE_ROLE_KEY"),
                timeout_secs: env_parse("TASKVAULT_STORE_TIMEOUT_SECS", 10),
            },
            tiers: TierConfig {
                limits,
                fallback_limit,
            },
            rate_limit: RateLimitConfig {
                enabled: env_flag("TASKVAULT_RATE_LIMIT_ENABLED", rate_defaults.enabled),
                read_per_window: env_parse("TASKVAULT_RATE_LIMIT_READ", rate_defaults.read_per_window),
                write_per_window: env_parse(
                    "TASKVAULT_RATE_LIMIT_WRITE",
                    rate_defaults.write_per_window,
                ),
                window_secs: env_parse("TASKVAULT_RATE_LIMIT_WINDOW_SECS", rate_defaults.window_secs),
            },
            events: EventsConfig {
                usage_analytics_enabled: env_flag(
                    "USAGE_ANALYTICS_ENABLED",
                    event_defaults.usage_analytics_enabled,
                ),
                queue_capacity: env_parse(
                    "TASKVAULT_EVENT_QUEUE_CAPACITY",
                    event_defaults.queue_capacity,
                ),
            },
        }
    }
}
