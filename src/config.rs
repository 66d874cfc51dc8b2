use crate::error::Error;
use derive_builder::Builder;
use std::time::Duration;
use url::Url;

/// Log verbosity, mapped onto `tracing` levels by [`crate::telemetry::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Verbose,
    /// Dedicated target for the ingress guards' access log.
    Access,
}

impl LogLevel {
    /// The `tracing` level name this maps to; `Access` uses `info` with its own span target.
    pub fn as_tracing_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Verbose => "trace",
            LogLevel::Access => "info",
        }
    }
}

/// Typed, layered configuration for a node. Build via [`FederationConfigBuilder`] or
/// [`FederationConfig::from_env`].
#[derive(Clone, Builder)]
#[builder(build_fn(error = "Error"))]
pub struct FederationConfig {
    /// Absolute base URL for this instance; becomes the authority for all minted IRIs.
    pub base_url: Url,
    /// Redis host for the shared counter/cache backend. `None` selects the in-process backend.
    #[builder(default)]
    pub redis_host: Option<String>,
    /// Redis port, used when `redis_host` is set.
    #[builder(default = "6379")]
    pub redis_port: u16,
    /// Logging verbosity.
    #[builder(default)]
    pub log_level: LogLevel,
    /// Optional development-only private key used to seed a default actor.
    #[builder(default)]
    pub default_actor_private_key_pem: Option<String>,
    /// Recursive remote-fetch budget per inbound request.
    #[builder(default = "20")]
    pub http_fetch_limit: u32,
    /// Outbox worker pool size.
    #[builder(default = "64")]
    pub worker_count: usize,
    /// Timeout applied to outbound HTTP fetch and delivery requests.
    #[builder(default = "Duration::from_secs(10)")]
    pub request_timeout: Duration,
    /// When true, relaxes scheme/localhost checks and runs outbox delivery inline so that
    /// integration tests observe delivery synchronously.
    #[builder(default)]
    pub debug: bool,
}

impl FederationConfig {
    /// Start building a config with only the required field set.
    pub fn builder() -> FederationConfigBuilder {
        FederationConfigBuilder::default()
    }

    /// Load configuration layered as: built-in defaults, then an optional TOML file, then
    /// environment variables (highest precedence). `path` is skipped silently if absent.
    pub fn from_env(path: Option<&str>) -> Result<Self, Error> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::with_name(path).required(false));
        }
        let builder = builder.add_source(
            ::config::Environment::default()
                .try_parsing(true)
                .separator("__"),
        );
        let raw = builder
            .build()
            .map_err(|e| Error::BadRequest(format!("invalid configuration: {e}")))?;

        let base_url: String = raw
            .get_string("instance_base_url")
            .map_err(|_| Error::BadRequest("INSTANCE_BASE_URL is required".to_string()))?;
        let base_url = Url::parse(&base_url)?;

        let mut out = FederationConfig::builder();
        out.base_url(base_url);
        if let Ok(host) = raw.get_string("redis_host") {
            out.redis_host(Some(host));
        }
        if let Ok(port) = raw.get_int("redis_port") {
            out.redis_port(port as u16);
        }
        if let Ok(level) = raw.get_string("log_level") {
            out.log_level(parse_log_level(&level));
        }
        if let Ok(pem) = raw.get_string("default_actor_private_key_pem") {
            out.default_actor_private_key_pem(Some(pem));
        }
        if let Ok(limit) = raw.get_int("http_fetch_limit") {
            out.http_fetch_limit(limit as u32);
        }
        if let Ok(workers) = raw.get_int("worker_count") {
            out.worker_count(workers as usize);
        }
        if let Ok(secs) = raw.get_int("request_timeout_secs") {
            out.request_timeout(Duration::from_secs(secs as u64));
        }
        if let Ok(debug) = raw.get_bool("debug") {
            out.debug(debug);
        }
        out.build()
    }

    /// Whether `redis_host` selects a shared Redis backend.
    pub fn uses_redis(&self) -> bool {
        self.redis_host.is_some()
    }

    /// A redacted view of this config suitable for logging or `fedctl config print`.
    pub fn redacted(&self) -> String {
        format!(
            "base_url={} redis={:?}:{} log_level={:?} http_fetch_limit={} worker_count={} debug={}",
            self.base_url,
            self.redis_host,
            self.redis_port,
            self.log_level,
            self.http_fetch_limit,
            self.worker_count,
            self.debug
        )
    }
}

fn parse_log_level(s: &str) -> LogLevel {
    match s.to_lowercase().as_str() {
        "error" => LogLevel::Error,
        "warn" => LogLevel::Warn,
        "debug" => LogLevel::Debug,
        "verbose" => LogLevel::Verbose,
        "access" => LogLevel::Access,
        _ => LogLevel::Info,
    }
}
