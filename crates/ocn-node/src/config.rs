//! Node configuration.
//!
//! Every field has a development-friendly default and an `OCN_*` environment
//! override. The one exception is the admin token, which has no default:
//! the admin surface mints registration tokens, so the node refuses to start
//! without it.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub identity: IdentityConfig,
    pub security: SecurityConfig,
    pub proxy: ProxyConfig,
}

impl NodeConfig {
    /// Defaults overridden by `OCN_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(bind) = std::env::var("OCN_BIND") {
            config.network.bind = bind;
        }
        if let Ok(url) = std::env::var("OCN_PUBLIC_URL") {
            config.network.public_url = url;
        }
        if let Ok(timeout) = std::env::var("OCN_REQUEST_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                config.network.request_timeout_ms = ms;
            }
        }
        if let Ok(path) = std::env::var("OCN_REGISTRY_FILE") {
            config.network.registry_file = Some(PathBuf::from(path));
        }

        if let Ok(operator) = std::env::var("OCN_OPERATOR") {
            config.identity.operator = operator;
        }
        if let Ok(country) = std::env::var("OCN_COUNTRY_CODE") {
            config.identity.country_code = country;
        }
        if let Ok(party) = std::env::var("OCN_PARTY_ID") {
            config.identity.party_id = party;
        }
        if let Ok(key) = std::env::var("OCN_SIGNER_KEY") {
            config.identity.signer_key = Some(key);
        }

        if let Ok(token) = std::env::var("OCN_ADMIN_TOKEN") {
            config.security.admin_token = token;
        }
        if let Ok(required) = std::env::var("OCN_REQUIRE_SIGNATURES") {
            config.security.require_signatures = matches!(required.as_str(), "1" | "true");
        }

        if let Ok(age) = std::env::var("OCN_PROXY_MAX_AGE_SECS") {
            if let Ok(secs) = age.parse() {
                config.proxy.max_age_secs = secs;
            }
        }
        if let Ok(interval) = std::env::var("OCN_PROXY_PURGE_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                config.proxy.purge_interval_secs = secs;
            }
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.admin_token.trim().is_empty() {
            return Err(ConfigError::MissingAdminToken);
        }
        self.bind_addr()?;
        if self.network.public_url.trim().is_empty() {
            return Err(ConfigError::MissingPublicUrl);
        }
        if self.proxy.purge_interval_secs == 0 {
            return Err(ConfigError::ZeroPurgeInterval);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.network
            .bind
            .parse()
            .map_err(|_| ConfigError::MalformedBindAddress(self.network.bind.clone()))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingAdminToken,
    MissingPublicUrl,
    MalformedBindAddress(String),
    ZeroPurgeInterval,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingAdminToken => {
                write!(f, "no admin token configured; set OCN_ADMIN_TOKEN")
            }
            ConfigError::MissingPublicUrl => {
                write!(f, "no public URL configured; set OCN_PUBLIC_URL")
            }
            ConfigError::MalformedBindAddress(bind) => {
                write!(f, "OCN_BIND is not a socket address: {bind}")
            }
            ConfigError::ZeroPurgeInterval => {
                write!(f, "OCN_PROXY_PURGE_INTERVAL_SECS must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Listener, public identity on the network, and outbound HTTP settings.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Listen address.
    pub bind: String,
    /// Base URL peers and platforms reach this node under. Appears in the
    /// registry, in proxied links and in relay envelopes.
    pub public_url: String,
    /// Outbound request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Path to the party registry document. Without one the registry is
    /// empty and every receiver is unknown.
    pub registry_file: Option<PathBuf>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
            public_url: "http://localhost:8080".into(),
            request_timeout_ms: 20_000,
            registry_file: None,
        }
    }
}

/// How this node introduces itself during credentials handshakes.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub operator: String,
    pub country_code: String,
    pub party_id: String,
    /// Hex-encoded ECDSA private key. Generated fresh on boot when unset,
    /// which breaks relay verification across restarts.
    pub signer_key: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            operator: "OCN Relay".into(),
            country_code: "DE".into(),
            party_id: "OCN".into(),
            signer_key: None,
        }
    }
}

/// Credentials and signing policy.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    /// Bearer token of the admin surface. No default.
    pub admin_token: String,
    /// Reject unsigned envelopes regardless of per-platform preferences.
    pub require_signatures: bool,
}

/// Proxy-resource housekeeping.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Mappings older than this are purged.
    pub max_age_secs: u64,
    /// How often the purge runs.
    pub purge_interval_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self { max_age_secs: 3_600, purge_interval_secs: 300 }
    }
}
