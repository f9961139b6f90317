//! # Node Configuration
//!
//! Everything the runtime needs, read from environment variables. Values
//! that fail to parse keep their default and log a warning.

use crate::handlers::DEFAULT_VERIFIER_IDENTITY;
use ecg_01_record_ledger::domain::LedgerPolicy;
use ecg_02_alert_listener::config::ListenerConfig;
use ecg_telemetry::parse_flag;
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use shared_types::identity::Identity;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::warn;

/// Default gateway listen address.
pub const DEFAULT_HTTP_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3000);

/// HTTP gateway settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Serve the REST routes.
    pub enabled: bool,
    /// Listen address.
    pub addr: SocketAddr,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: SocketAddr::from(DEFAULT_HTTP_ADDR),
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Record ledger policy.
    pub policy: LedgerPolicy,
    /// Alert listener configuration; also names the contract events are published under.
    pub listener: ListenerConfig,
    /// Broadcast buffer per subscriber.
    pub bus_capacity: usize,
    /// Identity the verification worker confirms records as.
    pub verifier_identity: Identity,
    /// REST gateway.
    pub gateway: GatewayConfig,
    /// Run the end-to-end demo after startup.
    pub demo: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            policy: LedgerPolicy::default(),
            listener: ListenerConfig::default(),
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
            verifier_identity: Identity::new(DEFAULT_VERIFIER_IDENTITY),
            gateway: GatewayConfig::default(),
            demo: false,
        }
    }
}

impl NodeConfig {
    /// Contract name events are published and consumed under.
    #[must_use]
    pub fn contract_name(&self) -> &str {
        &self.listener.contract_name
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// # Environment Variables
    ///
    /// - `ECG_VERIFICATION_TIMEOUT_SECS`: Timeout hint in verification requests (default: 300)
    /// - `ECG_ALLOW_OVERWRITE`: Let `storeRecord` replace existing records (default: false)
    /// - `ECG_IDENTITY_PREFIX`: Required prefix of grant/revoke targets (default: x509::)
    /// - `ECG_BUS_CAPACITY`: Event bus buffer (default: 1000)
    /// - `ECG_VERIFIER_IDENTITY`: Identity of the verification worker
    /// - `ECG_HTTP_ENABLED`: Serve the REST gateway (default: false)
    /// - `ECG_HTTP_ADDR`: Gateway listen address (default: 0.0.0.0:3000)
    /// - `ECG_DEMO`: Run the demo flow (default: false)
    /// - plus the listener's `ECG_EVENT_LOG` and `ECG_CONTRACT_NAME`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let policy = LedgerPolicy {
            identity_prefix: value("ECG_IDENTITY_PREFIX")
                .unwrap_or(defaults.policy.identity_prefix),
            verification_timeout_secs: parsed(
                "ECG_VERIFICATION_TIMEOUT_SECS",
                value("ECG_VERIFICATION_TIMEOUT_SECS"),
                defaults.policy.verification_timeout_secs,
            ),
            allow_overwrite: flag(
                "ECG_ALLOW_OVERWRITE",
                value("ECG_ALLOW_OVERWRITE"),
                defaults.policy.allow_overwrite,
            ),
        };

        Self {
            policy,
            listener: ListenerConfig::from_lookup(&lookup),
            bus_capacity: parsed(
                "ECG_BUS_CAPACITY",
                value("ECG_BUS_CAPACITY"),
                defaults.bus_capacity,
            ),
            verifier_identity: value("ECG_VERIFIER_IDENTITY")
                .map(|v| Identity::new(v.trim()))
                .unwrap_or(defaults.verifier_identity),
            gateway: GatewayConfig {
                enabled: flag(
                    "ECG_HTTP_ENABLED",
                    value("ECG_HTTP_ENABLED"),
                    defaults.gateway.enabled,
                ),
                addr: parsed("ECG_HTTP_ADDR", value("ECG_HTTP_ADDR"), defaults.gateway.addr),
            },
            demo: flag("ECG_DEMO", value("ECG_DEMO"), defaults.demo),
        }
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> NodeConfig {
    NodeConfig::from_lookup(|key| env::var(key).ok())
}

fn parsed<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparsable setting");
            default
        }),
    }
}

fn flag(key: &str, raw: Option<String>, default: bool) -> bool {
    match raw {
        None => default,
        Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
            warn!(key, value = %raw, "Ignoring unparsable flag");
            default
        }),
    }
}
