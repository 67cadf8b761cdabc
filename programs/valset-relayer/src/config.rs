//! Defines the top level configuration for the valset relayer.

use std::{str::FromStr, time::Duration};

use alloy::primitives::Address;
use serde::{Deserialize, Deserializer};
use tracing::Level;
use valset_relayer_lib::{config::RelayOffset, eth::DEFAULT_BLOCKS_TO_SEARCH};

/// The top level configuration for the valset relayer.
#[derive(Clone, Debug, serde::Deserialize)]
#[allow(clippy::module_name_repetitions)]
pub struct ValsetRelayerConfig {
    /// The logging and tracing configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// The cosmos chain running the peggy module.
    pub cosmos: CosmosConfig,
    /// The ethereum chain running the peggy contract.
    pub ethereum: EthereumConfig,
    /// The valset relaying loop.
    #[serde(default)]
    pub relayer: RelayerConfig,
    /// The prometheus metrics server.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// The observability configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ObservabilityConfig {
    /// The log level, e.g. `info` or `debug`.
    #[serde(default = "default_level")]
    pub level: String,
    /// Whether to export traces and logs over OTLP.
    #[serde(default)]
    pub use_otel: bool,
    /// The service name reported to OpenTelemetry.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// The OTLP collector endpoint. Uses the exporter default if unset.
    #[serde(default)]
    pub otel_endpoint: Option<String>,
}

/// The cosmos chain configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct CosmosConfig {
    /// The tendermint RPC endpoint.
    pub tm_rpc_url: String,
}

/// The ethereum chain configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct EthereumConfig {
    /// The ethereum JSON-RPC endpoint.
    pub eth_rpc_url: String,
    /// The address of the peggy contract.
    pub peggy_address: Address,
    /// The hex encoded private key valset updates are signed with.
    pub private_key: String,
    /// The number of blocks covered by a single log query.
    #[serde(default = "default_blocks_to_search")]
    pub blocks_to_search: u64,
}

/// The valset relaying loop configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct RelayerConfig {
    /// Whether valsets are relayed at all.
    #[serde(default = "default_true")]
    pub relay_valsets: bool,
    /// The time a valset must exist on cosmos before it is relayed.
    #[serde(default)]
    pub relay_valset_offset: RelayOffset,
    /// The time between two sync rounds.
    #[serde(default = "default_loop_interval", deserialize_with = "deserialize_duration")]
    pub loop_interval: Duration,
    /// The maximum duration of a single sync round.
    #[serde(default = "default_sync_timeout", deserialize_with = "deserialize_duration")]
    pub sync_timeout: Duration,
}

/// The metrics server configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct MetricsConfig {
    /// The address to bind the metrics server to.
    pub address: String,
    /// The port to bind the metrics server to.
    pub port: u16,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "valset-relayer".to_string()
}

const fn default_blocks_to_search() -> u64 {
    DEFAULT_BLOCKS_TO_SEARCH
}

/// Returns true, used as a default value for boolean fields.
const fn default_true() -> bool {
    true
}

const fn default_loop_interval() -> Duration {
    Duration::from_secs(60)
}

const fn default_sync_timeout() -> Duration {
    Duration::from_secs(30)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    valset_relayer_lib::config::parse_duration(&value).map_err(serde::de::Error::custom)
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            use_otel: false,
            service_name: default_service_name(),
            otel_endpoint: None,
        }
    }
}

impl ObservabilityConfig {
    /// Returns the log level.
    #[must_use]
    pub fn level(&self) -> Level {
        Level::from_str(&self.level).unwrap_or(Level::INFO)
    }
}

impl Default for RelayerConfig {
    fn default() -> Self {
        Self {
            relay_valsets: true,
            relay_valset_offset: RelayOffset::ZERO,
            loop_interval: default_loop_interval(),
            sync_timeout: default_sync_timeout(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 9000,
        }
    }
}

impl ValsetRelayerConfig {
    /// Checks the values serde cannot.
    /// # Errors
    /// Returns an error if an interval is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.relayer.loop_interval.is_zero(),
            "config error at relayer.loop_interval: must be greater than zero"
        );
        anyhow::ensure!(
            !self.relayer.sync_timeout.is_zero(),
            "config error at relayer.sync_timeout: must be greater than zero"
        );
        Ok(())
    }
}

/// Parse a configuration value into the target struct while producing
/// detailed path-aware error messages.
///
/// It leverages `serde_path_to_error` to include the exact JSON path of the
/// failure (e.g. `relayer.relay_valset_offset`).
///
/// # Errors
/// Returns an [`anyhow::Error`] with the precise path and the original serde
/// error message.
pub fn parse_config<T>(value: serde_json::Value) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let json_string = value.to_string();

    let mut deserializer = serde_json::Deserializer::from_str(&json_string);
    match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(v) => Ok(v),
        Err(e) => Err(anyhow::anyhow!(format!(
            "config error at {}: {}",
            e.path(),
            e
        ))),
    }
}

/// Parse and validate a JSON encoded configuration.
/// # Errors
/// Returns an error if the bytes are not valid JSON or do not describe a valid configuration.
pub fn load_config(bz: &[u8]) -> anyhow::Result<ValsetRelayerConfig> {
    let value: serde_json::Value = serde_json::from_slice(bz)?;
    let config: ValsetRelayerConfig = parse_config(value)?;
    config.validate()?;
    Ok(config)
}
