use std::time::Duration;

use rstest::rstest;
use serde_json::json;
use valset_relayer::config::{load_config, parse_config, ValsetRelayerConfig};
use valset_relayer_lib::config::RelayOffset;

/// Build a minimal valid relayer JSON configuration so that we can tweak it in each test.
fn base_relayer_json() -> serde_json::Value {
    json!({
        "observability": {
            "level": "info",
            "use_otel": false
        },
        "cosmos": {
            "tm_rpc_url": "http://localhost:26657"
        },
        "ethereum": {
            "eth_rpc_url": "http://localhost:8545",
            "peggy_address": "0x5048019d259217e6b7bc8e1e6aeff2a2e87c1d77",
            "private_key": "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        },
        "relayer": {
            "relay_valsets": true,
            "relay_valset_offset": "1h"
        }
    })
}

fn load(value: &serde_json::Value) -> anyhow::Result<ValsetRelayerConfig> {
    load_config(value.to_string().as_bytes())
}

#[test]
fn full_config_parses_successfully() -> anyhow::Result<()> {
    let config = load(&base_relayer_json())?;

    assert_eq!(config.cosmos.tm_rpc_url, "http://localhost:26657");
    assert_eq!(
        config.relayer.relay_valset_offset,
        RelayOffset::new(Duration::from_secs(3600))
    );
    Ok(())
}

#[test]
fn defaults_are_applied() -> anyhow::Result<()> {
    let mut json_val = base_relayer_json();
    let root = json_val.as_object_mut().unwrap();
    root.remove("relayer");
    root.remove("observability");

    let config = load(&json_val)?;

    assert!(config.relayer.relay_valsets);
    assert_eq!(config.relayer.relay_valset_offset, RelayOffset::ZERO);
    assert_eq!(config.relayer.loop_interval, Duration::from_secs(60));
    assert_eq!(config.relayer.sync_timeout, Duration::from_secs(30));
    assert_eq!(config.ethereum.blocks_to_search, 2000);
    assert_eq!(config.metrics.port, 9000);
    assert_eq!(config.observability.service_name, "valset-relayer");
    assert!(!config.observability.use_otel);
    Ok(())
}

#[test]
fn relaying_can_be_disabled() -> anyhow::Result<()> {
    let mut json_val = base_relayer_json();
    json_val["relayer"]["relay_valsets"] = json!(false);

    assert!(!load(&json_val)?.relayer.relay_valsets);
    Ok(())
}

#[test]
fn missing_cosmos_section_fails() {
    let mut json_val = base_relayer_json();
    json_val.as_object_mut().unwrap().remove("cosmos");

    let err = load(&json_val).unwrap_err();

    assert!(err.to_string().contains("cosmos"));
}

#[test]
fn missing_private_key_yields_path_error() {
    let mut json_val = base_relayer_json();
    json_val["ethereum"]
        .as_object_mut()
        .unwrap()
        .remove("private_key");

    let err = parse_config::<ValsetRelayerConfig>(json_val).unwrap_err();

    assert!(err.to_string().contains("private_key"));
}

#[test]
fn malformed_peggy_address_yields_path_error() {
    let mut json_val = base_relayer_json();
    json_val["ethereum"]["peggy_address"] = json!("0x1234");

    let err = load(&json_val).unwrap_err();

    assert!(err.to_string().contains("ethereum.peggy_address"));
}

#[rstest]
#[case::negative_offset("relay_valset_offset", "-10m", "relayer.relay_valset_offset")]
#[case::malformed_offset("relay_valset_offset", "soon", "invalid duration")]
#[case::malformed_loop_interval("loop_interval", "often", "relayer.loop_interval")]
#[case::zero_loop_interval("loop_interval", "0s", "must be greater than zero")]
#[case::malformed_sync_timeout("sync_timeout", "-30s", "relayer.sync_timeout")]
#[case::zero_sync_timeout("sync_timeout", "0s", "must be greater than zero")]
fn invalid_relayer_durations_are_rejected(
    #[case] field: &str,
    #[case] value: &str,
    #[case] expected: &str,
) {
    let mut json_val = base_relayer_json();
    json_val["relayer"][field] = json!(value);

    let err = load(&json_val).unwrap_err();

    assert!(
        err.to_string().contains(expected),
        "unexpected error for {field}={value}: {err}"
    );
}

#[test]
fn port_wrong_type_fails() {
    let mut json_val = base_relayer_json();
    json_val["metrics"] = json!({ "address": "127.0.0.1", "port": "not_a_number" });

    let err = load(&json_val).unwrap_err();

    assert!(err.to_string().contains("invalid type"));
}

#[test]
fn invalid_json_fails() {
    assert!(load_config(b"{ not json").is_err());
}
