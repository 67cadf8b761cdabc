//! Protobuf messages of the `injective.peggy.v1` query service used by the relayer.

#![allow(missing_docs, clippy::derive_partial_eq_without_eq)]

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use anyhow::Context;

use crate::types::{Valset, ValsetConfirm, ValsetMember};

/// ABCI query path for the most recent valset requests.
pub const LAST_VALSET_REQUESTS_PATH: &str = "/injective.peggy.v1.Query/LastValsetRequests";
/// ABCI query path for the confirmations of a valset.
pub const VALSET_CONFIRMS_BY_NONCE_PATH: &str = "/injective.peggy.v1.Query/ValsetConfirmsByNonce";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BridgeValidator {
    #[prost(uint64, tag = "1")]
    pub power: u64,
    #[prost(string, tag = "2")]
    pub ethereum_address: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoValset {
    #[prost(uint64, tag = "1")]
    pub nonce: u64,
    #[prost(message, repeated, tag = "2")]
    pub members: ::prost::alloc::vec::Vec<BridgeValidator>,
    #[prost(uint64, tag = "3")]
    pub height: u64,
    #[prost(string, tag = "4")]
    pub reward_amount: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub reward_token: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgValsetConfirm {
    #[prost(uint64, tag = "1")]
    pub nonce: u64,
    #[prost(string, tag = "2")]
    pub orchestrator: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub eth_address: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub signature: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct QueryLastValsetRequestsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryLastValsetRequestsResponse {
    #[prost(message, repeated, tag = "1")]
    pub valsets: ::prost::alloc::vec::Vec<ProtoValset>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct QueryValsetConfirmsByNonceRequest {
    #[prost(uint64, tag = "1")]
    pub nonce: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryValsetConfirmsByNonceResponse {
    #[prost(message, repeated, tag = "1")]
    pub confirms: ::prost::alloc::vec::Vec<MsgValsetConfirm>,
}

/// Parses a decimal reward amount. The module leaves it empty when no reward is set.
fn parse_reward_amount(amount: &str) -> anyhow::Result<U256> {
    if amount.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(amount, 10)
        .map_err(|e| anyhow::anyhow!("invalid reward amount `{amount}`: {e}"))
}

fn parse_address(address: &str) -> anyhow::Result<Address> {
    if address.is_empty() {
        return Ok(Address::ZERO);
    }
    Address::from_str(address).with_context(|| format!("invalid ethereum address `{address}`"))
}

impl TryFrom<ProtoValset> for Valset {
    type Error = anyhow::Error;

    fn try_from(valset: ProtoValset) -> Result<Self, Self::Error> {
        let members = valset
            .members
            .into_iter()
            .map(|member| {
                Ok(ValsetMember {
                    eth_address: Address::from_str(&member.ethereum_address).with_context(
                        || format!("invalid member address `{}`", member.ethereum_address),
                    )?,
                    power: member.power,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .with_context(|| format!("malformed valset {}", valset.nonce))?;

        Ok(Self {
            nonce: valset.nonce,
            height: valset.height,
            members,
            reward_amount: parse_reward_amount(&valset.reward_amount)?,
            reward_token: parse_address(&valset.reward_token)?,
        })
    }
}

impl TryFrom<MsgValsetConfirm> for ValsetConfirm {
    type Error = anyhow::Error;

    fn try_from(confirm: MsgValsetConfirm) -> Result<Self, Self::Error> {
        let eth_signer = Address::from_str(&confirm.eth_address)
            .with_context(|| format!("invalid signer address `{}`", confirm.eth_address))?;
        let signature = hex::decode(confirm.signature.trim_start_matches("0x"))
            .with_context(|| format!("invalid signature from {}", confirm.orchestrator))?;

        Ok(Self {
            nonce: confirm.nonce,
            orchestrator: confirm.orchestrator,
            eth_signer,
            signature: Bytes::from(signature),
        })
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;

    const SIGNER: &str = "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1";

    fn proto_valset() -> ProtoValset {
        ProtoValset {
            nonce: 7,
            members: vec![BridgeValidator {
                power: 2_147_483_648,
                ethereum_address: SIGNER.to_string(),
            }],
            height: 1234,
            reward_amount: "1000".to_string(),
            reward_token: "0x0000000000000000000000000000000000000001".to_string(),
        }
    }

    #[test]
    fn converts_valset() {
        let valset = Valset::try_from(proto_valset()).unwrap();

        assert_eq!(valset.nonce, 7);
        assert_eq!(valset.height, 1234);
        assert_eq!(valset.validators(), vec![Address::from_str(SIGNER).unwrap()]);
        assert_eq!(valset.powers(), vec![U256::from(2_147_483_648_u64)]);
        assert_eq!(valset.reward_amount, U256::from(1000));
        assert_eq!(valset.reward_token, Address::with_last_byte(1));
    }

    #[test]
    fn empty_reward_means_no_reward() {
        let mut proto = proto_valset();
        proto.reward_amount = String::new();
        proto.reward_token = String::new();

        let valset = Valset::try_from(proto).unwrap();

        assert_eq!(valset.reward_amount, U256::ZERO);
        assert_eq!(valset.reward_token, Address::ZERO);
    }

    #[test]
    fn rejects_malformed_member_address() {
        let mut proto = proto_valset();
        proto.members[0].ethereum_address = "not-an-address".to_string();

        let err = Valset::try_from(proto).unwrap_err();

        assert!(format!("{err:#}").contains("malformed valset 7"));
    }

    #[test]
    fn converts_confirm_with_and_without_prefix() {
        let sig = "11".repeat(65);
        for signature in [sig.clone(), format!("0x{sig}")] {
            let confirm = ValsetConfirm::try_from(MsgValsetConfirm {
                nonce: 7,
                orchestrator: "inj1orch".to_string(),
                eth_address: SIGNER.to_string(),
                signature,
            })
            .unwrap();

            assert_eq!(confirm.signature.len(), 65);
            assert_eq!(confirm.eth_signer, Address::from_str(SIGNER).unwrap());
        }
    }

    #[test]
    fn decodes_confirms_response() {
        let encoded = QueryValsetConfirmsByNonceResponse {
            confirms: vec![MsgValsetConfirm {
                nonce: 3,
                orchestrator: "inj1orch".to_string(),
                eth_address: SIGNER.to_string(),
                signature: "ab".repeat(65),
            }],
        }
        .encode_to_vec();

        let decoded = QueryValsetConfirmsByNonceResponse::decode(encoded.as_slice()).unwrap();

        assert_eq!(decoded.confirms.len(), 1);
        assert_eq!(decoded.confirms[0].nonce, 3);
    }
}
