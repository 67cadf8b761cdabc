//! Domain types shared between the Cosmos and Ethereum sides of the valset relayer.

use alloy::primitives::{Address, Bytes, U256};

/// A single member of a validator set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValsetMember {
    /// The Ethereum address the validator signs valset confirmations with.
    pub eth_address: Address,
    /// The normalized voting power of the validator.
    pub power: u64,
}

/// A snapshot of the bridge validator set, identified by a strictly increasing nonce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Valset {
    /// The valset nonce.
    pub nonce: u64,
    /// The Cosmos block height at which the valset was created.
    /// Valsets read back from Ethereum do not carry a Cosmos height and use `0`.
    pub height: u64,
    /// The ordered members of the valset.
    pub members: Vec<ValsetMember>,
    /// The reward paid to the relayer that submits this valset.
    pub reward_amount: U256,
    /// The ERC20 token the reward is paid in. The zero address means no reward.
    pub reward_token: Address,
}

impl Valset {
    /// Returns the Ethereum addresses of the members, in valset order.
    #[must_use]
    pub fn validators(&self) -> Vec<Address> {
        self.members.iter().map(|m| m.eth_address).collect()
    }

    /// Returns the powers of the members, in valset order.
    #[must_use]
    pub fn powers(&self) -> Vec<U256> {
        self.members.iter().map(|m| U256::from(m.power)).collect()
    }
}

/// A signature produced by one orchestrator over the checkpoint of a valset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValsetConfirm {
    /// The nonce of the confirmed valset.
    pub nonce: u64,
    /// The Cosmos account of the orchestrator that submitted the confirmation.
    pub orchestrator: String,
    /// The Ethereum address of the signer.
    pub eth_signer: Address,
    /// The 65 byte `r || s || v` signature over the valset checkpoint.
    pub signature: Bytes,
}
