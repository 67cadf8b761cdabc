//! Defines the interfaces the valset relayer consumes from the chains it bridges.
//!
//! Every method is a fresh read (or, for [`ValsetTarget::send_valset_update`], a single write);
//! implementations must not cache results across calls.

use alloy::primitives::{Address, TxHash};
use anyhow::Result;
use time::OffsetDateTime;

use crate::types::{Valset, ValsetConfirm};

/// Queries valsets and their confirmations from the Cosmos chain.
#[async_trait::async_trait]
pub trait ValsetSource: Send + Sync {
    /// Fetch the most recent valsets known to the Peggy module.
    /// No ordering is guaranteed.
    async fn latest_valsets(&self) -> Result<Vec<Valset>>;

    /// Fetch all confirmations submitted for the valset with the given nonce.
    /// An unconfirmed valset yields an empty list.
    async fn valset_confirms(&self, nonce: u64) -> Result<Vec<ValsetConfirm>>;
}

/// Queries block timestamps from the Cosmos chain.
#[async_trait::async_trait]
pub trait BlockTimeSource: Send + Sync {
    /// Fetch the timestamp of the block at the given height.
    async fn block_time(&self, height: u64) -> Result<OffsetDateTime>;
}

/// Reads and updates the valset state held by the Peggy contract on Ethereum.
#[async_trait::async_trait]
pub trait ValsetTarget: Send + Sync {
    /// The account the relayer reads and submits as.
    fn from_address(&self) -> Address;

    /// Materialize the valset the contract currently recognizes.
    async fn current_valset(&self) -> Result<Valset>;

    /// Read the valset nonce stored in the contract, calling as `account`.
    async fn valset_nonce(&self, account: Address) -> Result<u64>;

    /// Submit an update from `current` to `new`, backed by the given confirmations.
    /// Returns the hash of the broadcast transaction.
    async fn send_valset_update(
        &self,
        current: &Valset,
        new: &Valset,
        confirms: &[ValsetConfirm],
    ) -> Result<TxHash>;
}
