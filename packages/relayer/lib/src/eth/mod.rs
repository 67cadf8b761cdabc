//! Reads and updates the valset state of the Peggy contract on Ethereum.

pub mod peggy;
pub mod signatures;

use std::str::FromStr;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::Filter,
    signers::local::PrivateKeySigner,
    sol_types::SolEvent,
};
use anyhow::{anyhow, Context, Result};

use crate::{
    chain::ValsetTarget,
    types::{Valset, ValsetConfirm, ValsetMember},
};

use peggy::Peggy::{self, PeggyInstance, ValsetUpdatedEvent};
use signatures::{order_signatures, valset_args};

/// The default number of blocks covered by a single log query.
pub const DEFAULT_BLOCKS_TO_SEARCH: u64 = 2000;

/// The Peggy contract, accessed through an alloy provider.
pub struct PeggyContract<P: Provider> {
    peggy: PeggyInstance<P>,
    from_address: Address,
    blocks_to_search: u64,
}

impl<P: Provider> PeggyContract<P> {
    /// Create a new `PeggyContract`.
    ///
    /// `from_address` must be the account the provider signs transactions with.
    #[must_use]
    pub fn new(
        peggy_address: Address,
        provider: P,
        from_address: Address,
        blocks_to_search: u64,
    ) -> Self {
        Self {
            peggy: Peggy::new(peggy_address, provider),
            from_address,
            blocks_to_search: blocks_to_search.max(1),
        }
    }

    /// The address of the Peggy contract.
    #[must_use]
    pub fn address(&self) -> Address {
        *self.peggy.address()
    }
}

impl PeggyContract<DynProvider> {
    /// Connect to `eth_rpc_url` with a wallet holding `private_key`.
    /// # Errors
    /// Returns an error if the key is invalid or the provider cannot be created.
    pub async fn connect(
        eth_rpc_url: &str,
        peggy_address: Address,
        private_key: &str,
        blocks_to_search: u64,
    ) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.trim_start_matches("0x"))
            .context("invalid ethereum private key")?;
        let from_address = signer.address();

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(eth_rpc_url)
            .await
            .map_err(|e| anyhow!("failed to create ethereum provider: {e}"))?
            .erased();

        Ok(Self::new(
            peggy_address,
            provider,
            from_address,
            blocks_to_search,
        ))
    }
}

/// Yields inclusive `(from, to)` block ranges of at most `size` blocks, walking back from `latest`
/// to genesis.
fn search_windows(latest: u64, size: u64) -> impl Iterator<Item = (u64, u64)> {
    let size = size.max(1);
    std::iter::successors(Some(latest), move |&to| {
        let from = to.saturating_sub(size - 1);
        from.checked_sub(1)
    })
    .map(move |to| (to.saturating_sub(size - 1), to))
}

fn u256_to_u64(value: U256, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{what} {value} does not fit in u64"))
}

impl TryFrom<ValsetUpdatedEvent> for Valset {
    type Error = anyhow::Error;

    fn try_from(event: ValsetUpdatedEvent) -> Result<Self, Self::Error> {
        anyhow::ensure!(
            event._validators.len() == event._powers.len(),
            "valset update event has {} validators but {} powers",
            event._validators.len(),
            event._powers.len()
        );

        let members = event
            ._validators
            .into_iter()
            .zip(event._powers)
            .map(|(eth_address, power)| {
                Ok(ValsetMember {
                    eth_address,
                    power: u256_to_u64(power, "validator power")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            nonce: u256_to_u64(event._newValsetNonce, "valset nonce")?,
            // Ethereum knows nothing about the cosmos height of the valset.
            height: 0,
            members,
            reward_amount: event._rewardAmount,
            reward_token: event._rewardToken,
        })
    }
}

/// Picks the valset with the highest nonce out of a batch of decoded events.
fn latest_from_events(
    events: impl IntoIterator<Item = ValsetUpdatedEvent>,
) -> Result<Option<Valset>> {
    let mut latest: Option<Valset> = None;
    for event in events {
        let valset = Valset::try_from(event)?;
        if latest.as_ref().is_none_or(|l| valset.nonce > l.nonce) {
            latest = Some(valset);
        }
    }
    Ok(latest)
}

#[async_trait::async_trait]
impl<P: Provider> ValsetTarget for PeggyContract<P> {
    fn from_address(&self) -> Address {
        self.from_address
    }

    #[tracing::instrument(skip_all, fields(peggy = %self.address()))]
    async fn current_valset(&self) -> Result<Valset> {
        let latest_block = self.peggy.provider().get_block_number().await?;

        for (from, to) in search_windows(latest_block, self.blocks_to_search) {
            tracing::debug!(from, to, "Searching for valset update events");

            let filter = Filter::new()
                .address(self.address())
                .event_signature(ValsetUpdatedEvent::SIGNATURE_HASH)
                .from_block(from)
                .to_block(to);

            let events = self
                .peggy
                .provider()
                .get_logs(&filter)
                .await?
                .iter()
                .map(|log| Ok(log.log_decode::<ValsetUpdatedEvent>()?.inner.data))
                .collect::<Result<Vec<_>>>()?;

            if let Some(valset) = latest_from_events(events)? {
                return Ok(valset);
            }
        }

        Err(anyhow!(
            "no valset update event found on peggy contract {}",
            self.address()
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn valset_nonce(&self, account: Address) -> Result<u64> {
        let nonce = self.peggy.state_lastValsetNonce().from(account).call().await?;
        u256_to_u64(nonce, "valset nonce")
    }

    #[tracing::instrument(skip_all, fields(current = current.nonce, new = new.nonce))]
    async fn send_valset_update(
        &self,
        current: &Valset,
        new: &Valset,
        confirms: &[ValsetConfirm],
    ) -> Result<TxHash> {
        let sigs = order_signatures(current, confirms)?;

        let pending = self
            .peggy
            .updateValset(valset_args(new), valset_args(current), sigs.v, sigs.r, sigs.s)
            .from(self.from_address)
            .send()
            .await?;

        let tx_hash = *pending.tx_hash();
        tracing::info!(%tx_hash, "Sent valset update to ethereum");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;
    use rstest::rstest;

    use super::*;

    fn event(nonce: u64, validators: Vec<Address>, powers: Vec<u64>) -> ValsetUpdatedEvent {
        ValsetUpdatedEvent {
            _newValsetNonce: U256::from(nonce),
            _eventNonce: U256::from(nonce + 100),
            _rewardAmount: U256::ZERO,
            _rewardToken: Address::ZERO,
            _validators: validators,
            _powers: powers.into_iter().map(U256::from).collect(),
        }
    }

    #[rstest]
    #[case::single_window(100, 2000, vec![(0, 100)])]
    #[case::exact_split(5999, 2000, vec![(4000, 5999), (2000, 3999), (0, 1999)])]
    #[case::partial_last(4500, 2000, vec![(2501, 4500), (501, 2500), (0, 500)])]
    #[case::genesis(0, 10, vec![(0, 0)])]
    fn windows_cover_chain_without_overlap(
        #[case] latest: u64,
        #[case] size: u64,
        #[case] expected: Vec<(u64, u64)>,
    ) {
        assert_eq!(search_windows(latest, size).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn picks_highest_nonce_in_window() {
        let events = vec![
            event(3, vec![Address::repeat_byte(1)], vec![10]),
            event(5, vec![Address::repeat_byte(2)], vec![20]),
            event(4, vec![Address::repeat_byte(3)], vec![30]),
        ];

        let valset = latest_from_events(events).unwrap().unwrap();

        assert_eq!(valset.nonce, 5);
        assert_eq!(valset.height, 0);
        assert_eq!(valset.validators(), vec![Address::repeat_byte(2)]);
        assert_eq!(valset.powers(), vec![U256::from(20)]);
    }

    #[test]
    fn empty_window_yields_nothing() {
        assert_eq!(latest_from_events(Vec::new()).unwrap(), None);
    }

    #[test]
    fn rejects_mismatched_members() {
        let err = Valset::try_from(event(1, vec![Address::ZERO], vec![1, 2])).unwrap_err();
        assert!(err.to_string().contains("1 validators but 2 powers"));
    }

    #[test]
    fn rejects_nonce_overflow() {
        let mut bad = event(1, vec![], vec![]);
        bad._newValsetNonce = U256::MAX;

        assert!(Valset::try_from(bad).is_err());
    }
}
