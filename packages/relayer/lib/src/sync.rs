//! This module defines [`ValsetRelayer`], which decides whether the latest confirmed Cosmos valset
//! has to be relayed to the Peggy contract and submits it when it is both needed and safe.

use std::fmt;

use alloy::primitives::TxHash;
use time::OffsetDateTime;
use tokio::time::Instant;

use crate::{
    chain::{BlockTimeSource, ValsetSource, ValsetTarget},
    clock::{Clock, SystemClock},
    config::RelayOffset,
    error::{until_deadline, SyncError, SyncStep},
    types::{Valset, ValsetConfirm},
};

/// The result of a sync round that did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing was submitted.
    NoOp(NoOpReason),
    /// A valset update transaction was broadcast.
    Relayed {
        /// The nonce of the relayed valset.
        nonce: u64,
        /// The hash of the update transaction.
        tx_hash: TxHash,
    },
}

/// Why a sync round decided not to submit anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NoOpReason {
    /// No known valset has a single confirmation.
    NothingConfirmed,
    /// The valset recognized on Ethereum is at least as recent as the latest confirmed one.
    AlreadyCurrent {
        /// The nonce of the latest confirmed Cosmos valset.
        confirmed_nonce: u64,
        /// The nonce of the valset recognized on Ethereum.
        target_nonce: u64,
    },
    /// The live contract nonce shows the valset was relayed by another submitter.
    Raced {
        /// The nonce of the latest confirmed Cosmos valset.
        confirmed_nonce: u64,
        /// The nonce read from the contract storage.
        live_nonce: u64,
    },
    /// The relay offset has not elapsed since the valset was created.
    DelayWindowNotElapsed {
        /// The nonce of the latest confirmed Cosmos valset.
        confirmed_nonce: u64,
        /// The earliest time the valset may be relayed.
        eligible_at: Option<OffsetDateTime>,
    },
}

impl NoOpReason {
    /// Returns a stable label for the reason, used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NothingConfirmed => "nothing_confirmed",
            Self::AlreadyCurrent { .. } => "already_current",
            Self::Raced { .. } => "raced",
            Self::DelayWindowNotElapsed { .. } => "delay_window_not_elapsed",
        }
    }
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingConfirmed => write!(f, "no confirmed valsets found, nothing to relay"),
            Self::AlreadyCurrent {
                confirmed_nonce,
                target_nonce,
            } => write!(
                f,
                "ethereum already at valset nonce {target_nonce} \
                 (latest confirmed {confirmed_nonce})"
            ),
            Self::Raced {
                confirmed_nonce,
                live_nonce,
            } => write!(
                f,
                "valset {confirmed_nonce} already relayed by another submitter \
                 (contract nonce {live_nonce})"
            ),
            Self::DelayWindowNotElapsed {
                confirmed_nonce,
                eligible_at: Some(eligible_at),
            } => write!(
                f,
                "valset {confirmed_nonce} not eligible for relaying until {eligible_at}"
            ),
            Self::DelayWindowNotElapsed {
                confirmed_nonce,
                eligible_at: None,
            } => write!(f, "valset {confirmed_nonce} relay offset is out of range"),
        }
    }
}

/// Relays validator set updates from Cosmos to the Peggy contract.
///
/// The relayer keeps no state between rounds: each call to [`ValsetRelayer::sync`] re-reads both
/// chains and passes through the following gates, stopping at the first one that fails:
/// - the most recent valset with at least one confirmation is selected;
/// - its nonce must be greater than the nonce of the valset recognized on Ethereum;
/// - its nonce must be greater than the live nonce in the contract storage, which guards against
///   another relayer having submitted the same update in the meantime;
/// - the relay offset must have elapsed since the valset's Cosmos block time.
///
/// Only then is the update submitted, at most once per round and without retries. Retrying is
/// left to whoever schedules the rounds.
pub struct ValsetRelayer<S, B, T, C = SystemClock> {
    valset_source: S,
    block_time_source: B,
    target: T,
    clock: C,
    relay_offset: RelayOffset,
}

impl<S, B, T> ValsetRelayer<S, B, T>
where
    S: ValsetSource,
    B: BlockTimeSource,
    T: ValsetTarget,
{
    /// Create a new [`ValsetRelayer`] using the system clock.
    pub const fn new(
        valset_source: S,
        block_time_source: B,
        target: T,
        relay_offset: RelayOffset,
    ) -> Self {
        Self::with_clock(
            valset_source,
            block_time_source,
            target,
            SystemClock,
            relay_offset,
        )
    }
}

impl<S, B, T, C> ValsetRelayer<S, B, T, C>
where
    S: ValsetSource,
    B: BlockTimeSource,
    T: ValsetTarget,
    C: Clock,
{
    /// Create a new [`ValsetRelayer`] with a custom clock.
    pub const fn with_clock(
        valset_source: S,
        block_time_source: B,
        target: T,
        clock: C,
        relay_offset: RelayOffset,
    ) -> Self {
        Self {
            valset_source,
            block_time_source,
            target,
            clock,
            relay_offset,
        }
    }

    /// The configured relay offset.
    pub const fn relay_offset(&self) -> RelayOffset {
        self.relay_offset
    }

    /// Run one sync round. Every collaborator call is bounded by `deadline`.
    ///
    /// # Errors
    /// Returns an error naming the failing step if any chain query fails, if the deadline passes,
    /// or if the update transaction cannot be submitted. No-op decisions are not errors.
    #[tracing::instrument(skip_all)]
    pub async fn sync(&self, deadline: Instant) -> Result<SyncOutcome, SyncError> {
        let Some((latest_confirmed, confirms)) = self.latest_confirmed(deadline).await? else {
            return Ok(SyncOutcome::NoOp(NoOpReason::NothingConfirmed));
        };

        let current_valset = until_deadline(
            deadline,
            SyncStep::TargetValset,
            self.target.current_valset(),
        )
        .await?
        .map_err(SyncError::TargetValset)?;

        tracing::debug!(
            target_nonce = current_valset.nonce,
            confirmed_nonce = latest_confirmed.nonce,
            "Found latest valsets"
        );

        if latest_confirmed.nonce <= current_valset.nonce {
            return Ok(SyncOutcome::NoOp(NoOpReason::AlreadyCurrent {
                confirmed_nonce: latest_confirmed.nonce,
                target_nonce: current_valset.nonce,
            }));
        }

        let live_nonce = until_deadline(
            deadline,
            SyncStep::TargetNonce,
            self.target.valset_nonce(self.target.from_address()),
        )
        .await?
        .map_err(SyncError::TargetNonce)?;

        if latest_confirmed.nonce <= live_nonce {
            return Ok(SyncOutcome::NoOp(NoOpReason::Raced {
                confirmed_nonce: latest_confirmed.nonce,
                live_nonce,
            }));
        }

        let created_at = until_deadline(
            deadline,
            SyncStep::BlockTime,
            self.block_time_source.block_time(latest_confirmed.height),
        )
        .await?
        .map_err(|source| SyncError::BlockTime {
            height: latest_confirmed.height,
            source,
        })?;

        let eligible_at = self.eligible_at(created_at);
        if !eligible_at.is_some_and(|eligible_at| self.clock.now() > eligible_at) {
            return Ok(SyncOutcome::NoOp(NoOpReason::DelayWindowNotElapsed {
                confirmed_nonce: latest_confirmed.nonce,
                eligible_at,
            }));
        }

        tracing::debug!(
            confirmed_nonce = latest_confirmed.nonce,
            live_nonce,
            "Sending valset update to ethereum"
        );

        let tx_hash = until_deadline(
            deadline,
            SyncStep::SendValsetUpdate,
            self.target
                .send_valset_update(&current_valset, &latest_confirmed, &confirms),
        )
        .await?
        .map_err(|source| SyncError::SendValsetUpdate {
            nonce: latest_confirmed.nonce,
            source,
        })?;

        Ok(SyncOutcome::Relayed {
            nonce: latest_confirmed.nonce,
            tx_hash,
        })
    }

    /// Find the most recent valset that has at least one confirmation.
    async fn latest_confirmed(
        &self,
        deadline: Instant,
    ) -> Result<Option<(Valset, Vec<ValsetConfirm>)>, SyncError> {
        let mut valsets = until_deadline(
            deadline,
            SyncStep::LatestValsets,
            self.valset_source.latest_valsets(),
        )
        .await?
        .map_err(SyncError::LatestValsets)?;

        valsets.sort_unstable_by(|a, b| b.nonce.cmp(&a.nonce));

        for valset in valsets {
            let confirms = until_deadline(
                deadline,
                SyncStep::ValsetConfirms,
                self.valset_source.valset_confirms(valset.nonce),
            )
            .await?
            .map_err(|source| SyncError::ValsetConfirms {
                nonce: valset.nonce,
                source,
            })?;

            if !confirms.is_empty() {
                return Ok(Some((valset, confirms)));
            }
        }

        Ok(None)
    }

    /// The earliest time a valset created at `created_at` may be relayed.
    /// `None` if the offset pushes it out of the representable range.
    fn eligible_at(&self, created_at: OffsetDateTime) -> Option<OffsetDateTime> {
        let offset = time::Duration::try_from(self.relay_offset.as_duration()).ok()?;
        created_at.checked_add(offset)
    }
}
