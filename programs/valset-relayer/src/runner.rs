//! Drives sync rounds on a fixed interval until shutdown.

use std::{future::Future, time::Duration};

use tokio::time::{Instant, MissedTickBehavior};
use valset_relayer_lib::{
    chain::{BlockTimeSource, ValsetSource, ValsetTarget},
    clock::Clock,
    error::SyncError,
    sync::{SyncOutcome, ValsetRelayer},
};

use crate::metrics;

/// Runs a [`ValsetRelayer`] in a loop.
pub struct Runner<S, B, T, C> {
    relayer: ValsetRelayer<S, B, T, C>,
    loop_interval: Duration,
    sync_timeout: Duration,
}

impl<S, B, T, C> Runner<S, B, T, C>
where
    S: ValsetSource,
    B: BlockTimeSource,
    T: ValsetTarget,
    C: Clock,
{
    /// Create a new runner. A round starts every `loop_interval` and is aborted after
    /// `sync_timeout`.
    pub const fn new(
        relayer: ValsetRelayer<S, B, T, C>,
        loop_interval: Duration,
        sync_timeout: Duration,
    ) -> Self {
        Self {
            relayer,
            loop_interval,
            sync_timeout,
        }
    }

    /// Run a single sync round, logging and recording its outcome.
    /// # Errors
    /// Returns the error of the failed round. The runner itself never stops on errors.
    pub async fn run_round(&self) -> Result<SyncOutcome, SyncError> {
        let started = Instant::now();
        let result = self.relayer.sync(started + self.sync_timeout).await;
        metrics::record_round(&result, started.elapsed());

        match &result {
            Ok(SyncOutcome::Relayed { nonce, tx_hash }) => {
                tracing::info!(nonce, %tx_hash, "Relayed valset update to ethereum");
            }
            Ok(SyncOutcome::NoOp(reason)) => {
                tracing::debug!(reason = reason.as_str(), "{reason}");
            }
            Err(err) => {
                tracing::error!(step = err.step().as_str(), "Valset sync failed: {err:#}");
            }
        }

        result
    }

    /// Run rounds until `shutdown` resolves. The first round starts immediately.
    ///
    /// A round that is in flight when `shutdown` resolves is dropped.
    pub async fn run(&self, shutdown: impl Future<Output = ()> + Send) {
        let mut ticker = tokio::time::interval(self.loop_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(
            loop_interval = ?self.loop_interval,
            relay_offset = %self.relayer.relay_offset(),
            "Starting valset relayer"
        );

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = async {
                    ticker.tick().await;
                    let _ = self.run_round().await;
                } => {}
            }
        }

        tracing::info!("Valset relayer stopped");
    }
}
