//! Errors returned by a valset sync round.

use std::{fmt, future::Future};

use thiserror::Error;
use tokio::time::Instant;

/// The collaborator call a sync round was performing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyncStep {
    /// Fetching the latest valsets from Cosmos.
    LatestValsets,
    /// Fetching the confirmations of a valset from Cosmos.
    ValsetConfirms,
    /// Materializing the current valset recognized on Ethereum.
    TargetValset,
    /// Reading the live valset nonce from the Peggy contract.
    TargetNonce,
    /// Fetching the Cosmos block time of the valset.
    BlockTime,
    /// Broadcasting the valset update transaction.
    SendValsetUpdate,
}

impl SyncStep {
    /// Returns a stable label for the step, used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LatestValsets => "latest_valsets",
            Self::ValsetConfirms => "valset_confirms",
            Self::TargetValset => "target_valset",
            Self::TargetNonce => "target_nonce",
            Self::BlockTime => "block_time",
            Self::SendValsetUpdate => "send_valset_update",
        }
    }
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed sync round. Each variant names the step that failed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The latest valsets could not be fetched from Cosmos.
    #[error("failed to fetch latest valsets from cosmos")]
    LatestValsets(#[source] anyhow::Error),
    /// The confirmations of a valset could not be fetched from Cosmos.
    #[error("failed to get valset confirms at nonce {nonce}")]
    ValsetConfirms {
        /// The nonce of the queried valset.
        nonce: u64,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },
    /// The current valset could not be materialized from Ethereum.
    #[error("couldn't find latest confirmed valset on ethereum")]
    TargetValset(#[source] anyhow::Error),
    /// The live valset nonce could not be read from the Peggy contract.
    #[error("failed to get latest valset nonce from ethereum")]
    TargetNonce(#[source] anyhow::Error),
    /// The creation time of a valset could not be fetched from Cosmos.
    #[error("failed to get cosmos block at height {height}")]
    BlockTime {
        /// The queried block height.
        height: u64,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },
    /// The valset update was rejected or could not be broadcast.
    #[error("failed to send valset update for nonce {nonce}")]
    SendValsetUpdate {
        /// The nonce of the valset being relayed.
        nonce: u64,
        /// The underlying failure.
        #[source]
        source: anyhow::Error,
    },
    /// The round deadline passed while a collaborator call was in flight.
    #[error("deadline exceeded during {step}")]
    DeadlineExceeded {
        /// The step that was in flight.
        step: SyncStep,
    },
}

impl SyncError {
    /// Returns the step that produced the error.
    #[must_use]
    pub const fn step(&self) -> SyncStep {
        match self {
            Self::LatestValsets(_) => SyncStep::LatestValsets,
            Self::ValsetConfirms { .. } => SyncStep::ValsetConfirms,
            Self::TargetValset(_) => SyncStep::TargetValset,
            Self::TargetNonce(_) => SyncStep::TargetNonce,
            Self::BlockTime { .. } => SyncStep::BlockTime,
            Self::SendValsetUpdate { .. } => SyncStep::SendValsetUpdate,
            Self::DeadlineExceeded { step } => *step,
        }
    }

    /// Returns true if the round was aborted by its deadline.
    #[must_use]
    pub const fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }
}

/// Run `fut` until `deadline`.
///
/// The outer result reports the deadline, the inner one is the collaborator's own result.
/// When the deadline passes the collaborator future is dropped, cancelling the call.
pub(crate) async fn until_deadline<T, F>(
    deadline: Instant,
    step: SyncStep,
    fut: F,
) -> Result<anyhow::Result<T>, SyncError>
where
    F: Future<Output = anyhow::Result<T>> + Send,
    T: Send,
{
    tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| SyncError::DeadlineExceeded { step })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn error_messages_name_the_failing_dependency() {
        let err = SyncError::ValsetConfirms {
            nonce: 7,
            source: anyhow::anyhow!("connection refused"),
        };
        assert_eq!(err.to_string(), "failed to get valset confirms at nonce 7");
        assert_eq!(err.step(), SyncStep::ValsetConfirms);

        let chain = format!("{:#}", anyhow::Error::from(err));
        assert!(chain.contains("connection refused"));
    }

    #[test]
    fn deadline_error_reports_step_in_flight() {
        let err = SyncError::DeadlineExceeded {
            step: SyncStep::BlockTime,
        };
        assert!(err.is_deadline_exceeded());
        assert_eq!(err.step(), SyncStep::BlockTime);
        assert_eq!(err.to_string(), "deadline exceeded during block_time");
    }

    #[tokio::test(start_paused = true)]
    async fn until_deadline_cancels_slow_calls() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let res = until_deadline(deadline, SyncStep::TargetNonce, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1_u64)
        })
        .await;

        assert!(matches!(
            res,
            Err(SyncError::DeadlineExceeded {
                step: SyncStep::TargetNonce
            })
        ));
    }

    #[tokio::test]
    async fn until_deadline_passes_through_inner_result() {
        let deadline = Instant::now() + Duration::from_secs(5);
        let res = until_deadline(deadline, SyncStep::TargetNonce, async {
            Err::<u64, _>(anyhow::anyhow!("rpc down"))
        })
        .await
        .unwrap();

        assert_eq!(res.unwrap_err().to_string(), "rpc down");
    }
}
