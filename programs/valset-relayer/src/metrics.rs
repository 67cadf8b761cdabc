//! Prometheus metrics for the valset relayer.

use std::{net::SocketAddr, sync::LazyLock, time::Duration};

use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge, TextEncoder,
};
use valset_relayer_lib::{error::SyncError, sync::SyncOutcome};
use warp::Filter;

/// Sync rounds, by outcome (`relayed`, a no-op reason, or `error`).
pub static SYNC_ROUNDS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "valset_relayer_sync_rounds_total",
        "Total number of valset sync rounds by outcome",
        &["outcome"]
    )
    .expect("metric is registered once")
});

/// Failed sync rounds, by the step that failed.
pub static SYNC_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "valset_relayer_sync_errors_total",
        "Total number of failed valset sync rounds by step",
        &["step", "deadline_exceeded"]
    )
    .expect("metric is registered once")
});

/// Sync round duration in seconds.
pub static SYNC_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "valset_relayer_sync_duration_seconds",
        "Valset sync round duration in seconds"
    )
    .expect("metric is registered once")
});

/// Nonce of the last valset this process relayed.
pub static LAST_RELAYED_NONCE: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge!(
        "valset_relayer_last_relayed_nonce",
        "Nonce of the last valset relayed to ethereum"
    )
    .expect("metric is registered once")
});

/// Record the result of a sync round.
pub fn record_round(result: &Result<SyncOutcome, SyncError>, elapsed: Duration) {
    SYNC_DURATION.observe(elapsed.as_secs_f64());

    match result {
        Ok(SyncOutcome::Relayed { nonce, .. }) => {
            SYNC_ROUNDS.with_label_values(&["relayed"]).inc();
            LAST_RELAYED_NONCE.set(i64::try_from(*nonce).unwrap_or(i64::MAX));
        }
        Ok(SyncOutcome::NoOp(reason)) => {
            SYNC_ROUNDS.with_label_values(&[reason.as_str()]).inc();
        }
        Err(err) => {
            SYNC_ROUNDS.with_label_values(&["error"]).inc();
            SYNC_ERRORS
                .with_label_values(&[
                    err.step().as_str(),
                    if err.is_deadline_exceeded() { "true" } else { "false" },
                ])
                .inc();
        }
    }
}

/// Encode all registered metrics in the prometheus text format.
#[must_use]
pub fn encode() -> String {
    TextEncoder::new()
        .encode_to_string(&prometheus::gather())
        .unwrap_or_else(|e| format!("# failed to encode metrics: {e}\n"))
}

/// Serve the metrics at `http://{addr}/metrics` until the task is dropped.
pub async fn serve(addr: SocketAddr) {
    let metrics_route = warp::path("metrics".to_string()).map(encode);

    tracing::info!("Metrics available at http://{addr}/metrics");
    warp::serve(metrics_route).run(addr).await;
}
