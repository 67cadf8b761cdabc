//! The valset relayer binary: configuration, observability, metrics and the relaying loop built
//! on top of `valset-relayer-lib`.

#![deny(clippy::nursery, clippy::pedantic, missing_docs)]

pub mod cli;
pub mod config;
pub mod metrics;
pub mod observability;
pub mod runner;
