//! Library for relaying validator set updates from a Cosmos SDK chain running the Peggy module to
//! the Peggy contract on an Ethereum chain.
//!
//! The heart of the crate is [`sync::ValsetRelayer`], which decides on every invocation whether
//! the latest confirmed valset must be relayed and submits it at most once. The chains it talks to
//! are abstracted behind the traits in [`chain`], with production implementations in [`cosmos`]
//! and [`eth`].

#![deny(clippy::nursery, clippy::pedantic, missing_docs)]

pub mod chain;
pub mod clock;
pub mod config;
pub mod cosmos;
pub mod error;
pub mod eth;
pub mod sync;
pub mod types;
