//! Restraint Ledger
//!
//! Named accounts with exact decimal balances, and a directed permission
//! ("restraint") between every pair of accounts that must be granted before
//! value can move between them.
//!
//! # Architecture
//!
//! - **Flat key space**: accounts, balances and restraints are composite keys
//!   in one byte-keyed store (see [`keys`])
//! - **Staged writes**: each operation stages its writes in a transaction and
//!   commits them atomically, or not at all
//! - **Single writer**: concurrent callers are serialized by an actor
//!
//! # Invariants
//!
//! - Balances never go negative, and a transfer conserves the sum of the two
//!   balances it touches
//! - The `(a, b)` and `(b, a)` restraint records are always mirror images, or
//!   both absent
//! - An account's info and balance records exist together or not at all
//! - A failed operation leaves state unchanged

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod config;
pub mod decimal;
pub mod dispatch;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod metrics;
pub mod registry;
pub mod restraint;
pub mod restraints;
pub mod store;
pub mod transfer;

// Re-exports
pub use config::Config;
pub use decimal::Amount;
pub use dispatch::{dispatch, invoke, Operation, Response, Status};
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use registry::AccountInfo;
pub use restraint::{Direction, Restraint};
pub use store::{KvStore, MemoryStore, RocksStore};
