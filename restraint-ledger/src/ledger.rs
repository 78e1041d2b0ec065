//! Main ledger orchestration layer
//!
//! [`Ledger`] ties the registry, restraint manager and transfer engine to a
//! store. Each public method is one invocation: it opens a [`Transaction`],
//! runs the operation, and commits the staged writes only if the operation
//! succeeded.
//!
//! # Example
//!
//! ```no_run
//! use restraint_ledger::{Config, Ledger};
//!
//! fn main() -> restraint_ledger::Result<()> {
//!     let ledger = Ledger::open(&Config::default())?;
//!
//!     ledger.register("user_a", "company A")?;
//!     ledger.recharge("user_a", "10000")?;
//!     assert_eq!(ledger.get_balance("user_a")?, "10000");
//!
//!     Ok(())
//! }
//! ```

use crate::{
    config::TransferConfig,
    metrics::Metrics,
    registry::{self, AccountInfo},
    restraint::Restraint,
    restraints,
    store::{KvStore, MemoryStore, RocksStore, Transaction},
    transfer, Config, Error, Result,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Main ledger interface
pub struct Ledger<S: KvStore = RocksStore> {
    /// Backing store
    store: Arc<S>,

    /// Transfer policy
    transfer_policy: TransferConfig,

    /// Invocation metrics
    metrics: Metrics,
}

impl Ledger<RocksStore> {
    /// Open a RocksDB-backed ledger
    pub fn open(config: &Config) -> Result<Self> {
        let store = RocksStore::open(config)?;
        Self::with_store(Arc::new(store), config)
    }
}

impl Ledger<MemoryStore> {
    /// Ledger over a fresh in-memory store with default configuration
    pub fn in_memory() -> Result<Self> {
        Self::with_store(Arc::new(MemoryStore::new()), &Config::default())
    }
}

impl<S: KvStore> Ledger<S> {
    /// Ledger over an existing store
    pub fn with_store(store: Arc<S>, config: &Config) -> Result<Self> {
        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to create metrics: {}", e)))?;

        Ok(Self {
            store,
            transfer_policy: config.transfer.clone(),
            metrics,
        })
    }

    /// Backing store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Invocation metrics
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Register an account with a zero balance
    pub fn register(&self, username: &str, extras: &str) -> Result<()> {
        self.execute("register", |tx| registry::register(tx, username, extras))?;
        tracing::info!(username, "Account registered");
        Ok(())
    }

    /// Account metadata
    pub fn get_user_info(&self, username: &str) -> Result<AccountInfo> {
        self.execute("getUserInfo", |tx| registry::get_info(tx, username))
    }

    /// Account info record exactly as stored
    pub fn get_user_info_raw(&self, username: &str) -> Result<Vec<u8>> {
        self.execute("getUserInfo", |tx| registry::get_info_raw(tx, username))
    }

    /// Canonical balance string
    pub fn get_balance(&self, username: &str) -> Result<String> {
        self.execute("getBalance", |tx| registry::get_balance(tx, username))
    }

    /// Credit a positive amount
    pub fn recharge(&self, username: &str, amount: &str) -> Result<()> {
        self.execute("recharge", |tx| transfer::recharge(tx, username, amount))?;
        tracing::info!(username, amount, "Balance recharged");
        Ok(())
    }

    /// Debit a positive amount, never below zero
    pub fn withdraw(&self, username: &str, amount: &str) -> Result<()> {
        self.execute("withdraw", |tx| transfer::withdraw(tx, username, amount))?;
        tracing::info!(username, amount, "Balance withdrawn");
        Ok(())
    }

    /// Set the restraint between `a` and `b` from a code (`0`..`3`)
    pub fn set_restraint(&self, a: &str, b: &str, code: &str) -> Result<()> {
        self.execute("setRestraint", |tx| restraints::set_restraint(tx, a, b, code))?;
        tracing::info!(username_a = a, username_b = b, restraint = code, "Restraint set");
        Ok(())
    }

    /// Materialized restraints of `username`, keyed by counterparty
    pub fn get_restraints_of_user(&self, username: &str) -> Result<BTreeMap<String, Restraint>> {
        self.execute("getRestraintsOfUser", |tx| {
            restraints::restraints_of(tx, username)
        })
    }

    /// Restraint between `a` and `b` as seen from `a`
    pub fn get_restraint_between_users(&self, a: &str, b: &str) -> Result<Restraint> {
        self.execute("getRestraintBetweenUsers", |tx| {
            restraints::get_restraint(tx, a, b)
        })
    }

    /// Transfer `amount` from `from` to `to`
    pub fn transfer(&self, from: &str, to: &str, amount: &str) -> Result<()> {
        let policy = &self.transfer_policy;
        self.execute("transfer", |tx| transfer::transfer(tx, from, to, amount, policy))?;
        tracing::info!(from, to, amount, "Transfer committed");
        Ok(())
    }

    /// Run one operation in its own transaction
    fn execute<T, F>(&self, operation: &'static str, op: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T>,
    {
        let started = Instant::now();
        let mut tx = Transaction::new(self.store.as_ref());

        let result = match op(&mut tx) {
            Ok(value) => tx.commit().map(|keys| {
                self.metrics.record_commit(keys);
                value
            }),
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => {
                tracing::warn!(operation, kind = e.kind(), error = %e, "Invocation rejected");
                e.kind()
            }
        };
        self.metrics
            .record_invocation(operation, outcome, started.elapsed().as_secs_f64());

        result
    }
}

impl<S: KvStore> fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("transfer_policy", &self.transfer_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_ledger() -> (Ledger, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        config.rocksdb.sync_writes = false;

        (Ledger::open(&config).unwrap(), temp_dir)
    }

    #[test]
    fn test_register_then_balance_is_zero() {
        let (ledger, _temp) = create_test_ledger();
        ledger.register("user_a", "company A").unwrap();
        assert_eq!(ledger.get_balance("user_a").unwrap(), "0");
        assert_eq!(ledger.get_user_info("user_a").unwrap().extras, "company A");
    }

    #[test]
    fn test_restraint_round_trip() {
        let (ledger, _temp) = create_test_ledger();
        ledger.register("a", "").unwrap();
        ledger.register("b", "").unwrap();
        ledger.set_restraint("a", "b", "1").unwrap();

        assert_eq!(ledger.get_restraint_between_users("a", "b").unwrap(), Restraint::Outbound);
        assert_eq!(ledger.get_restraint_between_users("b", "a").unwrap(), Restraint::Inbound);
        assert_eq!(
            ledger.get_restraints_of_user("b").unwrap(),
            BTreeMap::from([("a".to_string(), Restraint::Inbound)])
        );
    }

    #[test]
    fn test_transfer_conserves_value() {
        let (ledger, _temp) = create_test_ledger();
        ledger.register("a", "").unwrap();
        ledger.register("b", "").unwrap();
        ledger.set_restraint("a", "b", "3").unwrap();
        ledger.recharge("a", "10000").unwrap();

        ledger.transfer("a", "b", "1000").unwrap();
        assert_eq!(ledger.get_balance("a").unwrap(), "9000");
        assert_eq!(ledger.get_balance("b").unwrap(), "1000");

        ledger.transfer("b", "a", "100.123").unwrap();
        assert_eq!(ledger.get_balance("a").unwrap(), "9100.123");
        assert_eq!(ledger.get_balance("b").unwrap(), "899.877");
    }

    #[test]
    fn test_metrics_track_outcomes() {
        let ledger = Ledger::in_memory().unwrap();
        ledger.register("a", "").unwrap();
        assert!(ledger.register("a", "").is_err());
        assert!(ledger.get_balance("missing").is_err());

        let metrics = ledger.metrics();
        assert_eq!(metrics.invocation_count("register", "ok"), 1);
        assert_eq!(metrics.invocation_count("register", "AlreadyExists"), 1);
        assert_eq!(metrics.invocation_count("getBalance", "NotFound"), 1);
        assert_eq!(metrics.keys_written.get(), 2);
    }

    #[test]
    fn test_strict_transfer_policy() {
        let mut config = Config::default();
        config.transfer.reject_non_positive_amounts = true;
        let ledger = Ledger::with_store(Arc::new(MemoryStore::new()), &config).unwrap();

        ledger.register("a", "").unwrap();
        ledger.register("b", "").unwrap();
        ledger.set_restraint("a", "b", "1").unwrap();

        assert!(matches!(ledger.transfer("a", "b", "0"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_failed_invocation_leaves_store_untouched() {
        let ledger = Ledger::in_memory().unwrap();
        ledger.register("a", "").unwrap();
        ledger.register("b", "").unwrap();
        ledger.recharge("a", "5").unwrap();
        let before = ledger.store().snapshot();

        assert!(ledger.transfer("a", "b", "1").is_err());
        assert!(ledger.withdraw("a", "6").is_err());
        assert!(ledger.set_restraint("a", "ghost", "3").is_err());

        assert_eq!(ledger.store().snapshot(), before);
    }
}
