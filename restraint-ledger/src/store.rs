//! Key-value storage backends
//!
//! The ledger needs four things from its store: point reads, ordered prefix
//! scans, and atomic commit of a set of puts and deletes. [`KvStore`] is that
//! contract; [`RocksStore`] backs it with RocksDB and [`MemoryStore`] with an
//! in-process `BTreeMap`.
//!
//! Operations never write to the store directly. They run inside a
//! [`Transaction`] which reads committed state and stages writes in a
//! [`WriteSet`]; the set is committed in one call or dropped.
//!
//! # Column Families
//!
//! - `world_state` - every composite key (see [`crate::keys`])

use crate::{
    error::{Error, Result},
    Config,
};
use parking_lot::RwLock;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch,
    WriteOptions, DB,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Column family holding all ledger state
const CF_WORLD_STATE: &str = "world_state";

/// Key-value pair returned by prefix scans
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Staged mutation of a single key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Set the key to a value
    Put(Vec<u8>),
    /// Remove the key (no-op if absent)
    Delete,
}

/// Writes staged by one invocation.
///
/// A later write to the same key replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    ops: BTreeMap<Vec<u8>, WriteOp>,
}

impl WriteSet {
    /// Empty write set
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a put
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.insert(key, WriteOp::Put(value));
    }

    /// Stage a delete
    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.insert(key, WriteOp::Delete);
    }

    /// Number of staged keys
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True if nothing is staged
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Staged operation for `key`, if any
    pub fn get(&self, key: &[u8]) -> Option<&WriteOp> {
        self.ops.get(key)
    }

    /// Staged operations in key order
    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &WriteOp)> {
        self.ops.iter()
    }
}

/// Byte-keyed store with atomic multi-key commit
pub trait KvStore: Send + Sync {
    /// Read a key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// All entries whose key starts with `prefix`, in ascending key order
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>>;

    /// Apply every staged write, all or nothing
    fn write(&self, writes: WriteSet) -> Result<()>;

    /// Write a single key
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut writes = WriteSet::new();
        writes.put(key.to_vec(), value.to_vec());
        self.write(writes)
    }

    /// Delete a single key
    fn delete(&self, key: &[u8]) -> Result<()> {
        let mut writes = WriteSet::new();
        writes.delete(key.to_vec());
        self.write(writes)
    }
}

/// Per-invocation view of the store.
///
/// Reads always see committed state, never this transaction's own staged
/// writes: an operation reads everything it needs before it writes.
pub struct Transaction<'a> {
    store: &'a dyn KvStore,
    writes: WriteSet,
}

impl<'a> Transaction<'a> {
    /// Begin a transaction over `store`
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self {
            store,
            writes: WriteSet::new(),
        }
    }

    /// Read a committed key
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.store.get(key)
    }

    /// True if the key is present in committed state
    pub fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.store.get(key)?.is_some())
    }

    /// Prefix scan over committed state
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        self.store.scan_prefix(prefix)
    }

    /// Stage a put
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.put(key, value);
    }

    /// Stage a delete
    pub fn delete(&mut self, key: Vec<u8>) {
        self.writes.delete(key);
    }

    /// Writes staged so far
    pub fn writes(&self) -> &WriteSet {
        &self.writes
    }

    /// Commit staged writes atomically. Returns the number of keys written.
    pub fn commit(self) -> Result<usize> {
        let count = self.writes.len();
        if count > 0 {
            self.store.write(self.writes)?;
        }
        Ok(count)
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("staged", &self.writes.len())
            .finish()
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every entry, for state comparisons
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.entries.read().clone()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn write(&self, writes: WriteSet) -> Result<()> {
        let mut entries = self.entries.write();
        for (key, op) in writes.ops {
            match op {
                WriteOp::Put(value) => {
                    entries.insert(key, value);
                }
                WriteOp::Delete => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// RocksDB-backed store
pub struct RocksStore {
    db: Arc<DB>,
    sync_writes: bool,
}

impl RocksStore {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(
            CF_WORLD_STATE,
            Self::cf_options_world_state(),
        )];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB world state");

        Ok(Self {
            db: Arc::new(db),
            sync_writes: config.rocksdb.sync_writes,
        })
    }

    fn cf_options_world_state() -> Options {
        let mut opts = Options::default();
        // Point reads dominate, bloom filters pay off
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_handle(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_WORLD_STATE)
            .ok_or_else(|| Error::Store(format!("Column family {} not found", CF_WORLD_STATE)))
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

impl fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RocksStore")
            .field("path", &self.db.path())
            .field("sync_writes", &self.sync_writes)
            .finish()
    }
}

impl KvStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_handle()?;
        Ok(self.db.get_cf(cf, key)?)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        let cf = self.cf_handle()?;
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut entries = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push((key.into_vec(), value.into_vec()));
        }

        Ok(entries)
    }

    fn write(&self, writes: WriteSet) -> Result<()> {
        let cf = self.cf_handle()?;
        let mut batch = WriteBatch::default();

        for (key, op) in &writes.ops {
            match op {
                WriteOp::Put(value) => batch.put_cf(cf, key, value),
                WriteOp::Delete => batch.delete_cf(cf, key),
            }
        }

        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);

        // Atomic commit
        self.db.write_opt(batch, &opts)?;

        tracing::debug!(keys = writes.len(), "Write set committed");

        Ok(())
    }
}
