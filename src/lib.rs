//! ProbeTable: an open-addressing hash table with pluggable probing and
//! incremental rehashing. A resize never moves more than a quarter of the
//! retiring table per call, so no single operation pays for a full rebuild.

use std::fmt;

use tracing::{debug, trace, warn};

pub mod config;
pub mod error;
pub mod prime;
pub mod probe;
pub mod record;

pub use config::TableConfig;
pub use error::{ProbeError, Result};
pub use probe::{default_hash, next_probe, HashFn, ProbePolicy};
pub use record::{Record, Slot};

use prime::{clamp_capacity, next_prime};

/// Smallest capacity a table may have.
pub const MINPRIME: usize = 101;
/// Largest capacity a table may have.
pub const MAXPRIME: usize = 99991;
/// Smallest accepted record id.
pub const MINID: i32 = 1000;
/// Largest accepted record id.
pub const MAXID: i32 = 9999;

/// Load factor above which an insert starts a migration.
pub const LOAD_FACTOR_LIMIT: f64 = 0.5;
/// Tombstone ratio above which a remove starts a migration.
pub const DELETED_RATIO_LIMIT: f64 = 0.8;
/// Share of the retiring table's live entries moved per rehash step.
pub const MIGRATION_FRACTION: f64 = 0.25;
/// New capacity is the next prime above `GROWTH_FACTOR * live`.
const GROWTH_FACTOR: usize = 4;

#[derive(Clone, Debug)]
struct Table {
    slots: Vec<Slot>,
    size: usize,
    num_deleted: usize,
    policy: ProbePolicy,
}

impl Table {
    fn new(capacity: usize, policy: ProbePolicy) -> Self {
        Self {
            slots: vec![Slot::Empty; capacity],
            size: 0,
            num_deleted: 0,
            policy,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index of the slot holding `key`/`id`, stopping at the first `Empty`.
    fn find_index(&self, hash: u64, key: &str, id: i32) -> Option<usize> {
        let cap = self.capacity();
        for i in 0..cap {
            let idx = next_probe(self.policy, hash, i, cap)?;
            match &self.slots[idx] {
                Slot::Empty => return None,
                Slot::Occupied(r) if r.matches(key, id) => return Some(idx),
                Slot::Occupied(_) | Slot::Deleted => {}
            }
        }
        None
    }

    /// Stores `record` in the first vacant slot of its probe sequence.
    /// Does not look for duplicates.
    fn place(&mut self, hash: u64, record: Record) -> Result<usize> {
        let cap = self.capacity();
        for i in 0..cap {
            let Some(idx) = next_probe(self.policy, hash, i, cap) else {
                return Err(ProbeError::Collision {
                    home: (hash % cap as u64) as usize,
                    policy: self.policy,
                });
            };
            let slot = &mut self.slots[idx];
            if slot.is_vacant() {
                if matches!(slot, Slot::Deleted) {
                    self.num_deleted -= 1;
                }
                *slot = Slot::Occupied(record);
                self.size += 1;
                return Ok(idx);
            }
        }
        Err(ProbeError::ProbeExhausted {
            probes: cap,
            capacity: cap,
        })
    }

    /// Replaces an occupied slot with a tombstone and hands back its record.
    fn tombstone(&mut self, idx: usize) -> Option<Record> {
        match std::mem::replace(&mut self.slots[idx], Slot::Deleted) {
            Slot::Occupied(record) => {
                self.size -= 1;
                self.num_deleted += 1;
                Some(record)
            }
            other => {
                self.slots[idx] = other;
                None
            }
        }
    }

    fn records(&self) -> impl Iterator<Item = &Record> {
        self.slots.iter().filter_map(Slot::record)
    }
}

/// A table being drained into the current one.
#[derive(Clone, Debug)]
struct Migration {
    table: Table,
    /// Next slot of `table` to examine.
    cursor: usize,
    /// Live entries moved per step, fixed at migration start.
    batch: usize,
}

/// Open-addressing table of [`Record`]s with incremental rehashing.
///
/// Holds one current table and, while a resize is in flight, the old table
/// it replaced. Every insert or remove issued during that window moves a
/// bounded batch of entries across; lookups consult both tables.
#[derive(Clone, Debug)]
pub struct ProbeTable {
    current: Table,
    old: Option<Migration>,
    pending_policy: Option<ProbePolicy>,
    hash: HashFn,
    config: TableConfig,
}

impl ProbeTable {
    /// Creates a table hashing keys with [`default_hash`] and probing
    /// quadratically.
    ///
    /// # Arguments
    ///
    /// * `size` - Requested capacity. Primes are clamped into
    ///            [`MINPRIME`, `MAXPRIME`], anything else advances to the next prime.
    pub fn new(size: usize) -> Self {
        Self::with_hasher(size, default_hash, ProbePolicy::default())
    }

    /// Creates a table with an explicit key hash and probing policy.
    pub fn with_hasher(size: usize, hash: HashFn, policy: ProbePolicy) -> Self {
        Self::build(size, hash, policy, TableConfig::default())
    }

    /// Creates a table with custom capacity bounds and identifier range.
    ///
    /// # Errors
    ///
    /// * [`ProbeError::InvalidConfig`] - when `config` fails [`TableConfig::validate`].
    pub fn with_config(
        size: usize,
        hash: HashFn,
        policy: ProbePolicy,
        config: TableConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(size, hash, policy, config))
    }

    fn build(size: usize, hash: HashFn, policy: ProbePolicy, config: TableConfig) -> Self {
        let capacity = clamp_capacity(size, config.min_prime, config.max_prime);
        Self {
            current: Table::new(capacity, policy),
            old: None,
            pending_policy: None,
            hash,
            config,
        }
    }

    /// Inserts a record.
    ///
    /// # Returns
    ///
    /// * `bool` - `false` when the id is out of range, the record is already
    ///            present, or no slot could be claimed.
    pub fn insert(&mut self, record: Record) -> bool {
        self.try_insert(record).is_ok()
    }

    /// Inserts a record, reporting why it was refused.
    ///
    /// A successful insert runs a rehash step when the load factor passes
    /// [`LOAD_FACTOR_LIMIT`] or a migration is already underway. Once
    /// [`max_len`](Self::max_len) records are held, further inserts fail with
    /// [`ProbeError::TableFull`].
    pub fn try_insert(&mut self, record: Record) -> Result<()> {
        if !self.config.id_in_range(record.id) {
            return Err(ProbeError::InvalidId {
                id: record.id,
                min: self.config.min_id,
                max: self.config.max_id,
            });
        }
        if self.find(&record.key, record.id).is_some() {
            return Err(ProbeError::Duplicate {
                key: record.key,
                id: record.id,
            });
        }
        let limit = self.max_len();
        if self.len() >= limit {
            return Err(ProbeError::TableFull { limit });
        }

        let hash = (self.hash)(&record.key);
        self.current.place(hash, record)?;
        self.maybe_rehash_after_insert();
        Ok(())
    }

    /// Tombstones `record` in the current table.
    ///
    /// The old table is not searched: a record that has not been migrated yet
    /// cannot be removed until it is. Any in-range attempt, found or not, runs
    /// a rehash step when the tombstone ratio passes [`DELETED_RATIO_LIMIT`]
    /// or a migration is underway.
    pub fn remove(&mut self, record: &Record) -> bool {
        if !self.config.id_in_range(record.id) {
            return false;
        }

        let hash = (self.hash)(&record.key);
        let removed = match self.current.find_index(hash, &record.key, record.id) {
            Some(idx) => self.current.tombstone(idx).is_some(),
            None => false,
        };
        self.maybe_rehash_after_remove();
        removed
    }

    /// Looks `key`/`id` up in the current table, then in the old table.
    pub fn find(&self, key: &str, id: i32) -> Option<&Record> {
        let hash = (self.hash)(key);
        if let Some(idx) = self.current.find_index(hash, key, id) {
            return self.current.slots[idx].record();
        }
        let old = &self.old.as_ref()?.table;
        let idx = old.find_index(hash, key, id)?;
        old.slots[idx].record()
    }

    /// Whether `record` is in either table.
    pub fn contains(&self, record: &Record) -> bool {
        self.find(&record.key, record.id).is_some()
    }

    /// Requests a probing policy for the table built at the next migration
    /// start. The live table keeps its policy.
    pub fn set_probing_policy(&mut self, policy: ProbePolicy) {
        self.pending_policy = Some(policy);
    }

    /// Live entries in the current table over its capacity.
    pub fn load_factor(&self) -> f64 {
        self.current.size as f64 / self.current.capacity() as f64
    }

    /// Tombstones in the current table over its capacity.
    pub fn deleted_ratio(&self) -> f64 {
        self.current.num_deleted as f64 / self.current.capacity() as f64
    }

    /// Live entries across the current and old tables.
    pub fn len(&self) -> usize {
        self.current.size + self.old.as_ref().map_or(0, |m| m.table.size)
    }

    /// Whether both tables are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most live records the table accepts: half of the largest capacity,
    /// so a table migrating into `max_prime` slots can always place them.
    pub fn max_len(&self) -> usize {
        self.config.max_prime / 2
    }

    /// Slots in the current table.
    pub fn capacity(&self) -> usize {
        self.current.capacity()
    }

    /// Tombstones in the current table.
    pub fn num_deleted(&self) -> usize {
        self.current.num_deleted
    }

    /// Policy of the current table.
    pub fn policy(&self) -> ProbePolicy {
        self.current.policy
    }

    /// Policy waiting for the next migration start, if any.
    pub fn pending_policy(&self) -> Option<ProbePolicy> {
        self.pending_policy
    }

    /// Whether an old table is still being drained.
    pub fn is_migrating(&self) -> bool {
        self.old.is_some()
    }

    /// Slots in the old table while migrating.
    pub fn old_capacity(&self) -> Option<usize> {
        self.old.as_ref().map(|m| m.table.capacity())
    }

    /// Live entries still waiting in the old table.
    pub fn old_len(&self) -> Option<usize> {
        self.old.as_ref().map(|m| m.table.size)
    }

    /// Policy of the old table while migrating.
    pub fn old_policy(&self) -> Option<ProbePolicy> {
        self.old.as_ref().map(|m| m.table.policy)
    }

    /// Capacity bounds and id range.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Live records, current table first.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.current
            .records()
            .chain(self.old.iter().flat_map(|m| m.table.records()))
    }

    /// Slot-by-slot listing of both tables, one line per slot.
    pub fn dump(&self) -> String {
        self.to_string()
    }

    fn maybe_rehash_after_insert(&mut self) {
        if self.load_factor() > LOAD_FACTOR_LIMIT || self.is_migrating() {
            self.rehash_step();
        }
    }

    fn maybe_rehash_after_remove(&mut self) {
        if self.deleted_ratio() > DELETED_RATIO_LIMIT || self.is_migrating() {
            self.rehash_step();
        }
    }

    /// Starts a migration if none is running, then moves one batch.
    fn rehash_step(&mut self) {
        if self.old.is_none() {
            self.start_migration();
        }

        let hash_fn = self.hash;
        let Some(migration) = self.old.as_mut() else {
            return;
        };

        let cap = migration.table.capacity();
        let mut transferred = 0;
        while transferred < migration.batch && migration.cursor < cap {
            let idx = migration.cursor;
            migration.cursor += 1;
            let Some(record) = migration.table.tombstone(idx) else {
                continue;
            };
            transferred += 1;

            let hash = hash_fn(&record.key);
            let (key, id) = (record.key.clone(), record.id);
            // Only a policy-None home collision can refuse a migrating record:
            // `max_len` keeps both tables within what the new one can place.
            if let Err(err) = self.current.place(hash, record) {
                warn!(%key, id, %err, "dropping record that could not be migrated");
            }
        }

        let remaining = migration.table.size;
        trace!(transferred, remaining, cursor = migration.cursor, "rehash step");

        if remaining == 0 {
            self.finish_migration();
        }
    }

    fn start_migration(&mut self) {
        let live = self.current.size;
        let capacity = next_prime(
            live.saturating_mul(GROWTH_FACTOR),
            self.config.min_prime,
            self.config.max_prime,
        );
        let policy = self.pending_policy.take().unwrap_or(self.current.policy);
        let retired = std::mem::replace(&mut self.current, Table::new(capacity, policy));
        let batch = ((live as f64 * MIGRATION_FRACTION).ceil() as usize).max(1);

        debug!(
            old_capacity = retired.capacity(),
            new_capacity = capacity,
            live,
            batch,
            old_policy = ?retired.policy,
            new_policy = ?policy,
            "rehash started"
        );

        self.old = Some(Migration {
            table: retired,
            cursor: 0,
            batch,
        });
    }

    fn finish_migration(&mut self) {
        if let Some(retired) = self.old.take() {
            debug!(
                old_capacity = retired.table.capacity(),
                capacity = self.current.capacity(),
                size = self.current.size,
                "rehash finished"
            );
        }
    }
}

impl fmt::Display for ProbeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dump for the current table:")?;
        for (i, slot) in self.current.slots.iter().enumerate() {
            writeln!(f, "[{}] : {}", i, slot)?;
        }
        writeln!(f, "Dump for the old table:")?;
        if let Some(migration) = &self.old {
            for (i, slot) in migration.table.slots.iter().enumerate() {
                writeln!(f, "[{}] : {}", i, slot)?;
            }
        }
        Ok(())
    }
}
