use indexmap::IndexMap;

use crate::{
    foundation::core::{StateFlags, TableUuid},
    foundation::math::unix_nanos,
    table::model::MeltTable,
};

/// Proof of one [`TableStore::join`]. Consumed by [`TableStore::leave`].
///
/// Not `Clone`: each lease releases exactly one reference.
#[must_use = "dropping a lease without `leave` keeps the table referenced"]
#[derive(Debug, PartialEq, Eq)]
pub struct TableLease {
    uuid: TableUuid,
}

impl TableLease {
    /// Table this lease refers to.
    pub fn uuid(&self) -> TableUuid {
        self.uuid
    }
}

struct UuidGenerator {
    last: u64,
    clock: Box<dyn Fn() -> u64 + Send>,
}

impl UuidGenerator {
    /// Time-seeded id, strictly above every id this generator handed out before.
    fn next(&mut self, taken: impl Fn(u64) -> bool) -> TableUuid {
        let mut raw = (self.clock)().max(self.last.wrapping_add(1));
        loop {
            if let Some(uuid) = TableUuid::new(raw)
                && !taken(raw)
            {
                self.last = raw;
                return uuid;
            }
            raw = raw.wrapping_add(1);
        }
    }
}

/// Process-wide collection of melt tables, keyed by UUID.
///
/// Tables keep creation (or load) order, which is also the order they are saved in.
pub struct TableStore {
    tables: IndexMap<TableUuid, MeltTable>,
    ids: UuidGenerator,
    consistency_warnings: u64,
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableStore")
            .field("tables", &self.tables.len())
            .field("last_uuid", &self.ids.last)
            .field("consistency_warnings", &self.consistency_warnings)
            .finish()
    }
}

impl TableStore {
    /// Empty store whose UUIDs are seeded from the wall clock in nanoseconds.
    pub fn new() -> Self {
        Self::with_clock(unix_nanos)
    }

    /// Empty store with an injected UUID seed source.
    pub fn with_clock(clock: impl Fn() -> u64 + Send + 'static) -> Self {
        Self {
            tables: IndexMap::new(),
            ids: UuidGenerator {
                last: 0,
                clock: Box::new(clock),
            },
            consistency_warnings: 0,
        }
    }

    /// Allocate a new table and return its UUID.
    ///
    /// The table starts `DIRTY | DEAD` with zero references and empty sizes.
    pub fn create(&mut self) -> TableUuid {
        let tables = &self.tables;
        let uuid = self
            .ids
            .next(|raw| TableUuid::new(raw).is_some_and(|u| tables.contains_key(&u)));
        self.tables.insert(uuid, MeltTable::new(uuid));
        tracing::debug!(%uuid, total = self.tables.len(), "created table");
        uuid
    }

    /// Find a table by raw UUID. Zero never matches.
    pub fn lookup(&self, raw: u64) -> Option<&MeltTable> {
        TableUuid::new(raw).and_then(|uuid| self.tables.get(&uuid))
    }

    /// Mutable [`TableStore::lookup`].
    pub fn lookup_mut(&mut self, raw: u64) -> Option<&mut MeltTable> {
        TableUuid::new(raw).and_then(|uuid| self.tables.get_mut(&uuid))
    }

    /// Table by UUID.
    pub fn get(&self, uuid: TableUuid) -> Option<&MeltTable> {
        self.tables.get(&uuid)
    }

    /// Mutable table by UUID.
    pub fn get_mut(&mut self, uuid: TableUuid) -> Option<&mut MeltTable> {
        self.tables.get_mut(&uuid)
    }

    /// Add one owner to a table and clear `DEAD`.
    ///
    /// Returns `None` when the store has no such table.
    pub fn join(&mut self, uuid: TableUuid) -> Option<TableLease> {
        let table = self.tables.get_mut(&uuid)?;
        table.reference_count = table.reference_count.saturating_add(1);
        table.flags.remove(StateFlags::DEAD);
        Some(TableLease { uuid })
    }

    /// Give back a lease obtained from [`TableStore::join`].
    pub fn leave(&mut self, lease: TableLease) {
        self.release(lease.uuid);
    }

    /// Drop one reference without a lease.
    ///
    /// Releasing a table that has no references (or does not exist) is a caller bug: it is
    /// logged and counted, and the count stays at zero.
    pub fn release(&mut self, uuid: TableUuid) {
        match self.tables.get_mut(&uuid) {
            Some(table) if table.reference_count > 0 => table.reference_count -= 1,
            Some(_) => {
                self.consistency_warnings += 1;
                tracing::warn!(%uuid, "table already had 0 users");
            }
            None => {
                self.consistency_warnings += 1;
                tracing::warn!(%uuid, "released a table that is not in the store");
            }
        }
    }

    /// Flag a table's derived content as stale. Returns false for unknown UUIDs.
    pub fn mark_dirty(&mut self, uuid: TableUuid) -> bool {
        match self.tables.get_mut(&uuid) {
            Some(table) => {
                table.flags.insert(StateFlags::DIRTY);
                true
            }
            None => false,
        }
    }

    /// Number of consistency anomalies (double releases) seen by this store.
    pub fn consistency_warnings(&self) -> u64 {
        self.consistency_warnings
    }

    /// Number of tables, live or not.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when the store holds no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// True when a table with `uuid` exists.
    pub fn contains(&self, uuid: TableUuid) -> bool {
        self.tables.contains_key(&uuid)
    }

    /// Tables in creation/load order.
    pub fn iter(&self) -> impl Iterator<Item = &MeltTable> {
        self.tables.values()
    }

    /// Drop every unreferenced dead table from memory, keeping the order of the rest.
    ///
    /// Returns how many tables were removed. Saves skip the same tables without touching the
    /// store; this is the in-memory counterpart.
    pub fn retain_live(&mut self) -> usize {
        let before = self.tables.len();
        self.tables.retain(|uuid, table| {
            let keep = !table.is_collectable();
            if !keep {
                tracing::debug!(%uuid, "dropped dead table");
            }
            keep
        });
        before - self.tables.len()
    }

    /// Insert a table decoded from disk. A UUID already present is skipped.
    pub(crate) fn insert_loaded(&mut self, table: MeltTable) -> bool {
        let uuid = table.uuid;
        if self.tables.contains_key(&uuid) {
            tracing::warn!(%uuid, "duplicate table in tables file, keeping the first one");
            return false;
        }
        self.tables.insert(uuid, table);
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/table/store.rs"]
mod tests;
