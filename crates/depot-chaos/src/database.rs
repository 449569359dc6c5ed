//! In-process relational backend.

use crate::fault::FaultInjector;
use depot_core::{AccessError, Classify, ErrorKind};
use depot_pool::ManageConnection;
use depot_transaction::Transactional;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

type Tables = HashMap<String, BTreeMap<String, String>>;

#[derive(Default)]
struct Shared {
    tables: Mutex<Tables>,
    open: AtomicUsize,
    opened: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
}

impl Shared {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A transactional key-per-row store kept in memory.
///
/// Tables map row ids to text values. Connections see committed rows plus
/// their own uncommitted writes; a transaction's writes become visible to
/// others atomically on commit. Every operation passes through a
/// [`FaultInjector`], so connection resets, timeouts and slow responses can
/// be produced on demand.
///
/// Cheap to clone; clones share the same data.
#[derive(Clone)]
pub struct MemoryDatabase {
    shared: Arc<Shared>,
    faults: FaultInjector,
}

impl MemoryDatabase {
    /// An empty database that injects no faults.
    pub fn new() -> Self {
        Self::with_faults(FaultInjector::none())
    }

    /// An empty database whose operations pass through `faults`.
    pub fn with_faults(faults: FaultInjector) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            faults,
        }
    }

    /// The fault injector.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Connections currently open.
    pub fn open_connections(&self) -> usize {
        self.shared.open.load(Ordering::SeqCst)
    }

    /// Connections opened since creation.
    pub fn total_connections_opened(&self) -> u64 {
        self.shared.opened.load(Ordering::SeqCst)
    }

    /// Transactions committed since creation.
    pub fn commits(&self) -> u64 {
        self.shared.commits.load(Ordering::SeqCst)
    }

    /// Transactions rolled back since creation.
    pub fn rollbacks(&self) -> u64 {
        self.shared.rollbacks.load(Ordering::SeqCst)
    }

    /// Committed rows of `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.shared.tables().get(table).map_or(0, BTreeMap::len)
    }

    /// Committed value of a row, read without a connection.
    pub fn row(&self, table: &str, id: &str) -> Option<String> {
        self.shared
            .tables()
            .get(table)
            .and_then(|rows| rows.get(id).cloned())
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDatabase")
            .field("open_connections", &self.open_connections())
            .field("faults", &self.faults)
            .finish()
    }
}

impl ManageConnection for MemoryDatabase {
    type Connection = MemoryConnection;
    type Error = AccessError;

    async fn connect(&self) -> Result<MemoryConnection, AccessError> {
        self.faults.inject("connect").await?;
        self.shared.open.fetch_add(1, Ordering::SeqCst);
        self.shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryConnection {
            shared: Arc::clone(&self.shared),
            faults: self.faults.clone(),
            pending: None,
            broken: false,
        })
    }

    async fn is_valid(&self, conn: &mut MemoryConnection) -> Result<(), AccessError> {
        conn.guard("ping").await
    }

    fn has_broken(&self, conn: &MemoryConnection) -> bool {
        conn.broken
    }
}

enum Write {
    Put {
        table: String,
        id: String,
        value: String,
    },
    Delete {
        table: String,
        id: String,
    },
}

/// A connection to a [`MemoryDatabase`].
pub struct MemoryConnection {
    shared: Arc<Shared>,
    faults: FaultInjector,
    pending: Option<Vec<Write>>,
    broken: bool,
}

impl MemoryConnection {
    async fn guard(&mut self, operation: &'static str) -> Result<(), AccessError> {
        if self.broken {
            return Err(AccessError::connection("connection is closed"));
        }
        let result = self.faults.inject(operation).await;
        if let Err(err) = &result {
            if err.kind() == ErrorKind::Connection {
                self.broken = true;
            }
        }
        result
    }

    /// Returns true between `begin` and `commit` or `rollback`.
    pub fn in_transaction(&self) -> bool {
        self.pending.is_some()
    }

    /// Reads a row, including this connection's uncommitted writes.
    pub async fn get(&mut self, table: &str, id: &str) -> Result<Option<String>, AccessError> {
        self.guard("get").await?;
        Ok(self.read(table, id))
    }

    /// Inserts a row. Fails if the id is taken.
    pub async fn insert(&mut self, table: &str, id: &str, value: &str) -> Result<(), AccessError> {
        self.guard("insert").await?;
        if self.read(table, id).is_some() {
            return Err(AccessError::other(format!(
                "duplicate key `{id}` in table `{table}`"
            )));
        }
        self.write(Write::Put {
            table: table.to_string(),
            id: id.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    /// Inserts or replaces a row.
    pub async fn upsert(&mut self, table: &str, id: &str, value: &str) -> Result<(), AccessError> {
        self.guard("upsert").await?;
        self.write(Write::Put {
            table: table.to_string(),
            id: id.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    /// Deletes a row. Returns whether it existed.
    pub async fn delete(&mut self, table: &str, id: &str) -> Result<bool, AccessError> {
        self.guard("delete").await?;
        let existed = self.read(table, id).is_some();
        self.write(Write::Delete {
            table: table.to_string(),
            id: id.to_string(),
        });
        Ok(existed)
    }

    /// Number of rows in `table`, including uncommitted writes.
    pub async fn count(&mut self, table: &str) -> Result<usize, AccessError> {
        self.guard("count").await?;
        let tables = self.shared.tables();
        let mut rows = tables.get(table).cloned().unwrap_or_default();
        drop(tables);
        for write in self.pending.iter().flatten() {
            apply_to(&mut rows, table, write);
        }
        Ok(rows.len())
    }

    fn read(&self, table: &str, id: &str) -> Option<String> {
        let mut value = self
            .shared
            .tables()
            .get(table)
            .and_then(|rows| rows.get(id).cloned());
        for write in self.pending.iter().flatten() {
            match write {
                Write::Put {
                    table: t,
                    id: i,
                    value: v,
                } if t == table && i == id => value = Some(v.clone()),
                Write::Delete { table: t, id: i } if t == table && i == id => value = None,
                _ => {}
            }
        }
        value
    }

    fn write(&mut self, write: Write) {
        match &mut self.pending {
            Some(pending) => pending.push(write),
            None => {
                let mut tables = self.shared.tables();
                apply(&mut tables, write);
            }
        }
    }
}

fn apply(tables: &mut Tables, write: Write) {
    match write {
        Write::Put { table, id, value } => {
            tables.entry(table).or_default().insert(id, value);
        }
        Write::Delete { table, id } => {
            if let Some(rows) = tables.get_mut(&table) {
                rows.remove(&id);
            }
        }
    }
}

fn apply_to(rows: &mut BTreeMap<String, String>, table: &str, write: &Write) {
    match write {
        Write::Put {
            table: t,
            id,
            value,
        } if t == table => {
            rows.insert(id.clone(), value.clone());
        }
        Write::Delete { table: t, id } if t == table => {
            rows.remove(id);
        }
        _ => {}
    }
}

impl Transactional for MemoryConnection {
    type Error = AccessError;

    async fn begin(&mut self) -> Result<(), AccessError> {
        self.guard("begin").await?;
        if self.pending.is_some() {
            return Err(AccessError::transaction("transaction already open"));
        }
        self.pending = Some(Vec::new());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), AccessError> {
        self.guard("commit").await?;
        let writes = self
            .pending
            .take()
            .ok_or_else(|| AccessError::transaction("no transaction open"))?;

        let mut tables = self.shared.tables();
        for write in writes {
            apply(&mut tables, write);
        }
        drop(tables);
        self.shared.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AccessError> {
        self.guard("rollback").await?;
        self.pending = None;
        self.shared.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.shared.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for MemoryConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConnection")
            .field("in_transaction", &self.in_transaction())
            .field("broken", &self.broken)
            .finish()
    }
}
