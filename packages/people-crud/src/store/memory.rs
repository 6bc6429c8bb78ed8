//! In-process store with the same observable semantics as the PostgreSQL one.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::PeopleStore;
use crate::error::{Result, StoreError};
use crate::record::{NewPerson, Person, PersonFilter, MAX_NAME_LEN};
use crate::sql::{COL_NAME, TABLE};

const PRIMARY_KEY: &str = "People_pkey";

/// Table state. `serial` is shared between clones, so sequence values
/// survive a rollback but go away with the table that created them.
#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<i32, Person>,
    serial: Arc<AtomicI32>,
}

impl Table {
    fn next_serial(&self) -> i32 {
        self.serial.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Working copy of the table for the open transaction.
#[derive(Debug)]
struct Pending {
    table: Option<Table>,
    aborted: bool,
}

/// In-memory `People` table with staged writes.
///
/// The index sequence behaves like `SERIAL`: it starts at 1, only advances for
/// auto-assigned indexes, is never rolled back, and is created and dropped
/// together with the table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: Option<Table>,
    pending: Option<Pending>,
    closed: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the table exists in committed state.
    pub fn has_table(&self) -> bool {
        self.committed.is_some()
    }

    /// Committed rows ordered by index; empty when the table does not exist.
    pub fn committed_rows(&self) -> Vec<Person> {
        self.committed
            .as_ref()
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Runs one statement against the working copy. A failing statement
    /// aborts the transaction.
    fn statement<T>(
        &mut self,
        op: impl FnOnce(&mut Option<Table>) -> Result<T>,
    ) -> Result<T> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        let pending = self.pending.get_or_insert_with(|| Pending {
            table: self.committed.clone(),
            aborted: false,
        });
        if pending.aborted {
            return Err(StoreError::TransactionAborted);
        }
        let result = op(&mut pending.table);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "statement failed");
            pending.aborted = true;
        }
        result
    }
}

fn existing(table: &mut Option<Table>) -> Result<&mut Table> {
    table
        .as_mut()
        .ok_or_else(|| StoreError::TableNotFound(TABLE.to_string()))
}

fn check_name(name: &str) -> Result<()> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::ValueTooLong {
            column: COL_NAME.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

fn duplicate_key(index: i32) -> StoreError {
    tracing::debug!(index, "duplicate primary key");
    StoreError::ConstraintViolation {
        constraint: Some(PRIMARY_KEY.to_string()),
        detail: format!(
            "duplicate key value violates unique constraint \"{}\"",
            PRIMARY_KEY
        ),
    }
}

#[async_trait]
impl PeopleStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create_table(&mut self) -> Result<()> {
        self.statement(|table| {
            if table.is_some() {
                return Err(StoreError::TableAlreadyExists(TABLE.to_string()));
            }
            *table = Some(Table::default());
            Ok(())
        })
    }

    async fn drop_table(&mut self) -> Result<()> {
        self.statement(|table| match table.take() {
            Some(_) => Ok(()),
            None => Err(StoreError::TableNotFound(TABLE.to_string())),
        })
    }

    async fn insert(&mut self, person: &NewPerson) -> Result<i32> {
        self.statement(|table| {
            let table = existing(table)?;
            let index = match person.index {
                Some(index) => index,
                None => table.next_serial(),
            };
            check_name(&person.name)?;
            if table.rows.contains_key(&index) {
                return Err(duplicate_key(index));
            }
            table.rows.insert(
                index,
                Person::new(index, person.name.clone(), person.date_of_birth),
            );
            Ok(index)
        })
    }

    async fn select(&mut self, filter: &PersonFilter) -> Result<Vec<Person>> {
        self.statement(|table| {
            let table = existing(table)?;
            Ok(table
                .rows
                .values()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect())
        })
    }

    async fn update(&mut self, index: i32, person: &Person) -> Result<u64> {
        self.statement(|table| {
            let table = existing(table)?;
            if !table.rows.contains_key(&index) {
                return Ok(0);
            }
            check_name(&person.name)?;
            if person.index != index && table.rows.contains_key(&person.index) {
                return Err(duplicate_key(person.index));
            }
            table.rows.remove(&index);
            table.rows.insert(person.index, person.clone());
            Ok(1)
        })
    }

    async fn delete(&mut self, index: Option<i32>) -> Result<u64> {
        self.statement(|table| {
            let table = existing(table)?;
            match index {
                Some(index) => Ok(table.rows.remove(&index).map_or(0, |_| 1)),
                None => {
                    let count = table.rows.len() as u64;
                    table.rows.clear();
                    Ok(count)
                }
            }
        })
    }

    async fn commit(&mut self) -> Result<()> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        // Committing an aborted transaction rolls it back, as PostgreSQL does.
        if let Some(pending) = self.pending.take() {
            if !pending.aborted {
                self.committed = pending.table;
            }
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        self.pending = None;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.pending = None;
        self.closed = true;
        Ok(())
    }
}
