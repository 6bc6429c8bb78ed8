//! Storage seam for the `People` table.
//!
//! The harness talks to a database only through [`PeopleStore`]. Statements run
//! inside an implicit transaction that the first statement after a commit or
//! rollback opens; writes become visible to later transactions only after
//! [`PeopleStore::commit`]. Once a statement fails inside a transaction, every
//! further statement fails with [`StoreError::TransactionAborted`] until
//! [`PeopleStore::rollback`].
//!
//! [`StoreError::TransactionAborted`]: crate::error::StoreError::TransactionAborted

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::record::{NewPerson, Person, PersonFilter};

/// CRUD operations on the `People` table.
#[async_trait]
pub trait PeopleStore: Send {
    /// Short backend name for logs and reports.
    fn backend(&self) -> &'static str;

    /// Creates the `People` table.
    async fn create_table(&mut self) -> Result<()>;

    /// Drops the `People` table and its dependent objects.
    async fn drop_table(&mut self) -> Result<()>;

    /// Inserts a record and returns its index, generated or explicit.
    async fn insert(&mut self, person: &NewPerson) -> Result<i32>;

    /// Returns every row matching `filter`, ordered by index.
    async fn select(&mut self, filter: &PersonFilter) -> Result<Vec<Person>>;

    /// Returns the first row matching `filter`, if any.
    async fn select_one(&mut self, filter: &PersonFilter) -> Result<Option<Person>> {
        Ok(self.select(filter).await?.into_iter().next())
    }

    /// Overwrites every column of the row at `index`. Returns the rows affected.
    async fn update(&mut self, index: i32, person: &Person) -> Result<u64>;

    /// Deletes the row at `index`, or every row when `None`. Returns the rows affected.
    async fn delete(&mut self, index: Option<i32>) -> Result<u64>;

    /// Commits the open transaction. No-op when none is open.
    async fn commit(&mut self) -> Result<()>;

    /// Rolls back the open transaction. No-op when none is open.
    async fn rollback(&mut self) -> Result<()>;

    /// Releases the connection. Later operations fail with `Closed`.
    async fn close(&mut self) -> Result<()>;
}
