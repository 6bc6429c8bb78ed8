//! CRUD integration harness for the `People` table.
//!
//! Provides the record model, parameterized SQL composition, a
//! [`PeopleStore`] seam with PostgreSQL and in-memory implementations,
//! and the fixture lifecycle that drives the ordered CRUD scenario.

pub mod config;
pub mod error;
pub mod harness;
pub mod record;
pub mod sql;
pub mod store;

pub use config::ConnectionConfig;
pub use error::{Result, StoreError};
pub use harness::{run_suite, Fixture, Step, StepReport, SuiteReport};
pub use record::{NameMatch, NewPerson, Person, PersonFilter, MAX_NAME_LEN};
pub use store::{MemoryStore, PeopleStore, PgStore};
