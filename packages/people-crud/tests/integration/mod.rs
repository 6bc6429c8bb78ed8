//! Integration test suite for the CRUD harness.
//!
//! - `memory_scenario`: the full scenario and its properties against `MemoryStore`
//! - `postgres_scenario`: the same scenario against a live server (ignored by default;
//!   run with `cargo test -- --ignored` and the `TEST_DB_*` variables)

pub mod helpers;
pub mod memory_scenario;
pub mod postgres_scenario;
