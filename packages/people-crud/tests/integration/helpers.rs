//! Shared test helpers.

use chrono::NaiveDate;
use people_crud::{Fixture, MemoryStore, Person, Step};

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Fixture over a fresh in-memory store with the table created.
pub async fn memory_fixture() -> Fixture<MemoryStore> {
    Fixture::setup(MemoryStore::new()).await.unwrap()
}

/// Runs `steps` in order and panics on the first failure.
pub async fn run_passing(fixture: &mut Fixture<MemoryStore>, steps: &[Step]) {
    for &step in steps {
        let report = fixture.run_step(step).await;
        assert!(
            report.passed(),
            "step {} failed: {:?}",
            step,
            report.error
        );
    }
}

pub fn indexes(rows: &[Person]) -> Vec<i32> {
    rows.iter().map(|p| p.index).collect()
}
