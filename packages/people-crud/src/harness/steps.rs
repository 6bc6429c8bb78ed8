//! The ordered CRUD scenario.
//!
//! Steps share the table and run in [`Step::ALL`] order; each step's doc lists
//! the rows it expects earlier steps to have left behind.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, ensure, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::record::{NewPerson, Person, PersonFilter};
use crate::store::PeopleStore;

const DEN: &str = "Den";
const DEN_BORN: &str = "2022-11-11";

const QUOTED_INDEX: i32 = 0;
const QUOTED_NAME: &str = "Д'Артаньян";
const QUOTED_BORN: &str = "2022-11-11";

const BLANK_NAME: &str = " ";

const ANNA_INDEX: i32 = 4;
const ANNA: &str = "Anna Maria";
const ANNA_BORN: &str = "2023-12-12";
const ANNA_PATTERN: &str = "%Mar%";

const DUPLICATE_BORN: &str = "2023-12-12";

const BOB_INDEX: i32 = 6;
const BOB: &str = "Bob";
const BOB_BORN: &str = "1901-01-10";

/// One case of the CRUD scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Inserts "Den" without an index and reads it back by the generated one.
    /// Assumes nothing.
    InsertAndReturnIndex,
    /// Inserts index 0 with a quote in the name and reads back the triple.
    /// Assumes index 0 is free.
    InsertWithExplicitIndex,
    /// Inserts a single-space name and reads it back unchanged.
    InsertWhitespaceName,
    /// Inserts index 4 "Anna Maria". Assumes index 4 is free.
    InsertSecondExplicitIndex,
    /// Re-inserts index 4, expects a constraint violation, rolls back.
    /// Assumes row 4 exists.
    InsertDuplicateIndexFails,
    /// Selects index 4 with a `%Mar%` name pattern. Assumes row 4.
    SelectByIndexAndPattern,
    /// Moves row 4 to index 6 "Bob". Assumes row 4 and a free index 6.
    UpdateRecord,
    /// Deletes row 6. Assumes row 6 and at least one other row.
    DeleteSingle,
    /// Deletes every row.
    DeleteAll,
}

impl Step {
    /// Every step in execution order.
    pub const ALL: [Step; 9] = [
        Step::InsertAndReturnIndex,
        Step::InsertWithExplicitIndex,
        Step::InsertWhitespaceName,
        Step::InsertSecondExplicitIndex,
        Step::InsertDuplicateIndexFails,
        Step::SelectByIndexAndPattern,
        Step::UpdateRecord,
        Step::DeleteSingle,
        Step::DeleteAll,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Step::InsertAndReturnIndex => "insert_and_return_index",
            Step::InsertWithExplicitIndex => "insert_with_explicit_index",
            Step::InsertWhitespaceName => "insert_whitespace_name",
            Step::InsertSecondExplicitIndex => "insert_second_explicit_index",
            Step::InsertDuplicateIndexFails => "insert_duplicate_index_fails",
            Step::SelectByIndexAndPattern => "select_by_index_and_pattern",
            Step::UpdateRecord => "update_record",
            Step::DeleteSingle => "delete_single",
            Step::DeleteAll => "delete_all",
        }
    }

    /// Arranges, acts and asserts against `store`.
    pub async fn run<S: PeopleStore>(self, store: &mut S) -> Result<()> {
        match self {
            Step::InsertAndReturnIndex => insert_and_return_index(store).await,
            Step::InsertWithExplicitIndex => {
                insert_and_verify(store, QUOTED_INDEX, QUOTED_NAME, QUOTED_BORN).await
            }
            Step::InsertWhitespaceName => insert_whitespace_name(store).await,
            Step::InsertSecondExplicitIndex => {
                insert_and_verify(store, ANNA_INDEX, ANNA, ANNA_BORN).await
            }
            Step::InsertDuplicateIndexFails => insert_duplicate_index_fails(store).await,
            Step::SelectByIndexAndPattern => select_by_index_and_pattern(store).await,
            Step::UpdateRecord => update_record(store).await,
            Step::DeleteSingle => delete_single(store).await,
            Step::DeleteAll => delete_all(store).await,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Step::ALL
            .into_iter()
            .find(|step| step.name() == s)
            .ok_or_else(|| format!("unknown step '{}'", s))
    }
}

fn date(s: &str) -> Result<NaiveDate> {
    s.parse::<NaiveDate>()
        .with_context(|| format!("invalid date literal {:?}", s))
}

fn check<T: PartialEq + fmt::Debug>(column: &str, actual: T, expected: T) -> Result<()> {
    ensure!(
        actual == expected,
        "{} mismatch: expected {:?}, got {:?}",
        column,
        expected,
        actual
    );
    Ok(())
}

/// Compares dates by their canonical string form.
fn check_date(row: &Person, expected: Option<&str>) -> Result<()> {
    check("DateOfBirth", row.date_string().as_deref(), expected)
}

async fn fetch<S: PeopleStore>(store: &mut S, filter: &PersonFilter) -> Result<Person> {
    store
        .select_one(filter)
        .await
        .context("select failed")?
        .with_context(|| format!("no row matches {:?}", filter))
}

async fn insert_and_return_index<S: PeopleStore>(store: &mut S) -> Result<()> {
    let new = NewPerson::named(DEN).born(date(DEN_BORN)?);

    let index = store.insert(&new).await.context("insert failed")?;
    store.commit().await.context("commit failed")?;
    tracing::debug!(index, "generated index");

    let row = fetch(store, &PersonFilter::by_index(index)).await?;
    check("Index", row.index, index)?;
    check("Name", row.name.as_str(), DEN)?;
    check_date(&row, Some(DEN_BORN))
}

async fn insert_and_verify<S: PeopleStore>(
    store: &mut S,
    index: i32,
    name: &str,
    born: &str,
) -> Result<()> {
    let new = NewPerson::named(name).with_index(index).born(date(born)?);

    let returned = store.insert(&new).await.context("insert failed")?;
    store.commit().await.context("commit failed")?;
    check("returned Index", returned, index)?;

    let row = fetch(store, &PersonFilter::exact(&new)).await?;
    check("Index", row.index, index)?;
    check("Name", row.name.as_str(), name)?;
    check_date(&row, Some(born))
}

async fn insert_whitespace_name<S: PeopleStore>(store: &mut S) -> Result<()> {
    let new = NewPerson::named(BLANK_NAME);

    store.insert(&new).await.context("insert failed")?;
    store.commit().await.context("commit failed")?;

    let row = fetch(store, &PersonFilter::all().name(BLANK_NAME)).await?;
    check("Name", row.name.as_str(), BLANK_NAME)?;
    check_date(&row, None)
}

async fn insert_duplicate_index_fails<S: PeopleStore>(store: &mut S) -> Result<()> {
    let duplicate = NewPerson::named(DEN)
        .with_index(ANNA_INDEX)
        .born(date(DUPLICATE_BORN)?);

    let outcome = store.insert(&duplicate).await;
    store
        .rollback()
        .await
        .context("rollback after duplicate insert failed")?;

    match outcome {
        Err(e) if e.is_constraint_violation() => {
            tracing::debug!(error = %e, "duplicate index rejected");
        }
        Err(e) => bail!("expected a constraint violation, got: {}", e),
        Ok(index) => bail!("duplicate index {} was accepted", index),
    }

    let row = fetch(store, &PersonFilter::by_index(ANNA_INDEX)).await?;
    check("Name", row.name.as_str(), ANNA)?;
    check_date(&row, Some(ANNA_BORN))
}

async fn select_by_index_and_pattern<S: PeopleStore>(store: &mut S) -> Result<()> {
    let filter = PersonFilter::by_index(ANNA_INDEX).name_like(ANNA_PATTERN);

    let rows = store.select(&filter).await.context("select failed")?;

    check("row count", rows.len(), 1)?;
    check(
        "row",
        &rows[0],
        &Person::new(ANNA_INDEX, ANNA, Some(date(ANNA_BORN)?)),
    )
}

async fn update_record<S: PeopleStore>(store: &mut S) -> Result<()> {
    let bob = Person::new(BOB_INDEX, BOB, Some(date(BOB_BORN)?));

    let affected = store
        .update(ANNA_INDEX, &bob)
        .await
        .context("update failed")?;
    store.commit().await.context("commit failed")?;
    check("rows updated", affected, 1)?;

    let row = fetch(store, &PersonFilter::by_index(BOB_INDEX)).await?;
    check("Name", row.name.as_str(), BOB)?;
    check_date(&row, Some(BOB_BORN))?;

    let old = store
        .select_one(&PersonFilter::by_index(ANNA_INDEX))
        .await
        .context("select failed")?;
    ensure!(old.is_none(), "old index {} still present: {:?}", ANNA_INDEX, old);
    Ok(())
}

async fn delete_single<S: PeopleStore>(store: &mut S) -> Result<()> {
    let affected = store
        .delete(Some(BOB_INDEX))
        .await
        .context("delete failed")?;
    store.commit().await.context("commit failed")?;
    check("rows deleted", affected, 1)?;

    let gone = store
        .select_one(&PersonFilter::by_index(BOB_INDEX))
        .await
        .context("select failed")?;
    ensure!(gone.is_none(), "deleted row still present: {:?}", gone);

    let remaining = store
        .select(&PersonFilter::all())
        .await
        .context("select failed")?;
    ensure!(!remaining.is_empty(), "deleting one row removed every row");
    Ok(())
}

async fn delete_all<S: PeopleStore>(store: &mut S) -> Result<()> {
    store.delete(None).await.context("delete failed")?;
    store.commit().await.context("commit failed")?;

    let rows = store
        .select(&PersonFilter::all())
        .await
        .context("select failed")?;
    ensure!(rows.is_empty(), "{} rows left after delete: {:?}", rows.len(), rows);
    Ok(())
}
