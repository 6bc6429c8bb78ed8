//! CRUD scenario against the in-memory store.

use pretty_assertions::assert_eq;

use people_crud::{
    run_suite, Fixture, MemoryStore, NewPerson, PeopleStore, Person, Step, StoreError,
};

use super::helpers::{date, indexes, memory_fixture, run_passing};

const INSERTS: [Step; 4] = [
    Step::InsertAndReturnIndex,
    Step::InsertWithExplicitIndex,
    Step::InsertWhitespaceName,
    Step::InsertSecondExplicitIndex,
];

#[tokio::test]
async fn test_full_suite_passes() {
    let report = run_suite(MemoryStore::new(), &Step::ALL).await.unwrap();
    assert!(report.is_success(), "{}", report);
    assert_eq!(report.passed(), 9);
    assert_eq!(report.backend, "memory");
    assert_eq!(
        report.steps.iter().map(|s| s.step).collect::<Vec<_>>(),
        Step::ALL.to_vec()
    );
}

#[tokio::test]
async fn test_teardown_drops_table_and_closes() {
    let mut fixture = memory_fixture().await;
    assert!(fixture.store().has_table());
    run_passing(&mut fixture, &Step::ALL).await;

    let (store, result) = fixture.teardown().await;
    result.unwrap();
    assert!(!store.has_table());
    assert!(store.is_closed());
}

#[tokio::test]
async fn test_inserts_round_trip() {
    let mut fixture = memory_fixture().await;
    run_passing(&mut fixture, &INSERTS).await;

    assert_eq!(
        fixture.store().committed_rows(),
        vec![
            Person::new(0, "Д'Артаньян", Some(date("2022-11-11"))),
            Person::new(1, "Den", Some(date("2022-11-11"))),
            Person::new(2, " ", None),
            Person::new(4, "Anna Maria", Some(date("2023-12-12"))),
        ]
    );
}

#[tokio::test]
async fn test_duplicate_index_leaves_table_unchanged() {
    let mut fixture = memory_fixture().await;
    run_passing(&mut fixture, &INSERTS).await;
    let before = fixture.store().committed_rows();

    run_passing(&mut fixture, &[Step::InsertDuplicateIndexFails]).await;

    assert_eq!(fixture.store().committed_rows(), before);
}

#[tokio::test]
async fn test_duplicate_step_fails_when_index_is_free() {
    let mut fixture = memory_fixture().await;
    let report = fixture.run_step(Step::InsertDuplicateIndexFails).await;
    let error = report.error.unwrap();
    assert!(error.contains("was accepted"), "{}", error);
    // The accepted row was rolled back.
    assert!(fixture.store().committed_rows().is_empty());
}

#[tokio::test]
async fn test_update_then_delete_scenario() {
    let mut fixture = memory_fixture().await;
    run_passing(&mut fixture, &INSERTS).await;
    run_passing(
        &mut fixture,
        &[Step::InsertDuplicateIndexFails, Step::SelectByIndexAndPattern],
    )
    .await;

    run_passing(&mut fixture, &[Step::UpdateRecord]).await;
    let rows = fixture.store().committed_rows();
    assert_eq!(indexes(&rows), vec![0, 1, 2, 6]);
    assert_eq!(rows[3], Person::new(6, "Bob", Some(date("1901-01-10"))));

    run_passing(&mut fixture, &[Step::DeleteSingle]).await;
    assert_eq!(indexes(&fixture.store().committed_rows()), vec![0, 1, 2]);

    run_passing(&mut fixture, &[Step::DeleteAll]).await;
    assert!(fixture.store().committed_rows().is_empty());
    assert!(fixture.store().has_table());
}

#[tokio::test]
async fn test_out_of_order_steps_fail_but_teardown_runs() {
    let report = run_suite(
        MemoryStore::new(),
        &[Step::UpdateRecord, Step::DeleteSingle, Step::DeleteAll],
    )
    .await
    .unwrap();

    assert_eq!(report.failed(), 2);
    assert_eq!(report.passed(), 1);
    assert!(report.teardown_error.is_none());
    assert!(!report.is_success());
    let update_error = report.steps[0].error.as_deref().unwrap();
    assert!(
        update_error.contains("rows updated mismatch"),
        "{}",
        update_error
    );
}

#[tokio::test]
async fn test_failed_statement_inside_step_does_not_leak() {
    // Row 4 is taken, so the explicit insert fails and aborts its transaction.
    let mut fixture = memory_fixture().await;
    let store = fixture.store();
    store
        .insert(&NewPerson::named("Squatter").with_index(4))
        .await
        .unwrap();
    store.commit().await.unwrap();

    let report = fixture.run_step(Step::InsertSecondExplicitIndex).await;
    let error = report.error.unwrap();
    assert!(error.contains("Constraint violation"), "{}", error);
    assert!(!fixture.store().in_transaction());

    // Steps unrelated to row 4 are unaffected by the failure.
    run_passing(
        &mut fixture,
        &[Step::InsertAndReturnIndex, Step::InsertWhitespaceName],
    )
    .await;
    assert_eq!(indexes(&fixture.store().committed_rows()), vec![1, 2, 4]);

    let (_, teardown) = fixture.teardown().await;
    teardown.unwrap();
}

#[tokio::test]
async fn test_setup_fails_when_table_exists() {
    let mut store = MemoryStore::new();
    store.create_table().await.unwrap();
    store.commit().await.unwrap();

    let err = run_suite(store, &Step::ALL).await.unwrap_err();
    assert_eq!(err, StoreError::TableAlreadyExists("People".to_string()));
}

#[tokio::test]
async fn test_setup_on_closed_store_fails() {
    let mut store = MemoryStore::new();
    store.close().await.unwrap();
    let result = Fixture::setup(store).await;
    assert!(matches!(result, Err(StoreError::Closed)));
}
