//! CRUD scenario against a live PostgreSQL server.
//!
//! Reads `TEST_DB_USER`, `TEST_DB_PASS`, `TEST_DB_HOST`, `TEST_DB_PORT` and
//! `TEST_DB_NAME`; the database must not already contain a `People` table.

use people_crud::{
    run_suite, ConnectionConfig, Fixture, NewPerson, PeopleStore, PersonFilter, PgStore, Step,
    StoreError,
};

use super::helpers::date;

async fn connect() -> PgStore {
    let config = ConnectionConfig::from_env().unwrap();
    PgStore::connect(&config).await.unwrap()
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn test_full_suite_against_postgres() {
    let report = run_suite(connect().await, &Step::ALL).await.unwrap();
    assert!(report.is_success(), "{}", report);
    assert_eq!(report.passed(), Step::ALL.len());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn test_duplicate_insert_aborts_until_rollback() {
    let mut fixture = Fixture::setup(connect().await).await.unwrap();
    let report = fixture.run_step(Step::InsertSecondExplicitIndex).await;
    assert!(report.passed(), "{:?}", report.error);

    let store = fixture.store();
    let err = store
        .insert(
            &NewPerson::named("Den")
                .with_index(4)
                .born(date("2023-12-12")),
        )
        .await
        .unwrap_err();
    assert!(err.is_constraint_violation(), "{}", err);
    assert_eq!(
        store.select(&PersonFilter::all()).await.unwrap_err(),
        StoreError::TransactionAborted
    );

    store.rollback().await.unwrap();
    let row = store
        .select_one(&PersonFilter::by_index(4))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.name, "Anna Maria");
    assert_eq!(row.date_string().as_deref(), Some("2023-12-12"));

    let (_, teardown) = fixture.teardown().await;
    teardown.unwrap();
}

#[tokio::test]
#[ignore = "requires network access to an unused local port"]
async fn test_connect_failure_is_connection_error() {
    let config = ConnectionConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..Default::default()
    };
    let err = match PgStore::connect(&config).await {
        Ok(_) => panic!("connected to a closed port"),
        Err(e) => e,
    };
    assert!(matches!(err, StoreError::Connection(_)), "{}", err);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL server"]
async fn test_close_with_open_transaction_releases_pool() {
    let mut store = connect().await;
    // Fails inside the implicit transaction, leaving it aborted and open.
    let err = store.select(&PersonFilter::all()).await.unwrap_err();
    assert_eq!(err, StoreError::TableNotFound("People".to_string()));

    store.close().await.unwrap();
    assert_eq!(store.commit().await.unwrap_err(), StoreError::Closed);
    assert_eq!(
        store.select(&PersonFilter::all()).await.unwrap_err(),
        StoreError::Closed
    );
    store.close().await.unwrap();
}
