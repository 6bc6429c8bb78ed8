//! PostgreSQL store over a single pooled `sqlx` connection.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, Postgres};
use sqlx::{Arguments, Transaction};

use super::PeopleStore;
use crate::config::ConnectionConfig;
use crate::error::{Result, StoreError};
use crate::record::{NewPerson, Person, PersonFilter};
use crate::sql::{self, Statement, Value};

/// Store backed by a live PostgreSQL server.
///
/// Holds exactly one connection. The implicit transaction owns that connection
/// while open, so statements are strictly sequential; dropping the store with
/// a transaction still open rolls it back.
pub struct PgStore {
    pool: Option<PgPool>,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgStore {
    /// Connects using `config`. Any failure is reported as `StoreError::Connection`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            user = %config.user,
            "Connected to PostgreSQL"
        );
        Ok(Self {
            pool: Some(pool),
            tx: None,
        })
    }

    fn pool(&self) -> Result<&PgPool> {
        self.pool.as_ref().ok_or(StoreError::Closed)
    }

    /// Returns the open transaction, beginning one if needed.
    async fn transaction(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => {
                tracing::debug!("BEGIN");
                self.pool()?.begin().await?
            }
        };
        Ok(self.tx.insert(tx))
    }

    async fn execute(&mut self, stmt: Statement) -> Result<u64> {
        tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "execute");
        let args = arguments(stmt.params)?;
        let tx = self.transaction().await?;
        let done = sqlx::query_with(&stmt.sql, args)
            .execute(&mut **tx)
            .await
            .map_err(log_failure)?;
        Ok(done.rows_affected())
    }
}

fn arguments(params: Vec<Value>) -> Result<PgArguments> {
    let mut args = PgArguments::default();
    for param in params {
        match param {
            Value::Int(v) => args.add(v),
            Value::Text(v) => args.add(v),
            Value::Date(v) => args.add(v),
        }
        .map_err(|e| StoreError::Database(format!("Failed to bind parameter: {}", e)))?;
    }
    Ok(args)
}

fn log_failure(err: sqlx::Error) -> StoreError {
    let err = StoreError::from(err);
    tracing::warn!(error = %err, "statement failed");
    err
}

#[async_trait]
impl PeopleStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn create_table(&mut self) -> Result<()> {
        self.execute(sql::create_table()).await.map(|_| ())
    }

    async fn drop_table(&mut self) -> Result<()> {
        self.execute(sql::drop_table()).await.map(|_| ())
    }

    async fn insert(&mut self, person: &NewPerson) -> Result<i32> {
        let stmt = sql::insert(person);
        tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "insert");
        let args = arguments(stmt.params)?;
        let tx = self.transaction().await?;
        sqlx::query_scalar_with::<_, i32, _>(&stmt.sql, args)
            .fetch_one(&mut **tx)
            .await
            .map_err(log_failure)
    }

    async fn select(&mut self, filter: &PersonFilter) -> Result<Vec<Person>> {
        let stmt = sql::select(filter);
        tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "select");
        let args = arguments(stmt.params)?;
        let tx = self.transaction().await?;
        sqlx::query_as_with::<_, Person, _>(&stmt.sql, args)
            .fetch_all(&mut **tx)
            .await
            .map_err(log_failure)
    }

    async fn update(&mut self, index: i32, person: &Person) -> Result<u64> {
        self.execute(sql::update(index, person)).await
    }

    async fn delete(&mut self, index: Option<i32>) -> Result<u64> {
        self.execute(sql::delete(index)).await
    }

    async fn commit(&mut self) -> Result<()> {
        self.pool()?;
        if let Some(tx) = self.tx.take() {
            tracing::debug!("COMMIT");
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.pool()?;
        if let Some(tx) = self.tx.take() {
            tracing::debug!("ROLLBACK");
            tx.rollback().await?;
        }
        Ok(())
    }

    /// Rolls back any open transaction and closes the pool. The pool is
    /// closed even when the rollback fails; that error is returned afterwards.
    async fn close(&mut self) -> Result<()> {
        let pool = self.pool.take();
        let rolled_back = match self.tx.take() {
            Some(tx) => tx.rollback().await.map_err(StoreError::from),
            None => Ok(()),
        };
        if let Some(pool) = pool {
            pool.close().await;
            tracing::info!("Closed PostgreSQL connection");
        }
        rolled_back
    }
}
