/// Database implementation
use crate::error::Result;
use crate::schema;
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::{Executor, Sqlite};
use std::str::FromStr;
use std::time::Duration;

/// A statement parameter. Values are always bound, never spliced into SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Outcome of a mutating statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Row id of the last inserted row (meaningless for UPDATE/DELETE)
    pub inserted_id: i64,
    pub rows_affected: u64,
}

/// SQLite-backed storage adapter shared by every request handler
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database and apply the schema
    ///
    /// In-memory databases live only as long as their connection, so they
    /// are pinned to one connection that is never closed or recycled.
    ///
    /// # Errors
    /// Returns an error if the connection fails or the schema cannot be applied
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = is_memory_url(database_url);

        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(30));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let max_connections = if in_memory { 1 } else { max_connections.max(1) };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(if in_memory { 1 } else { 0 })
            .idle_timeout(if in_memory { None } else { Some(Duration::from_secs(600)) })
            .max_lifetime(if in_memory { None } else { Some(Duration::from_secs(1800)) })
            .connect_with(options)
            .await?;

        tracing::info!(
            url = %database_url,
            max_connections,
            "Database pool created"
        );

        schema::apply(&pool).await?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run a mutating statement
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<ExecOutcome> {
        execute_on(&self.pool, sql, params).await
    }

    /// Fetch at most one row
    pub async fn fetch_one(&self, sql: &str, params: &[SqlValue]) -> Result<Option<SqliteRow>> {
        fetch_one_on(&self.pool, sql, params).await
    }

    /// Fetch every matching row
    pub async fn fetch_many(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqliteRow>> {
        fetch_many_on(&self.pool, sql, params).await
    }

    /// Start a transaction. Statements issued through it commit together or
    /// not at all; dropping it without `commit` rolls back.
    pub async fn begin(&self) -> Result<Transaction> {
        Ok(Transaction {
            inner: self.pool.begin().await?,
        })
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// An open transaction with the same statement surface as `Database`
pub struct Transaction {
    inner: sqlx::Transaction<'static, Sqlite>,
}

impl Transaction {
    pub async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<ExecOutcome> {
        execute_on(&mut *self.inner, sql, params).await
    }

    pub async fn fetch_one(&mut self, sql: &str, params: &[SqlValue]) -> Result<Option<SqliteRow>> {
        fetch_one_on(&mut *self.inner, sql, params).await
    }

    pub async fn fetch_many(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqliteRow>> {
        fetch_many_on(&mut *self.inner, sql, params).await
    }

    pub async fn commit(self) -> Result<()> {
        self.inner.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<()> {
        self.inner.rollback().await?;
        Ok(())
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Integer(value) => query.bind(*value),
            SqlValue::Real(value) => query.bind(*value),
            SqlValue::Text(value) => query.bind(value.as_str()),
        };
    }
    query
}

async fn execute_on<'e, E>(executor: E, sql: &str, params: &[SqlValue]) -> Result<ExecOutcome>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = bind_params(sqlx::query(sql), params)
        .execute(executor)
        .await?;

    Ok(ExecOutcome {
        inserted_id: result.last_insert_rowid(),
        rows_affected: result.rows_affected(),
    })
}

async fn fetch_one_on<'e, E>(
    executor: E,
    sql: &str,
    params: &[SqlValue],
) -> Result<Option<SqliteRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(bind_params(sqlx::query(sql), params)
        .fetch_optional(executor)
        .await?)
}

async fn fetch_many_on<'e, E>(executor: E, sql: &str, params: &[SqlValue]) -> Result<Vec<SqliteRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(bind_params(sqlx::query(sql), params)
        .fetch_all(executor)
        .await?)
}
