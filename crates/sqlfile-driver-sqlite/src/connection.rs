//! SQLite connection implementation

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Batch, Connection as RusqliteConnection, OpenFlags, Statement};
use sqlfile_core::{
    Connection, DbError, ExecutionOutcome, QueryResult, Result, Row, Transaction, Value,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::transaction::SqliteTransaction;

/// SQLite connection wrapper
pub struct SqliteConnection {
    conn: Arc<Mutex<RusqliteConnection>>,
    closed: AtomicBool,
}

impl SqliteConnection {
    /// Open a SQLite database, creating the file if needed.
    ///
    /// `:memory:` opens a private in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        tracing::info!(path = %path, "opening SQLite database");

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                DbError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            let expanded_path = Self::expand_path(path)?;

            if !expanded_path.starts_with("file:") {
                let file_path = std::path::Path::new(&expanded_path);
                if let Some(parent) = file_path.parent()
                    && !parent.exists()
                {
                    return Err(DbError::Connection(format!(
                        "Parent directory does not exist: {}",
                        parent.display()
                    )));
                }
            }

            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                DbError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| DbError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        tracing::info!(path = %path, "SQLite database connection established");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            closed: AtomicBool::new(false),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Expand `~/` to the home directory and make relative paths absolute
    fn expand_path(path: &str) -> Result<String> {
        if path.starts_with("file:") {
            return Ok(path.to_string());
        }

        let expanded = if let Some(rest) = path.strip_prefix("~/") {
            let home = dirs::home_dir().ok_or_else(|| {
                DbError::Configuration("Unable to determine HOME directory".into())
            })?;
            home.join(rest)
        } else if path.starts_with('~') {
            return Err(DbError::Configuration(
                "User-specific home directories (~user) are not supported".into(),
            ));
        } else {
            PathBuf::from(path)
        };

        let absolute = if expanded.is_relative() {
            std::env::current_dir()?.join(expanded)
        } else {
            expanded
        };

        Ok(absolute.to_string_lossy().to_string())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DbError::Connection("Connection is closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome> {
        self.ensure_open()?;
        let conn = self.conn.lock();
        let outcome = execute_statement(&conn, sql)?;
        tracing::debug!(affected_rows = outcome.affected_rows, "statement executed");
        Ok(outcome)
    }

    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str) -> Result<QueryResult> {
        self.ensure_open()?;
        let conn = self.conn.lock();
        let result = run_query(&conn, sql)?;
        tracing::debug!(row_count = result.row_count(), "query executed successfully");
        Ok(result)
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        self.ensure_open()?;
        tracing::debug!("beginning SQLite transaction");
        {
            let conn = self.conn.lock();
            // DEFERRED takes the write lock on the first write
            conn.execute_batch("BEGIN DEFERRED").map_err(|e| {
                DbError::Transaction(format!("Failed to begin transaction: {}", e))
            })?;
        }
        tracing::debug!("SQLite transaction started");
        Ok(Box::new(SqliteTransaction::new(Arc::clone(&self.conn))))
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing SQLite connection");
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

const DML_KEYWORDS: &[&str] = &["INSERT", "REPLACE", "UPDATE", "DELETE", "WITH"];

/// Run one statement to completion.
///
/// Statements that produce rows are stepped through. Their changes are
/// reported when they write, as `INSERT ... RETURNING` does.
pub(crate) fn execute_statement(conn: &RusqliteConnection, sql: &str) -> Result<ExecutionOutcome> {
    let mut stmt = prepare_single(conn, sql)?;
    // sqlite keeps the change count of the last DML statement across DDL and reads
    let counts_changes = !stmt.readonly() && first_keyword_in(sql, DML_KEYWORDS);

    let changes = if stmt.column_count() > 0 {
        {
            let mut rows = stmt
                .query([])
                .map_err(|e| DbError::Query(format!("Failed to execute statement: {}", e)))?;
            while rows
                .next()
                .map_err(|e| DbError::Query(format!("Failed to fetch row: {}", e)))?
                .is_some()
            {}
        }
        conn.changes() as u64
    } else {
        stmt.execute([])
            .map_err(|e| DbError::Query(format!("Failed to execute statement: {}", e)))?
            as u64
    };

    let affected_rows = if counts_changes { changes } else { 0 };
    let outcome = ExecutionOutcome::new(affected_rows);
    if affected_rows > 0 && is_insert(sql) {
        Ok(outcome.with_last_insert_id(conn.last_insert_rowid()))
    } else {
        Ok(outcome)
    }
}

pub(crate) fn run_query(conn: &RusqliteConnection, sql: &str) -> Result<QueryResult> {
    let mut stmt = prepare_single(conn, sql)?;

    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    let mut query_rows = stmt
        .query([])
        .map_err(|e| DbError::Query(format!("Failed to execute query: {}", e)))?;

    while let Some(row) = query_rows
        .next()
        .map_err(|e| DbError::Query(format!("Failed to fetch row: {}", e)))?
    {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            values.push(rusqlite_to_value(row, i)?);
        }
        rows.push(Row::new(columns.clone(), values));
    }

    Ok(QueryResult { columns, rows })
}

/// Prepare `sql`, which must hold exactly one statement.
///
/// `prepare` alone compiles the first statement and ignores the rest of the
/// text, so any further statement is rejected here instead of being dropped.
fn prepare_single<'conn>(conn: &'conn RusqliteConnection, sql: &str) -> Result<Statement<'conn>> {
    let mut batch = Batch::new(conn, sql);
    let stmt = batch
        .next()
        .map_err(|e| DbError::Query(format!("Failed to prepare statement: {}", e)))?
        .ok_or_else(|| DbError::Query("No SQL statement to execute".into()))?;

    if !matches!(batch.next(), Ok(None)) {
        return Err(DbError::Query(format!(
            "Expected a single SQL statement, found more text after it: {}",
            sql.chars().take(100).collect::<String>()
        )));
    }
    Ok(stmt)
}

fn is_insert(sql: &str) -> bool {
    first_keyword_in(sql, &["INSERT", "REPLACE"])
}

pub(crate) fn first_keyword_in(sql: &str, keywords: &[&str]) -> bool {
    sql.split_whitespace()
        .next()
        .is_some_and(|first| keywords.iter().any(|k| first.eq_ignore_ascii_case(k)))
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| DbError::Query(e.to_string()))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    };

    Ok(value)
}
