//! SQLite transaction implementation

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::Connection as RusqliteConnection;
use sqlfile_core::{DbError, ExecutionOutcome, Result, Transaction};
use std::sync::Arc;

use crate::connection::{execute_statement, first_keyword_in};

/// Statements that would end or nest the surrounding transaction
const TRANSACTION_CONTROL: &[&str] = &["BEGIN", "COMMIT", "END"];

/// SQLite transaction wrapper.
///
/// Issues raw `BEGIN DEFERRED` / `COMMIT` / `ROLLBACK` SQL so that it can share
/// the connection `Arc<Mutex<…>>` without running into rusqlite's borrow-based
/// transaction lifetime requirements.
pub struct SqliteTransaction {
    conn: Arc<Mutex<RusqliteConnection>>,
    committed: bool,
    rolled_back: bool,
}

impl SqliteTransaction {
    /// Wrap a connection on which `BEGIN` has already been issued
    pub(crate) fn new(conn: Arc<Mutex<RusqliteConnection>>) -> Self {
        Self {
            conn,
            committed: false,
            rolled_back: false,
        }
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.committed && !self.rolled_back {
            let conn = self.conn.lock();
            if conn.is_autocommit() {
                return;
            }
            tracing::warn!(
                "SQLite transaction dropped without commit or rollback, issuing automatic rollback"
            );
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                tracing::error!(error = %e, "automatic rollback on drop failed");
            }
        }
    }
}

#[async_trait]
impl Transaction for SqliteTransaction {
    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome> {
        tracing::debug!(sql_preview = %sql.chars().take(100).collect::<String>(), "executing statement in SQLite transaction");

        if first_keyword_in(sql, TRANSACTION_CONTROL) {
            return Err(DbError::Transaction(format!(
                "Transaction control statements cannot run inside the batch transaction: {}",
                sql.chars().take(100).collect::<String>()
            )));
        }

        let conn = self.conn.lock();
        let outcome = execute_statement(&conn, sql)?;
        if conn.is_autocommit() {
            return Err(DbError::Transaction(
                "Statement ended the transaction, its changes were rolled back".into(),
            ));
        }

        tracing::debug!(
            affected_rows = outcome.affected_rows,
            "statement executed in SQLite transaction"
        );
        Ok(outcome)
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        tracing::debug!("committing SQLite transaction");

        if self.rolled_back {
            return Err(DbError::Transaction("Transaction already rolled back".into()));
        }
        if self.committed {
            return Err(DbError::Transaction("Transaction already committed".into()));
        }

        {
            let conn = self.conn.lock();
            conn.execute_batch("COMMIT").map_err(|e| {
                DbError::Transaction(format!("Failed to commit transaction: {}", e))
            })?;
        }

        self.committed = true;
        tracing::debug!("SQLite transaction committed successfully");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        tracing::debug!("rolling back SQLite transaction");

        if self.committed {
            return Err(DbError::Transaction("Transaction already committed".into()));
        }
        if self.rolled_back {
            return Ok(());
        }

        {
            let conn = self.conn.lock();
            // a ROLLBACK statement or an ON CONFLICT ROLLBACK failure already ended it
            if conn.is_autocommit() {
                tracing::debug!("SQLite transaction already ended by a statement");
            } else {
                conn.execute_batch("ROLLBACK").map_err(|e| {
                    DbError::Transaction(format!("Failed to rollback transaction: {}", e))
                })?;
            }
        }

        self.rolled_back = true;
        tracing::debug!("SQLite transaction rolled back successfully");
        Ok(())
    }
}
