//! Transactional batch executor
//!
//! Runs every statement of a batch inside one transaction. The transaction
//! is committed only if every statement succeeds; the first failure rolls it
//! back and no later statement is attempted.

use sqlfile_core::{Connection, ExecutionOutcome};

use super::StatementBatch;
use crate::error::{BatchError, BatchResult};

const SQL_PREVIEW_CHARS: usize = 100;

/// Execute `batch` on `conn` with all-or-nothing semantics.
///
/// Returns one [`ExecutionOutcome`] per statement, in batch order, once the
/// transaction has committed. An empty batch begins and commits an empty
/// transaction.
///
/// # Errors
/// - [`BatchError::Begin`] if the transaction cannot be started; nothing is executed
/// - [`BatchError::Exec`] for the first failing statement, after rolling back
/// - [`BatchError::Commit`] if the final commit fails
#[tracing::instrument(
    skip_all,
    fields(driver = conn.driver_name(), statement_count = batch.len())
)]
pub async fn execute_in_transaction(
    conn: &dyn Connection,
    batch: &StatementBatch,
) -> BatchResult<Vec<ExecutionOutcome>> {
    let transaction = conn.begin_transaction().await.map_err(|e| {
        tracing::error!(error = %e, "failed to begin transaction");
        BatchError::Begin(e)
    })?;
    tracing::debug!("transaction started");

    let mut outcomes = Vec::with_capacity(batch.len());

    for (index, sql) in batch.iter().enumerate() {
        tracing::debug!(
            index,
            sql_preview = %sql.chars().take(SQL_PREVIEW_CHARS).collect::<String>(),
            "executing statement"
        );

        match transaction.execute(sql).await {
            Ok(outcome) => {
                tracing::debug!(
                    index,
                    affected_rows = outcome.affected_rows,
                    last_insert_id = ?outcome.last_insert_id,
                    "statement executed"
                );
                outcomes.push(outcome);
            }
            Err(source) => {
                tracing::warn!(index, error = %source, "statement failed, rolling back transaction");

                let rollback_error = match transaction.rollback().await {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::error!(index, error = %e, "rollback after failed statement also failed");
                        Some(e)
                    }
                };

                return Err(BatchError::Exec {
                    index,
                    statement: sql.to_string(),
                    source,
                    rollback_error,
                });
            }
        }
    }

    transaction.commit().await.map_err(|e| {
        tracing::error!(error = %e, "failed to commit transaction");
        BatchError::Commit(e)
    })?;

    tracing::info!(statements = outcomes.len(), "transaction committed");
    Ok(outcomes)
}
