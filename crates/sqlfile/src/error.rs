//! Errors raised while loading or executing a statement batch

use std::path::PathBuf;

use sqlfile_core::DbError;
use thiserror::Error;

pub type BatchResult<T> = Result<T, BatchError>;

/// Failure of a load or of a transactional batch execution.
///
/// Driver errors are carried unchanged as the error source; only the
/// position of the failing statement is added.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Failed to read SQL source {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to begin transaction: {0}")]
    Begin(#[source] DbError),

    #[error(
        "Statement {index} failed: {source}{}",
        .rollback_error
            .as_ref()
            .map(|e| format!(" (rollback also failed: {e})"))
            .unwrap_or_default()
    )]
    Exec {
        /// Zero-based position of the statement in the batch
        index: usize,
        statement: String,
        #[source]
        source: DbError,
        /// Set when the rollback issued after the failure also failed
        rollback_error: Option<DbError>,
    },

    #[error("Failed to commit transaction: {0}")]
    Commit(#[source] DbError),
}

impl BatchError {
    /// Index of the failing statement, for `Exec` errors
    pub fn statement_index(&self) -> Option<usize> {
        match self {
            BatchError::Exec { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Whether the transaction was left without a confirmed rollback
    pub fn rollback_failed(&self) -> bool {
        matches!(
            self,
            BatchError::Exec {
                rollback_error: Some(_),
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_exec_error_display() {
        let err = BatchError::Exec {
            index: 1,
            statement: "INSERT INTO missing VALUES (1)".into(),
            source: DbError::Query("no such table: missing".into()),
            rollback_error: None,
        };

        assert_eq!(
            err.to_string(),
            "Statement 1 failed: Query error: no such table: missing"
        );
        assert_eq!(err.statement_index(), Some(1));
        assert!(!err.rollback_failed());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_exec_error_display_with_rollback_failure() {
        let err = BatchError::Exec {
            index: 0,
            statement: "BAD".into(),
            source: DbError::Query("syntax error".into()),
            rollback_error: Some(DbError::Transaction("connection lost".into())),
        };

        assert_eq!(
            err.to_string(),
            "Statement 0 failed: Query error: syntax error (rollback also failed: Transaction error: connection lost)"
        );
        assert!(err.rollback_failed());
    }

    #[test]
    fn test_read_error_keeps_io_source() {
        let err = BatchError::Read {
            path: PathBuf::from("missing.sql"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };

        assert!(err.to_string().starts_with("Failed to read SQL source missing.sql"));
        let source = err.source().and_then(|s| s.downcast_ref::<std::io::Error>());
        assert_eq!(source.map(|e| e.kind()), Some(std::io::ErrorKind::NotFound));
        assert_eq!(err.statement_index(), None);
    }
}
