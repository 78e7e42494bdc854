//! The immutable statement list produced by the splitter

use std::convert::Infallible;
use std::io::BufRead;
use std::str::FromStr;

use sqlfile_core::{Connection, ExecutionOutcome};

use super::executor::execute_in_transaction;
use crate::error::BatchResult;
use crate::splitter::{Splitter, split_statements};

/// Ordered statements ready for execution.
///
/// Statements are never empty, carry no comments, and have no trailing `;`.
/// The order is the execution order. A batch is not modified by execution
/// and may be executed any number of times against independent connections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementBatch {
    statements: Vec<String>,
}

impl StatementBatch {
    /// Split in-memory SQL text into a batch
    pub fn parse(sql: &str) -> Self {
        Self {
            statements: split_statements(sql),
        }
    }

    /// Split SQL text read line by line from `reader`
    pub fn from_reader<R: BufRead>(reader: R) -> std::io::Result<Self> {
        let mut splitter = Splitter::default();
        for line in reader.lines() {
            splitter.push_line(&line?);
        }
        Ok(Self {
            statements: splitter.finish(),
        })
    }

    /// Get all statements in execution order
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// Get a statement by position
    pub fn get(&self, index: usize) -> Option<&str> {
        self.statements.get(index).map(String::as_str)
    }

    /// Iterate over statements in execution order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.statements.iter().map(String::as_str)
    }

    /// Get the number of statements
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Check if the batch has no statements
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Execute every statement inside one transaction on `conn`.
    ///
    /// See [`execute_in_transaction`].
    pub async fn execute(&self, conn: &dyn Connection) -> BatchResult<Vec<ExecutionOutcome>> {
        execute_in_transaction(conn, self).await
    }

    pub(crate) fn concat(batches: impl IntoIterator<Item = StatementBatch>) -> Self {
        Self {
            statements: batches
                .into_iter()
                .flat_map(|batch| batch.statements)
                .collect(),
        }
    }
}

impl FromStr for StatementBatch {
    type Err = Infallible;

    fn from_str(sql: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(sql))
    }
}

/// Build a batch from statements that are already split.
///
/// Entries are trimmed and blank entries are dropped.
impl From<Vec<String>> for StatementBatch {
    fn from(statements: Vec<String>) -> Self {
        Self {
            statements: statements
                .into_iter()
                .filter_map(|s| {
                    let trimmed = s.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                })
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StatementBatch {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.iter()
    }
}

impl std::fmt::Display for StatementBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{};", statement)?;
        }
        Ok(())
    }
}
