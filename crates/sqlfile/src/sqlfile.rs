//! sqlfile - run SQL files as a single transaction
//!
//! Loads text containing SQL statements, strips `--` and `/* */` comments,
//! splits it on `;` into a [`StatementBatch`], and executes the batch against
//! a [`sqlfile_core::Connection`] inside one transaction.
//!
//! ```ignore
//! let batch = StatementBatch::load("schema.sql")?;
//! let outcomes = batch.execute(&conn).await?;
//! ```

pub mod batch;
mod error;
mod loader;
mod splitter;
#[cfg(test)]
mod test_helpers;

pub use batch::{StatementBatch, execute_in_transaction};
pub use error::{BatchError, BatchResult};
pub use splitter::split_statements;

pub use sqlfile_core::{Connection, DbError, ExecutionOutcome, Transaction};
