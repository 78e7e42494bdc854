//! Connection trait and transaction handling

use crate::{ExecutionOutcome, QueryResult, Result};
use async_trait::async_trait;

/// A database connection
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite")
    fn driver_name(&self) -> &str;

    /// Execute a single statement outside of any explicit transaction
    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome>;

    /// Execute a query that returns rows
    async fn query(&self, sql: &str) -> Result<QueryResult>;

    /// Begin a transaction
    ///
    /// The returned transaction must be finished with `commit` or `rollback`.
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

/// A database transaction
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Execute a statement within the transaction
    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}
