//! Scripted connection for executor tests
//!
//! Expectations are queued in call order. Every call the executor makes is
//! recorded and checked against the next expectation; an unexpected call
//! panics the test.
//!
//! ```ignore
//! let conn = MockConnection::new();
//! conn.expect_begin()
//!     .expect_execute("DROP TABLE IF EXISTS users", ExecutionOutcome::new(0))
//!     .expect_commit();
//! batch.execute(&conn).await?;
//! conn.assert_expectations_met();
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlfile_core::{
    Connection, DbError, ExecutionOutcome, QueryResult, Result, Transaction,
};

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Begin,
    Execute(String),
    Commit,
    Rollback,
}

#[derive(Debug)]
enum Expectation {
    Begin(Option<DbError>),
    Execute {
        sql: String,
        result: Result<ExecutionOutcome>,
    },
    Commit(Option<DbError>),
    Rollback(Option<DbError>),
}

#[derive(Debug, Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    calls: Vec<Call>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn expect_begin(&self) -> &Self {
        self.push(Expectation::Begin(None))
    }

    pub(crate) fn expect_begin_error(&self, error: DbError) -> &Self {
        self.push(Expectation::Begin(Some(error)))
    }

    pub(crate) fn expect_execute(&self, sql: &str, outcome: ExecutionOutcome) -> &Self {
        self.push(Expectation::Execute {
            sql: sql.to_string(),
            result: Ok(outcome),
        })
    }

    pub(crate) fn expect_execute_error(&self, sql: &str, error: DbError) -> &Self {
        self.push(Expectation::Execute {
            sql: sql.to_string(),
            result: Err(error),
        })
    }

    pub(crate) fn expect_commit(&self) -> &Self {
        self.push(Expectation::Commit(None))
    }

    pub(crate) fn expect_commit_error(&self, error: DbError) -> &Self {
        self.push(Expectation::Commit(Some(error)))
    }

    pub(crate) fn expect_rollback(&self) -> &Self {
        self.push(Expectation::Rollback(None))
    }

    pub(crate) fn expect_rollback_error(&self, error: DbError) -> &Self {
        self.push(Expectation::Rollback(Some(error)))
    }

    /// Calls made so far, in order
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub(crate) fn assert_expectations_met(&self) {
        let state = self.state.lock();
        assert!(
            state.expectations.is_empty(),
            "unfulfilled expectations: {:?}",
            state.expectations
        );
    }

    fn push(&self, expectation: Expectation) -> &Self {
        self.state.lock().expectations.push_back(expectation);
        self
    }

    fn transaction(&self) -> MockTransaction {
        MockTransaction {
            state: Arc::clone(&self.state),
        }
    }
}

fn next_expectation(state: &Mutex<MockState>, call: Call) -> Expectation {
    let mut state = state.lock();
    state.calls.push(call.clone());
    match state.expectations.pop_front() {
        Some(expectation) => expectation,
        None => panic!("unexpected call {call:?}: no expectations left"),
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome> {
        panic!("unexpected autocommit execute: {sql}")
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        panic!("unexpected query: {sql}")
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        match next_expectation(&self.state, Call::Begin) {
            Expectation::Begin(None) => Ok(Box::new(self.transaction())),
            Expectation::Begin(Some(error)) => Err(error),
            other => panic!("begin called, expected {other:?}"),
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

struct MockTransaction {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl Transaction for MockTransaction {
    async fn execute(&self, sql: &str) -> Result<ExecutionOutcome> {
        match next_expectation(&self.state, Call::Execute(sql.to_string())) {
            Expectation::Execute {
                sql: expected,
                result,
            } => {
                assert_eq!(sql, expected, "statement executed out of order");
                result
            }
            other => panic!("execute({sql}) called, expected {other:?}"),
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        match next_expectation(&self.state, Call::Commit) {
            Expectation::Commit(error) => error.map_or(Ok(()), Err),
            other => panic!("commit called, expected {other:?}"),
        }
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        match next_expectation(&self.state, Call::Rollback) {
            Expectation::Rollback(error) => error.map_or(Ok(()), Err),
            other => panic!("rollback called, expected {other:?}"),
        }
    }
}
