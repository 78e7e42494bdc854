//! sqlfile core - traits and types shared by the sqlfile crates
//!
//! This crate defines the boundary between the statement executor and the
//! database drivers:
//!
//! - `Connection` - an open database connection able to start transactions
//! - `Transaction` - a running transaction that executes statements
//! - `ExecutionOutcome` - per-statement result metadata
//! - `QueryResult`, `Row`, `Value` - a small row model for reading state back

mod connection;
mod error;
mod types;

pub use connection::*;
pub use error::*;
pub use types::*;
