//! Statement batches and their transactional execution
//!
//! A [`StatementBatch`] is the ordered, comment-free list of statements read
//! from one SQL source. [`execute_in_transaction`] applies it to a connection
//! with all-or-nothing semantics.

mod executor;
mod statement_batch;

pub use executor::execute_in_transaction;
pub use statement_batch::StatementBatch;
