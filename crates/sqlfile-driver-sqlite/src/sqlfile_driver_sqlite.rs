//! SQLite database driver implementation

mod connection;
mod transaction;

pub use connection::SqliteConnection;
pub use transaction::SqliteTransaction;
