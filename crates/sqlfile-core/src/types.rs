//! Core types shared between the executor and drivers

use serde::{Deserialize, Serialize};

/// Result metadata for a single executed statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Identifier generated by the statement, if it inserted a row
    pub last_insert_id: Option<i64>,
    /// Rows affected by the statement (0 for DDL)
    pub affected_rows: u64,
}

impl ExecutionOutcome {
    /// Outcome for a statement that generated no identifier
    pub fn new(affected_rows: u64) -> Self {
        Self {
            last_insert_id: None,
            affected_rows,
        }
    }

    /// Attach the identifier generated by an insert
    pub fn with_last_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }
}

/// A database value as read back from a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit floating point
    Real(f64),
    /// UTF-8 string
    Text(String),
    /// Binary data
    Blob(Vec<u8>),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Text(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

/// A row from a query result
#[derive(Debug, Clone)]
pub struct Row {
    /// Column values
    pub values: Vec<Value>,
    columns: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }
}

/// Query result
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Column names in select order
    pub columns: Vec<String>,
    /// Result rows
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Create a new empty query result
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First column of the first row, for single-value queries like `SELECT COUNT(*)`
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.get(0))
    }
}
