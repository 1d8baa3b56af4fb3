//! Query result types for psql-lite.
//!
//! Defines the structures used to represent statement results from the database.

use std::time::Duration;

/// Represents the result of executing a single statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Rows of data, in the order the server returned them.
    pub rows: Vec<ResultRow>,

    /// Time taken to execute the statement.
    pub execution_time: Duration,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query result with the given rows.
    pub fn with_rows(rows: Vec<ResultRow>) -> Self {
        Self {
            rows,
            execution_time: Duration::ZERO,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the statement produced no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row of a result set.
///
/// Each column holds the server's text rendering of the value, or `None` for
/// SQL NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRow {
    values: Vec<Option<String>>,
}

impl ResultRow {
    /// Creates a row from its column values.
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// Returns the column values in order.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<Option<S>> for ResultRow {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|v| v.map(Into::into)).collect())
    }
}
