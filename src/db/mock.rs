//! Mock database clients for testing.
//!
//! Provides in-memory implementations that record what they were asked to do,
//! so the runner can be exercised without a PostgreSQL server.

use super::{DatabaseClient, QueryResult, ResultRow};
use crate::error::{PsqlError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Statement keywords the mock accepts; anything else is a syntax error.
const KNOWN_KEYWORDS: &[&str] = &[
    "SELECT", "VALUES", "WITH", "CREATE", "DROP", "ALTER", "INSERT", "UPDATE", "DELETE",
    "TRUNCATE", "SET", "BEGIN", "COMMIT", "ROLLBACK", "GRANT", "REVOKE", "COMMENT",
];

/// Shared view of what a mock client has done, usable after the client
/// itself has been handed to the runner.
#[derive(Debug, Clone, Default)]
pub struct MockHandle {
    executed: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl MockHandle {
    /// Statements submitted so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|executed| executed.clone())
            .unwrap_or_default()
    }

    /// Whether `close` was called on the client.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, sql: &str) {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A mock database client that answers simple statements.
///
/// `SELECT a, b, ...` yields one row with the listed literals (quotes
/// stripped, `NULL` as a null value). Other known statements yield no rows.
/// Canned results can be registered per statement text.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    handle: MockHandle,
    canned: HashMap<String, QueryResult>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fixed result for an exact statement text.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.canned.insert(sql.into(), result);
        self
    }

    /// Returns a handle for inspecting the client after it has been moved.
    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        self.handle.record(sql);

        if let Some(result) = self.canned.get(sql) {
            return Ok(result.clone());
        }

        let keyword = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_uppercase();

        if !KNOWN_KEYWORDS.contains(&keyword.as_str()) {
            let first_word = sql.split_whitespace().next().unwrap_or_default();
            return Err(PsqlError::query(format!(
                "ERROR:  syntax error at or near \"{first_word}\"\nLINE 1: {sql}\n        ^"
            )));
        }

        let result = if keyword == "SELECT" {
            let projection = sql
                .split_once(char::is_whitespace)
                .map_or("", |(_, rest)| rest.trim());
            let row = projection
                .split(',')
                .map(|literal| parse_literal(literal.trim()))
                .collect();
            QueryResult::with_rows(vec![ResultRow::new(row)])
        } else {
            QueryResult::new()
        };

        Ok(result.with_execution_time(Duration::from_millis(1)))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.handle.mark_closed();
        Ok(())
    }
}

/// Turns a SQL literal into its text rendering.
fn parse_literal(literal: &str) -> Option<String> {
    if literal.eq_ignore_ascii_case("NULL") {
        return None;
    }
    let unquoted = literal
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .map(|inner| inner.replace("''", "'"));
    Some(unquoted.unwrap_or_else(|| literal.to_string()))
}

/// A mock database client whose every statement fails.
#[derive(Debug)]
pub struct FailingDatabaseClient {
    handle: MockHandle,
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a client that rejects every statement with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            handle: MockHandle::default(),
            message: message.into(),
        }
    }

    /// Returns a handle for inspecting the client after it has been moved.
    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        self.handle.record(sql);
        Err(PsqlError::query(self.message.clone()))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.handle.mark_closed();
        Ok(())
    }
}
