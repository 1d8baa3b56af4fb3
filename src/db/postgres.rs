//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! for PostgreSQL databases using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{DatabaseClient, QueryResult, ResultRow};
use crate::error::{PsqlError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{
    PgConnectOptions, PgConnection, PgDatabaseError, PgErrorPosition, PgRow, PgSslMode,
};
use sqlx::{Connection, Row as SqlxRow};
use std::time::{Duration, Instant};
use tracing::debug;

/// Name reported to the server in `pg_stat_activity`.
const APPLICATION_NAME: &str = "psql-lite";

/// PostgreSQL database client.
///
/// Wraps a single connection rather than a pool so that session state
/// (`SET`, temporary tables, open transactions) carries from one statement
/// to the next, the way a script run through `psql` behaves.
#[derive(Debug)]
pub struct PostgresClient {
    conn: PgConnection,
}

impl PostgresClient {
    /// Opens a new session using the given configuration.
    ///
    /// A single attempt is made; the optional connect timeout bounds it.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let options = connect_options(config)?;
        debug!("Connecting to {}", config.display_string());

        let connecting = PgConnection::connect_with(&options);
        let result = match config.connect_timeout {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), connecting)
                .await
                .map_err(|_| {
                    PsqlError::connection(format!(
                        "connection to server at \"{}\", port {} failed: timeout expired after {secs} seconds",
                        config.host.as_deref().unwrap_or("localhost"),
                        config.port(),
                    ))
                })?,
            None => connecting.await,
        };

        let conn = result.map_err(|e| map_connection_error(&e, config))?;
        debug!("Successfully connected to database");
        Ok(Self { conn })
    }

    /// Creates a client from an existing connection.
    ///
    /// This is primarily useful for testing.
    pub fn from_connection(conn: PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        // Simple query protocol: values come back in text format and a
        // statement may carry several commands, as with libpq. Command
        // completions are dropped; only rows are kept.
        let rows: Vec<PgRow> = sqlx::raw_sql(sql)
            .fetch_many(&mut self.conn)
            .try_filter_map(|step| async move { Ok(step.right()) })
            .try_collect()
            .await
            .map_err(|e| PsqlError::query(format_query_error(&e, sql)))?;

        let execution_time = start.elapsed();

        let rows = rows
            .iter()
            .map(convert_row)
            .collect::<Result<Vec<ResultRow>>>()?;

        Ok(QueryResult::with_rows(rows).with_execution_time(execution_time))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.conn
            .close()
            .await
            .map_err(|e| PsqlError::connection(format!("Failed to close connection: {e}")))
    }
}

/// Builds sqlx connect options from the resolved configuration.
fn connect_options(config: &ConnectionConfig) -> Result<PgConnectOptions> {
    let mut options = PgConnectOptions::new()
        .host(config.host.as_deref().unwrap_or("localhost"))
        .port(config.port())
        .application_name(APPLICATION_NAME);

    if let Some(user) = &config.user {
        options = options.username(user);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }
    if let Some(database) = &config.database {
        options = options.database(database);
    }
    if let Some(mode) = &config.sslmode {
        let mode = mode
            .parse::<PgSslMode>()
            .map_err(|e| PsqlError::config(format!("Invalid sslmode '{mode}': {e}")))?;
        options = options.ssl_mode(mode);
    }

    Ok(options)
}

/// Converts a text-format PgRow to our row type.
fn convert_row(row: &PgRow) -> Result<ResultRow> {
    (0..row.len())
        .map(|index| {
            row.try_get_unchecked::<Option<String>, _>(index)
                .map_err(|e| PsqlError::query(format!("Failed to decode column {index}: {e}")))
        })
        .collect::<Result<Vec<_>>>()
        .map(ResultRow::new)
}

/// Maps sqlx connection errors to libpq-style messages.
///
/// The server's own wording is kept intact so that, for example, an
/// authentication failure still names the rejected user.
fn map_connection_error(error: &sqlx::Error, config: &ConnectionConfig) -> PsqlError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port();

    let reason = match error.as_database_error() {
        Some(db_error) => format!("FATAL:  {}", db_error.message()),
        None => error.to_string(),
    };

    PsqlError::connection(format!(
        "connection to server at \"{host}\", port {port} failed: {reason}"
    ))
}

/// Formats a query error the way libpq reports it.
///
/// The failing statement is always identifiable from the result: either as a
/// `LINE n:` excerpt pointing at the server-reported position, or in full on a
/// `STATEMENT:` line.
fn format_query_error(error: &sqlx::Error, sql: &str) -> String {
    let Some(db_error) = error.as_database_error() else {
        return format!("ERROR:  {error}\nSTATEMENT:  {sql}");
    };

    let mut result = String::from("ERROR:  ");
    result.push_str(db_error.message());

    let Some(pg_error) = db_error.try_downcast_ref::<PgDatabaseError>() else {
        result.push_str("\nSTATEMENT:  ");
        result.push_str(sql);
        return result;
    };

    match pg_error.position().and_then(|pos| match pos {
        PgErrorPosition::Original(position) => line_excerpt(sql, position),
        PgErrorPosition::Internal { .. } => None,
    }) {
        Some(excerpt) => {
            result.push('\n');
            result.push_str(&excerpt);
        }
        None => {
            result.push_str("\nSTATEMENT:  ");
            result.push_str(sql);
        }
    }

    if let Some(detail) = pg_error.detail() {
        result.push_str("\nDETAIL:  ");
        result.push_str(detail);
    }

    if let Some(hint) = pg_error.hint() {
        result.push_str("\nHINT:  ");
        result.push_str(hint);
    }

    result
}

/// Renders the line of `sql` containing the 1-based character `position`,
/// followed by a caret under the offending character.
fn line_excerpt(sql: &str, position: usize) -> Option<String> {
    let target = position.checked_sub(1)?;
    let chars: Vec<char> = sql.chars().collect();
    if target > chars.len() {
        return None;
    }

    let mut line_number = 1;
    let mut line_start = 0;
    for (index, c) in chars.iter().enumerate().take(target) {
        if *c == '\n' {
            line_number += 1;
            line_start = index + 1;
        }
    }

    let line: String = chars[line_start..]
        .iter()
        .take_while(|c| **c != '\n' && **c != '\r')
        .collect();
    let prefix = format!("LINE {line_number}: ");
    let indent = prefix.chars().count() + (target - line_start);

    Some(format!("{prefix}{line}\n{}^", " ".repeat(indent)))
}
