//! The execution loop.
//!
//! Drives a [`StatementScanner`] over the input and submits each statement,
//! in order, to a [`DatabaseClient`]. Result rows go to the output sink. The
//! first failure is written to the error sink and ends the run; statements
//! that already ran keep their effects.

use crate::db::DatabaseClient;
use crate::error::{PsqlError, Result};
use crate::output::write_rows;
use crate::scanner::StatementScanner;
use futures::TryStreamExt;
use std::pin::pin;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Diagnostic for input that has nothing ready to read.
pub const EMPTY_INPUT_MESSAGE: &str = "Input stream is empty";

/// Knobs for a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// How long the readiness probe waits for input. Zero means the input
    /// must already be readable.
    pub input_wait: Duration,
}

/// Counters for a run that completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Statements executed.
    pub statements: usize,
    /// Rows written to the output sink.
    pub rows: usize,
}

/// Result of a run.
///
/// On failure the diagnostic has already been written to the error sink.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every statement executed.
    Success(RunSummary),
    /// The run stopped at the carried error.
    Failure(PsqlError),
}

impl RunOutcome {
    /// Returns true if every statement executed.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the error that stopped the run, if any.
    pub fn error(&self) -> Option<&PsqlError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(err) => Some(err),
        }
    }
}

/// Checks that `reader` can be read from without blocking past `wait`.
///
/// A reader sitting at end-of-stream is ready: it simply has no statements.
pub async fn probe_input<R>(reader: &mut R, wait: Duration) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    match tokio::time::timeout(wait, reader.fill_buf()).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(PsqlError::input(format!("Failed to read input stream: {e}"))),
        Err(_) => Err(PsqlError::input(EMPTY_INPUT_MESSAGE)),
    }
}

/// Runs SQL scripts against an open database session.
#[derive(Debug, Clone, Default)]
pub struct ScriptRunner {
    options: RunOptions,
}

impl ScriptRunner {
    /// Creates a runner with the given options.
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Probes the input, then executes every statement in it.
    ///
    /// The client is not touched when the probe fails.
    pub async fn run<R, W, E>(
        &self,
        client: Box<dyn DatabaseClient>,
        mut input: R,
        output: &mut W,
        errors: &mut E,
    ) -> RunOutcome
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        if let Err(err) = probe_input(&mut input, self.options.input_wait).await {
            return fail(errors, err).await;
        }
        self.execute(client, input, output, errors).await
    }

    /// Executes every statement in `input` without probing it first.
    ///
    /// The client is closed after the last statement succeeds. On failure it
    /// is dropped without a graceful close.
    pub async fn execute<R, W, E>(
        &self,
        client: Box<dyn DatabaseClient>,
        input: R,
        output: &mut W,
        errors: &mut E,
    ) -> RunOutcome
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        match execute_statements(client, input, output).await {
            Ok(summary) => {
                info!(
                    statements = summary.statements,
                    rows = summary.rows,
                    "Script completed"
                );
                RunOutcome::Success(summary)
            }
            Err(err) => {
                // Rows from statements that succeeded still belong on the sink.
                if let Err(e) = output.flush().await {
                    warn!("Failed to flush output: {e}");
                }
                fail(errors, err).await
            }
        }
    }
}

async fn execute_statements<R, W>(
    mut client: Box<dyn DatabaseClient>,
    input: R,
    output: &mut W,
) -> Result<RunSummary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = RunSummary::default();
    let mut statements = pin!(StatementScanner::new(input).into_stream());

    while let Some(statement) = statements
        .try_next()
        .await
        .map_err(|e| PsqlError::input(format!("Failed to read input stream: {e}")))?
    {
        let index = summary.statements + 1;
        debug!(statement = index, "Executing statement");

        let result = client.execute_query(statement.as_str()).await.map_err(|err| {
            debug!(statement = index, "Statement failed");
            err
        })?;

        summary.rows += write_rows(output, &result.rows)
            .await
            .map_err(|e| PsqlError::output(format!("Failed to write results: {e}")))?;
        summary.statements = index;

        debug!(
            statement = index,
            rows = result.row_count(),
            elapsed = ?result.execution_time,
            "Statement finished"
        );
    }

    output
        .flush()
        .await
        .map_err(|e| PsqlError::output(format!("Failed to write results: {e}")))?;

    if let Err(err) = client.close().await {
        debug!("Ignoring close failure after a successful run: {err}");
    }

    Ok(summary)
}

/// Writes the diagnostic for `err` to the error sink and wraps it up.
async fn fail<E>(errors: &mut E, err: PsqlError) -> RunOutcome
where
    E: AsyncWrite + Unpin,
{
    report_error(errors, &err).await;
    RunOutcome::Failure(err)
}

/// Writes `err`'s description, newline-terminated, to the error sink.
///
/// A sink that cannot be written to is only logged.
pub async fn report_error<E>(errors: &mut E, err: &PsqlError)
where
    E: AsyncWrite + Unpin,
{
    let mut diagnostic = err.description().to_string();
    diagnostic.push('\n');

    let written = match errors.write_all(diagnostic.as_bytes()).await {
        Ok(()) => errors.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        warn!("Failed to write diagnostic: {e}");
    }
}
