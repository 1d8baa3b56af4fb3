//! Statement boundary scanning.
//!
//! Splits a line-oriented SQL script into statements. A statement ends when a
//! line boundary is reached and the text collected so far, ignoring trailing
//! whitespace, ends with `;`. This is a line heuristic rather than a SQL
//! tokenizer: a `;` followed by more text on the same line does not split, and
//! a quoted literal whose line happens to end in `;` does.

use futures::stream::{self, Stream};
use std::fmt;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::trace;

/// Line prefix marking a SQL comment.
const COMMENT_PREFIX: &str = "--";

/// psql meta-commands that `pg_dump` writes around its output.
const META_COMMAND_PREFIXES: [&str; 2] = ["\\restrict", "\\unrestrict"];

/// Statement terminator.
const TERMINATOR: char = ';';

/// One complete, trimmed SQL statement without its terminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement(String);

impl Statement {
    /// Builds a statement from raw buffered text.
    ///
    /// Returns `None` if nothing but whitespace and terminators remains.
    fn from_buffer(buffer: &str) -> Option<Self> {
        let text = buffer
            .trim()
            .trim_end_matches(TERMINATOR)
            .trim_end();
        if text.is_empty() {
            None
        } else {
            Some(Self(text.to_string()))
        }
    }

    /// The statement text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the statement, returning its text.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Statement {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns true for lines that never reach the statement buffer.
fn is_ignored_line(line: &str) -> bool {
    line.starts_with(COMMENT_PREFIX)
        || META_COMMAND_PREFIXES
            .iter()
            .any(|prefix| line.starts_with(prefix))
}

/// Returns true once the buffer ends, modulo whitespace, with a terminator.
fn ends_with_terminator(buffer: &str) -> bool {
    buffer.trim_end().ends_with(TERMINATOR)
}

/// Pulls statements out of a line-oriented reader.
pub struct StatementScanner<R> {
    reader: R,
    buffer: String,
    line: String,
    line_number: usize,
    finished: bool,
}

impl<R> StatementScanner<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Creates a scanner over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line: String::new(),
            line_number: 0,
            finished: false,
        }
    }

    /// Number of input lines consumed so far, ignored lines included.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads until the next statement is complete.
    ///
    /// Returns `Ok(None)` once the input is exhausted. A final statement that
    /// lacks a terminator is still returned before that.
    pub async fn next_statement(&mut self) -> io::Result<Option<Statement>> {
        while !self.finished {
            self.line.clear();
            if self.reader.read_line(&mut self.line).await? == 0 {
                self.finished = true;
                break;
            }
            self.line_number += 1;

            if is_ignored_line(&self.line) {
                trace!(line = self.line_number, "Skipping comment or meta-command line");
                continue;
            }

            self.buffer.push_str(&self.line);
            if !ends_with_terminator(&self.buffer) {
                continue;
            }

            let statement = Statement::from_buffer(&self.buffer);
            self.buffer.clear();
            if statement.is_some() {
                return Ok(statement);
            }
        }

        let statement = Statement::from_buffer(&self.buffer);
        self.buffer.clear();
        Ok(statement)
    }

    /// Turns the scanner into a lazy, forward-only stream of statements.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Statement>> {
        stream::try_unfold(self, |mut scanner| async move {
            let next = scanner.next_statement().await?;
            Ok::<_, io::Error>(next.map(|statement| (statement, scanner)))
        })
    }
}
