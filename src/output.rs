//! Result row serialization.
//!
//! Rows are written one per line with columns separated by a tab. SQL NULL is
//! written as an empty field, matching what libpq's text rendering gives.

use crate::db::ResultRow;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Column separator.
const FIELD_SEPARATOR: &str = "\t";

/// Row terminator.
const RECORD_TERMINATOR: char = '\n';

/// Renders a row as a tab-separated line, terminator included.
pub fn format_row(row: &ResultRow) -> String {
    let mut line = row
        .values()
        .iter()
        .map(|value| value.as_deref().unwrap_or_default())
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR);
    line.push(RECORD_TERMINATOR);
    line
}

/// Writes every row to `output` in order and returns how many were written.
///
/// An empty slice writes nothing at all.
pub async fn write_rows<W>(output: &mut W, rows: &[ResultRow]) -> io::Result<usize>
where
    W: AsyncWrite + Unpin,
{
    for row in rows {
        output.write_all(format_row(row).as_bytes()).await?;
    }
    Ok(rows.len())
}
