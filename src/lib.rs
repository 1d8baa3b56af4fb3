//! psql-lite - A tiny, non-interactive SQL script runner for PostgreSQL.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod runner;
pub mod scanner;
