//! Integration tests for psql-lite.

pub mod postgres_test;
pub mod runner_test;
