//! Script runner integration tests.
//!
//! Drives the public runner API end to end against the mock client.

use pretty_assertions::assert_eq;
use psql_lite::db::{MockDatabaseClient, QueryResult, ResultRow};
use psql_lite::error::PsqlError;
use psql_lite::runner::{RunOptions, RunOutcome, ScriptRunner};
use std::io::Write;
use std::time::Duration;
use tokio::io::BufReader;

const DUMP: &str = "\
\\restrict 5UEGLb9HU6QA63x35MgWqzbmletmlvUzXxHZpV9OjQoTPDK2KmSZIGhFUkGJG5U
-- Dumped from database version 17.6
SET statement_timeout = 0;
SET client_encoding = 'UTF8';

CREATE TABLE public.users (
    id integer NOT NULL,
    email text NOT NULL
);

INSERT INTO public.users VALUES (1, 'alice@example.com');
SELECT 1, 'alice@example.com';
\\unrestrict 5UEGLb9HU6QA63x35MgWqzbmletmlvUzXxHZpV9OjQoTPDK2KmSZIGhFUkGJG5U
";

#[tokio::test]
async fn test_runs_pg_dump_style_script_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DUMP.as_bytes()).unwrap();

    let input = BufReader::new(tokio::fs::File::open(file.path()).await.unwrap());
    let client = MockDatabaseClient::new();
    let handle = client.handle();
    let mut output = Vec::new();
    let mut errors = Vec::new();

    let runner = ScriptRunner::new(RunOptions {
        input_wait: Duration::from_secs(5),
    });
    let outcome = runner
        .run(Box::new(client), input, &mut output, &mut errors)
        .await;

    assert!(outcome.is_success(), "unexpected failure: {:?}", outcome.error());
    assert_eq!(String::from_utf8(output).unwrap(), "1\talice@example.com\n");
    assert!(errors.is_empty());

    let executed = handle.executed();
    assert_eq!(executed.len(), 5);
    assert_eq!(executed[0], "SET statement_timeout = 0");
    assert_eq!(
        executed[2],
        "CREATE TABLE public.users (\n    id integer NOT NULL,\n    email text NOT NULL\n)"
    );
    assert!(executed
        .iter()
        .all(|sql| !sql.contains("restrict") && !sql.contains("Dumped from")));
    assert!(handle.is_closed());
}

#[tokio::test]
async fn test_canned_rows_stream_in_server_order() {
    let rows = vec![
        ResultRow::new(vec![Some("postgres".to_string()), Some("t".to_string())]),
        ResultRow::new(vec![Some("template1".to_string()), None]),
    ];
    let client = MockDatabaseClient::new().with_result(
        "SELECT datname, datallowconn FROM pg_database",
        QueryResult::with_rows(rows),
    );
    let mut output = Vec::new();
    let mut errors = Vec::new();

    let outcome = ScriptRunner::default()
        .run(
            Box::new(client),
            "SELECT datname, datallowconn FROM pg_database".as_bytes(),
            &mut output,
            &mut errors,
        )
        .await;

    match outcome {
        RunOutcome::Success(summary) => {
            assert_eq!(summary.statements, 1);
            assert_eq!(summary.rows, 2);
        }
        RunOutcome::Failure(err) => panic!("unexpected failure: {err}"),
    }
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "postgres\tt\ntemplate1\t\n"
    );
}

#[tokio::test]
async fn test_error_sink_names_only_the_failing_statement() {
    let script = "SELECT 1;\nSLEECT foooo_65f1c2;\nSELECT 2;\n";
    let client = MockDatabaseClient::new();
    let handle = client.handle();
    let mut output = Vec::new();
    let mut errors = Vec::new();

    let outcome = ScriptRunner::default()
        .run(Box::new(client), script.as_bytes(), &mut output, &mut errors)
        .await;

    assert!(matches!(outcome, RunOutcome::Failure(PsqlError::Query(_))));
    let errors = String::from_utf8(errors).unwrap();
    assert!(errors.contains("SLEECT foooo_65f1c2"));
    assert!(!errors.contains("SELECT 1"));
    assert!(!errors.contains("SELECT 2"));
    assert_eq!(errors.lines().filter(|l| l.starts_with("ERROR")).count(), 1);
    assert_eq!(String::from_utf8(output).unwrap(), "1\n");
    assert!(!handle.is_closed());
}
