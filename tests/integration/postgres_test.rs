//! PostgreSQL integration tests.
//!
//! Runs scripts through the real client. Skipped unless DATABASE_URL is set.

use psql_lite::config::ConnectionConfig;
use psql_lite::db::PostgresClient;
use psql_lite::error::PsqlError;
use psql_lite::runner::{RunOutcome, ScriptRunner};
use std::time::{SystemTime, UNIX_EPOCH};

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to create a test client.
async fn get_test_client() -> Option<PostgresClient> {
    let url = get_test_database_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    PostgresClient::connect(&config).await.ok()
}

/// Suffix that keeps object names from colliding between runs.
fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{nanos:x}")
}

/// Runs `script` and returns the outcome with the captured sinks.
async fn run_script(client: PostgresClient, script: &str) -> (RunOutcome, String, String) {
    let mut output = Vec::new();
    let mut errors = Vec::new();
    let outcome = ScriptRunner::default()
        .run(Box::new(client), script.as_bytes(), &mut output, &mut errors)
        .await;
    (
        outcome,
        String::from_utf8(output).unwrap(),
        String::from_utf8(errors).unwrap(),
    )
}

#[tokio::test]
async fn test_handle_multiple_queries() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let (outcome, output, errors) = run_script(client, "SELECT 1;\nSELECT 2;").await;

    assert!(outcome.is_success(), "{errors}");
    assert_eq!(output, "1\n2\n");
}

#[tokio::test]
async fn test_create_then_select_sees_new_object() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let table = format!("psql_lite_{}", unique_suffix());
    let script = format!(
        "CREATE TEMPORARY TABLE {table} (id int, label text);\n\
         INSERT INTO {table} VALUES (1, 'one'), (2, NULL);\n\
         SELECT id, label FROM {table} ORDER BY id;\n"
    );

    let (outcome, output, errors) = run_script(client, &script).await;

    assert!(outcome.is_success(), "{errors}");
    assert_eq!(output, "1\tone\n2\t\n");
}

#[tokio::test]
async fn test_skip_comment_and_restrict_lines() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let script = format!(
        "\\restrict {id}\nSELECT 1;\n-- foo {id}\nSELECT 2;\n\\unrestrict {id}\n",
        id = unique_suffix()
    );

    let (outcome, output, errors) = run_script(client, &script).await;

    assert!(outcome.is_success(), "{errors}");
    assert_eq!(output, "1\n2\n");
}

#[tokio::test]
async fn test_report_specific_query_on_error() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let wrong_query = format!("SLEECT foooo_{}", unique_suffix());
    let (outcome, _, errors) = run_script(client, &format!("SELECT 1;\n{wrong_query};\n")).await;

    assert!(matches!(outcome, RunOutcome::Failure(PsqlError::Query(_))));
    assert!(errors.contains(&wrong_query), "{errors}");
    assert!(!errors.contains("SELECT 1"));
}

#[tokio::test]
async fn test_report_specific_query_on_error_in_ending_file() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let wrong_query = format!("SLEECT foooo_{}", unique_suffix());
    let (outcome, _, errors) = run_script(client, &format!("SELECT 1;\n{wrong_query}")).await;

    assert!(!outcome.is_success());
    assert!(errors.contains(&wrong_query), "{errors}");
    assert!(!errors.contains("SELECT 1"));
}

#[tokio::test]
async fn test_erroneous_connection_parameters() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let user = format!("root_{}", unique_suffix());
    let mut config = ConnectionConfig::from_connection_string(&url).unwrap();
    config.user = Some(user.clone());
    config.password = Some(unique_suffix());
    config.database = None;

    let error = PostgresClient::connect(&config).await.unwrap_err();

    assert!(matches!(error, PsqlError::Connection(_)));
    assert!(error.description().contains(&user), "{error}");
}
