//! psql-lite - A tiny, non-interactive SQL script runner for PostgreSQL.

mod cli;

use clap::error::ErrorKind;
use clap::CommandFactory;
use cli::Cli;
use psql_lite::config::{Config, ConnectionConfig};
use psql_lite::db::PostgresClient;
use psql_lite::error::{PsqlError, Result};
use psql_lite::logging;
use psql_lite::runner::{self, ScriptRunner, EMPTY_INPUT_MESSAGE};
use std::io::IsTerminal;
use std::process::ExitCode;
use tokio::io::{AsyncBufRead, BufReader, BufWriter};
use tracing::{debug, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!("Ignoring .env file: {e}");
        }
    }

    // Configuration problems are usage errors: clap prints them with the
    // usage line and exits with status 2.
    let connection = match resolve_connection(&cli) {
        Ok(connection) => connection,
        Err(e) => Cli::command()
            .error(ErrorKind::InvalidValue, e.description())
            .exit(),
    };

    let success = match &cli.file {
        Some(path) => match tokio::fs::File::open(path).await {
            Ok(file) => run(&cli, &connection, BufReader::new(file)).await,
            Err(e) => {
                let err = PsqlError::input(format!("Failed to open {}: {e}", path.display()));
                report(&err).await;
                false
            }
        },
        None if std::io::stdin().is_terminal() => {
            report(&PsqlError::input(EMPTY_INPUT_MESSAGE)).await;
            false
        }
        None => run(&cli, &connection, BufReader::new(tokio::io::stdin())).await,
    };

    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Probes the input, connects, and runs the script. Returns overall success.
async fn run<R>(cli: &Cli, connection: &ConnectionConfig, mut input: R) -> bool
where
    R: AsyncBufRead + Unpin,
{
    // Nothing touches the database until the input is known to be readable.
    if let Err(e) = runner::probe_input(&mut input, cli.input_wait()).await {
        report(&e).await;
        return false;
    }

    info!("Connecting to {}", connection.display_string());
    let client = match PostgresClient::connect(connection).await {
        Ok(client) => client,
        Err(e) => {
            report(&e).await;
            return false;
        }
    };

    let mut stdout = BufWriter::new(tokio::io::stdout());
    let mut stderr = tokio::io::stderr();

    let outcome = ScriptRunner::default()
        .execute(Box::new(client), input, &mut stdout, &mut stderr)
        .await;
    debug!("Run finished: {:?}", outcome);
    outcome.is_success()
}

/// Writes a diagnostic to stderr.
async fn report(err: &PsqlError) {
    runner::report_error(&mut tokio::io::stderr(), err).await;
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
///
/// Precedence: CLI arguments, then the named (or default) profile from the
/// config file, then libpq environment variables.
fn resolve_connection(cli: &Cli) -> Result<ConnectionConfig> {
    let config_path = cli.config_path();
    debug!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let mut connection = match cli.connection_name() {
        Some(name) => config.get_connection(Some(name)).cloned().ok_or_else(|| {
            PsqlError::config(format!("Connection '{name}' not found in config file"))
        })?,
        None => config.get_connection(None).cloned().unwrap_or_default(),
    };

    if let Some(flags) = cli.to_connection_config()? {
        connection.merge(&flags);
    }

    connection.apply_env_defaults();
    connection.validate()?;

    Ok(connection)
}
