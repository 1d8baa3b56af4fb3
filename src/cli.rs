//! Command-line argument parsing for psql-lite.
//!
//! Flags follow psql's spelling, so `-h` is the host and help is `--help` only.

use clap::{ArgAction, Parser};
use psql_lite::config::ConnectionConfig;
use psql_lite::error::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Run a file of SQL statements against PostgreSQL, one at a time,
/// stopping at the first error.
///
/// The password is read from the PGPASSWORD environment variable (or a
/// `.env` file), never from the command line.
#[derive(Parser, Debug)]
#[command(name = "psql-lite")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// PostgreSQL connection string (e.g., postgres://user@host:port/database)
    #[arg(value_name = "CONNECTION_STRING")]
    pub connection_string: Option<String>,

    /// Database server host
    #[arg(short = 'h', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Database server port
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database user name
    #[arg(short = 'U', long, value_name = "USER")]
    pub username: Option<String>,

    /// Database name to connect to
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub dbname: Option<String>,

    /// Seconds to wait for the connection to be established
    #[arg(long, value_name = "SECONDS")]
    pub connect_timeout: Option<u64>,

    /// SSL mode (disable, allow, prefer, require, verify-ca, verify-full)
    #[arg(long, value_name = "MODE")]
    pub sslmode: Option<String>,

    /// Read statements from this file instead of stdin
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Milliseconds to wait for input to become readable
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub input_wait: u64,

    /// Log progress to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Converts CLI arguments to a ConnectionConfig.
    ///
    /// This creates a config from CLI args only, without merging with file
    /// config or the environment. Individual flags override the
    /// corresponding parts of a connection string.
    pub fn to_connection_config(&self) -> Result<Option<ConnectionConfig>> {
        let flags = ConnectionConfig {
            host: self.host.clone(),
            port: self.port,
            database: self.dbname.clone(),
            user: self.username.clone(),
            password: None,
            connect_timeout: self.connect_timeout,
            sslmode: self.sslmode.clone(),
        };

        let mut config = match &self.connection_string {
            Some(conn_str) => ConnectionConfig::from_connection_string(conn_str)?,
            None if flags == ConnectionConfig::default() => return Ok(None),
            None => ConnectionConfig::default(),
        };
        config.merge(&flags);

        Ok(Some(config))
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(psql_lite::config::Config::default_path)
    }

    /// Returns the named connection to use, if specified.
    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// How long to wait for input before giving up.
    pub fn input_wait(&self) -> Duration {
        Duration::from_millis(self.input_wait)
    }
}
