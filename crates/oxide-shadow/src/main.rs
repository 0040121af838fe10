//! oxide-shadow CLI
//!
//! Creates and maintains audit shadow tables for one MySQL schema.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, ValueEnum};
use sqlx::mysql::MySqlConnectOptions;
use tracing::{debug, error, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_shadow::prelude::*;

/// Keeps audit shadow tables and their triggers in sync with base tables.
#[derive(Parser)]
#[command(name = "oxide-shadow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The server host.
    #[arg(short = 'c', long = "connect", env = "MYSQL_HOST", default_value = "localhost")]
    host: String,

    /// The server port.
    #[arg(long, env = "MYSQL_TCP_PORT", default_value_t = 3306)]
    port: u16,

    /// The user account.
    #[arg(short, long, env = "MYSQL_USER", default_value = "root")]
    user: String,

    /// The account password (required).
    #[arg(short, long, env = "MYSQL_PWD", hide_env_values = true)]
    password: Option<String>,

    /// The database schema to shadow (required).
    #[arg(short, long)]
    database: Option<String>,

    /// Append log output to this file instead of stderr.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// The log verbosity level.
    #[arg(short, long, value_enum, default_value_t = Verbosity::Info)]
    verbosity: Verbosity,

    /// Test mode: show what would be done without changing anything.
    #[arg(short, long)]
    test: bool,

    /// The table name suffix that denotes a shadow table.
    #[arg(short, long, default_value = DEFAULT_SHADOW_SUFFIX)]
    shadow_suffix: String,

    /// Write the run summary as JSON to this file.
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Verbosity {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
}

impl Verbosity {
    fn level(self) -> Level {
        match self {
            // tracing has no level above ERROR
            Self::Fatal | Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
        }
    }
}

fn init_logging(level: Level, file: Option<&Path>) -> anyhow::Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false);

    match file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = builder.with_ansi(false).with_writer(Mutex::new(file)).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = builder.with_writer(std::io::stderr).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

/// Turns the command line into core settings and connection options.
fn resolve(cli: &Cli) -> Result<(ShadowConfig, MySqlConnectOptions)> {
    let schema = cli
        .database
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ShadowError::Configuration("--database is required".to_string()))?;
    let password = cli
        .password
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ShadowError::Configuration("--password is required".to_string()))?;
    if cli.user.is_empty() {
        return Err(ShadowError::Configuration(
            "--user must not be empty".to_string(),
        ));
    }

    let config = ShadowConfig::new(schema)
        .shadow_suffix(&cli.shadow_suffix)
        .dry_run(cli.test);
    config.validate()?;

    let options = MySqlConnectOptions::new()
        .host(&cli.host)
        .port(cli.port)
        .username(&cli.user)
        .password(password)
        .database(schema);

    Ok((config, options))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbosity.level(), cli.file.as_deref())?;

    let (config, options) = match resolve(&cli) {
        Ok(resolved) => resolved,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            eprintln!("{err}");
            return Ok(ExitCode::from(2));
        }
    };
    debug!(?config, host = %cli.host, port = cli.port, user = %cli.user, "Resolved options");

    let db = MySqlDatabase::connect(options, &config.schema).await?;
    debug!(version = %db.server_version().await?, "Connected to server");

    let executor = ShadowExecutor::new(db.clone(), db.clone(), config)?;
    debug!(
        schema = db.schema(),
        dialect = executor.dialect().name(),
        "Prepared executor"
    );
    let dry_run = executor.config().dry_run;
    let result = executor.run().await;
    db.close().await;

    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "Run aborted");
            return Ok(ExitCode::FAILURE);
        }
    };

    if dry_run {
        for sql in &summary.statements {
            println!("{sql};");
        }
    }

    if let Some(path) = &cli.summary {
        summary.write_json(path)?;
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
