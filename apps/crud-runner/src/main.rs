//! Runs the People CRUD scenario and reports each case.
//!
//! Connection settings are layered: defaults, then the `--config` TOML file,
//! then `TEST_DB_*` environment variables, then command-line flags.
//! Exit status is 0 when every case and teardown pass, 1 on any failure,
//! and 2 when setup fails and no case could run.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use people_crud::{run_suite, ConnectionConfig, MemoryStore, PgStore, Step, SuiteReport};

/// Store the scenario runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Command-line arguments for the CRUD runner.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with connection settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server host
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Login role
    #[arg(short, long)]
    user: Option<String>,

    /// Login password
    #[arg(long)]
    password: Option<String>,

    /// Database name
    #[arg(short, long)]
    database: Option<String>,

    /// Store to run against
    #[arg(long, value_enum, default_value_t = Backend::Postgres)]
    backend: Backend,

    /// Run only the named steps, in the order given (repeatable)
    #[arg(long = "step", value_name = "NAME")]
    steps: Vec<Step>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

impl Args {
    fn connection_config(&self) -> anyhow::Result<ConnectionConfig> {
        let mut config = match &self.config {
            Some(path) => ConnectionConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ConnectionConfig::default(),
        };
        config.apply_env_overrides()?;
        self.apply_flags(&mut config);
        Ok(config)
    }

    fn apply_flags(&self, config: &mut ConnectionConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(password) = &self.password {
            config.password = password.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
    }

    fn steps(&self) -> Vec<Step> {
        if self.steps.is_empty() {
            Step::ALL.to_vec()
        } else {
            self.steps.clone()
        }
    }
}

fn print_report(report: &SuiteReport, format: Format) -> anyhow::Result<()> {
    match format {
        Format::Text => println!("{}", report),
        Format::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Logs go to stderr so the report on stdout stays machine-readable
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let steps = args.steps();
    let outcome = match args.backend {
        Backend::Memory => run_suite(MemoryStore::new(), &steps).await,
        Backend::Postgres => {
            let config = args.connection_config()?;
            tracing::debug!(?config, "Connection settings");
            match PgStore::connect(&config).await {
                Ok(store) => run_suite(store, &steps).await,
                Err(e) => Err(e),
            }
        }
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Setup failed, no steps were run: {}", e);
            eprintln!("setup failed: {}", e);
            return Ok(ExitCode::from(2));
        }
    };

    print_report(&report, args.format)?;
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
