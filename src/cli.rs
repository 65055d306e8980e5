//! Command line entry: `serve`, `submit`, `rescore`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::api::{self, ApiContext};
use crate::config::{AppConfig, ConfigError, APP_NAME, APP_VERSION};
use crate::db::{DatabaseError, SqliteStore};
use crate::pipeline::{build_flow, PipelineError};

#[derive(Parser, Debug)]
#[command(name = "swiftcare")]
#[command(version)]
#[command(about = "Patient triage service with a prioritized dashboard API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Serve the dashboard API
    Serve {
        /// Listen address, overrides SWIFTCARE_BIND
        #[arg(short = 'b', long = "bind", value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },
    /// Run one JSON patient record through the triage flow
    Submit {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Re-apply the triage rule table to every stored patient
    Rescore,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

/// Execute a parsed command line.
///
/// Must be called from plain synchronous `main`: the triage flow owns
/// blocking HTTP clients, and `serve` builds its own runtime.
pub fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::from_env()?;
    tracing::info!(version = APP_VERSION, db = %config.db_path.display(), "{APP_NAME} starting");

    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    let flow = Arc::new(build_flow(&config, store.clone())?);

    match cli.command {
        Command::Serve { bind } => {
            let addr = bind.unwrap_or(config.bind_addr);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let ctx = ApiContext::new(store, flow.clone());
            runtime.block_on(api::serve(addr, ctx))?;
            // Shut down before `flow` drops; its blocking clients must not
            // be released on a runtime thread.
            drop(runtime);
        }
        Command::Submit { path } => {
            let raw = std::fs::read_to_string(&path)?;
            let candidate = serde_json::from_str(&raw)?;
            let outcome = flow.run(candidate)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Rescore => {
            let report = flow.rescore_all()?;
            println!(
                "Rescored {} patients, {} updated, {} kept model scores",
                report.examined, report.updated, report.skipped
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_with_bind() {
        let cli = Cli::try_parse_from(["swiftcare", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Serve {
                bind: Some("0.0.0.0:9000".parse().unwrap())
            }
        );
    }

    #[test]
    fn parses_submit_and_rescore() {
        let cli = Cli::try_parse_from(["swiftcare", "submit", "patient.json"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Submit {
                path: PathBuf::from("patient.json")
            }
        );

        let cli = Cli::try_parse_from(["swiftcare", "rescore"]).unwrap();
        assert_eq!(cli.command, Command::Rescore);
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["swiftcare"]).is_err());
        assert!(Cli::try_parse_from(["swiftcare", "serve", "--bind", "nope"]).is_err());
    }
}
