//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! framebridge command-line runner
//!
//! Loads a data source configuration, runs a batch of queries from a JSON
//! file and prints the per-query tables and errors as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use framebridge_core::config::DEFAULT_CONFIG_PATH;
use framebridge_core::types::{BatchRequest, Query};
use framebridge_core::{BridgeConfig, BRIDGE_NAME};
use framebridge_engine::{BatchExecutor, DefaultHandleFactory, ENGINE_VERSION};

#[derive(Parser)]
#[command(name = "framebridge")]
#[command(about = "Run query batches against wide-column, metrics and object storage backends")]
#[command(version = ENGINE_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a batch of queries
    Query {
        /// Configuration file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// JSON file with the queries to run
        #[arg(short, long)]
        batch: PathBuf,

        /// Override the per-query timeout in milliseconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_ms: Option<u64>,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Report data source health
    Health {
        /// Configuration file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

/// Batch file: either `{"queries": [...]}` or a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum BatchFile {
    Wrapped { queries: Vec<Query> },
    Bare(Vec<Query>),
}

impl BatchFile {
    fn into_queries(self) -> Vec<Query> {
        match self {
            BatchFile::Wrapped { queries } | BatchFile::Bare(queries) => queries,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Query {
            config,
            batch,
            timeout_ms,
            compact,
        } => {
            let mut config = load_config(&config)?;
            init_tracing(config.engine.debug_logging);
            if let Some(timeout_ms) = timeout_ms {
                config.engine.query_timeout_ms = timeout_ms;
                config
                    .validate_config()
                    .context("Invalid --timeout-ms override")?;
            }

            let content = std::fs::read_to_string(&batch)
                .with_context(|| format!("Failed to read batch file {}", batch.display()))?;
            let queries = serde_json::from_str::<BatchFile>(&content)
                .with_context(|| format!("Failed to parse batch file {}", batch.display()))?
                .into_queries();
            info!("Running {} queries against {}", queries.len(), config.datasource.uid);

            let executor = BatchExecutor::new(config.engine, Arc::new(DefaultHandleFactory::new()));
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling in-flight queries");
                    on_interrupt.cancel();
                }
            });

            let result = executor
                .query_data(BatchRequest::new(config.datasource, queries), cancel)
                .await;
            executor.shutdown().await;
            let response = result?;

            let rendered = if compact {
                serde_json::to_string(&response)?
            } else {
                serde_json::to_string_pretty(&response)?
            };
            println!("{}", rendered);
        }

        Commands::Health { config } => {
            let config = load_config(&config)?;
            init_tracing(config.engine.debug_logging);

            let executor = BatchExecutor::new(config.engine, Arc::new(DefaultHandleFactory::new()));
            let health = executor.check_health().await;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }

        Commands::Validate { config: path } => {
            let config = load_config(&path)?;
            init_tracing(config.engine.debug_logging);
            info!("{} configuration {} is valid", BRIDGE_NAME, path.display());
            println!("{:#?}", config);
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<BridgeConfig> {
    BridgeConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_file_shapes() {
        let wrapped: BatchFile =
            serde_json::from_str(r#"{"queries": [{"refId": "A", "kind": "statement"}]}"#).unwrap();
        assert_eq!(wrapped.into_queries().len(), 1);

        let bare: BatchFile = serde_json::from_str(
            r#"[{"refId": "A", "kind": "list_metrics"}, {"refId": "B", "kind": "objects"}]"#,
        )
        .unwrap();
        assert_eq!(bare.into_queries()[1].ref_id, "B");
    }

    #[test]
    fn test_cli_parses_query_command() {
        let cli = Cli::parse_from([
            "framebridge",
            "query",
            "--batch",
            "batch.json",
            "--timeout-ms",
            "500",
        ]);
        match cli.command {
            Commands::Query {
                config, timeout_ms, ..
            } => {
                assert_eq!(config, PathBuf::from(DEFAULT_CONFIG_PATH));
                assert_eq!(timeout_ms, Some(500));
            }
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = Cli::try_parse_from([
            "framebridge",
            "query",
            "--batch",
            "batch.json",
            "--timeout-ms",
            "0",
        ]);
        assert!(result.is_err());
    }
}
