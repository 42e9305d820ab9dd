use crate::cli::{Cli, RootCommands};
use clap::Parser;
use log::{error, info};
use serde::Serialize;
use std::io::{Error, ErrorKind};
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use xch_history::{list_records, reconstruct};
use xch_history_core::config::HistoryConfig;
use xch_history_core::errors::HistoryError;
use xch_history_core::utils::stop_on_signal;
use xch_history_keys::Address;
use xch_history_logger::HistoryLoggerBuilder;
use xch_history_servers::registry::NetworkRegistry;
use xch_history_servers::rpc::{
    HistoryRpcHandler, HistoryState, RecordsResp, TransactionsResp,
};
use xch_history_servers::server::{HistoryServer, HttpServerConfig};

pub mod cli;

pub async fn run_cli() -> Result<(), Error> {
    let cli = Cli::parse();
    let mut config = HistoryConfig::load(cli.config.as_deref())?;
    let _logger = HistoryLoggerBuilder::from_config(&config.logging)?
        .init()
        .map_err(|e| Error::other(format!("{e:?}")))?;
    match cli.action.unwrap_or_default() {
        RootCommands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await
        }
        RootCommands::Records { address } => {
            let state = HistoryState::new(NetworkRegistry::from_config(&config), &config);
            let address = parse_address(&address)?;
            let node = state.registry.resolve(&address.prefix).map_err(to_io)?;
            let records = timeout(state.request_timeout, list_records(node.as_ref(), &address))
                .await
                .unwrap_or(Err(HistoryError::Timeout))
                .map_err(to_io)?;
            print_json(&RecordsResp { records })
        }
        RootCommands::Transactions { address } => {
            let state = HistoryState::new(NetworkRegistry::from_config(&config), &config);
            let address = parse_address(&address)?;
            let node = state.registry.resolve(&address.prefix).map_err(to_io)?;
            let transaction_groups = timeout(
                state.request_timeout,
                reconstruct(node.as_ref(), &address, &state.options),
            )
            .await
            .unwrap_or(Err(HistoryError::Timeout))
            .map_err(to_io)?;
            print_json(&TransactionsResp { transaction_groups })
        }
        RootCommands::WriteConfig { output } => {
            config.save_as_yaml(&output)?;
            info!("Wrote config to {}", output.display());
            Ok(())
        }
    }
}

async fn serve(config: HistoryConfig) -> Result<(), Error> {
    let registry = NetworkRegistry::from_config(&config);
    if registry.tickers().is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "No blockchains configured",
        ));
    }
    registry.check_networks().await;
    let state = Arc::new(HistoryState::new(registry, &config));
    let server = HistoryServer::new(
        &HttpServerConfig {
            host: config.host.clone(),
            port: config.port,
        },
        state,
        Arc::new(HistoryRpcHandler),
    )?;
    let run = Arc::new(AtomicBool::new(true));
    let server_run = run.clone();
    let handle = tokio::spawn(async move { server.run(server_run).await });
    stop_on_signal(run).await?;
    match timeout(Duration::from_secs(5), handle).await {
        Ok(Ok(res)) => res,
        Ok(Err(e)) => Err(Error::other(format!("Server task failed: {e:?}"))),
        Err(_) => {
            error!("Server did not stop in time");
            Ok(())
        }
    }
}

fn parse_address(address: &str) -> Result<Address, Error> {
    Address::from_str(address)
}

fn to_io(e: impl Into<HistoryError>) -> Error {
    match e.into() {
        HistoryError::Lookup(e) => e,
        HistoryError::Timeout => Error::new(ErrorKind::TimedOut, HistoryError::Timeout.to_string()),
        e => Error::new(ErrorKind::InvalidInput, e.to_string()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| Error::new(ErrorKind::InvalidData, format!("{e:?}")))?;
    println!("{json}");
    Ok(())
}
