use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        value_name = "Path to the history config",
        env = "HISTORY_CONFIG"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub action: Option<RootCommands>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum RootCommands {
    #[command(about = "Serves the records and transactions endpoints", long_about = None)]
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    #[command(about = "Prints the coin records for an address", long_about = None)]
    Records { address: String },
    #[command(about = "Prints the transaction history for an address", long_about = None)]
    Transactions { address: String },
    #[command(about = "Writes the effective config as YAML", long_about = None)]
    WriteConfig {
        #[arg(short, long)]
        output: PathBuf,
    },
}
impl Default for RootCommands {
    fn default() -> Self {
        RootCommands::Serve {
            host: None,
            port: None,
        }
    }
}
