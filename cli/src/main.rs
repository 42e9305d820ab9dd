use std::io::Error;
use xch_history_cli::run_cli;

#[tokio::main]
async fn main() -> Result<(), Error> {
    run_cli().await
}
