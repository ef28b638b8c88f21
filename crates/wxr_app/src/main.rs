mod cli;
mod config;
mod logging;

use clap::Parser;
use wxr_logging::wxr_error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::initialize(cli.verbose, cli.log_file.as_deref());

    let result = cli::run(cli).await;
    if let Err(err) = &result {
        wxr_error!("Export failed: {:#}", err);
    }
    result
}
