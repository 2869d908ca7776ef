use clap::Parser;

use policyrag_cli::app;
use policyrag_cli::cli::Cli;
use policyrag_cli::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    app::run(cli).await
}
