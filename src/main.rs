use anyhow::Result;
use clap::Parser;
use tillbook::cli::Cli;
use tillbook::logging::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    cli.run().await
}
