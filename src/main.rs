use anyhow::Result;
use clap::Parser;
use smmpanel::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    smmpanel::logging::init_logging(cli.verbose);
    cli.run().await
}
