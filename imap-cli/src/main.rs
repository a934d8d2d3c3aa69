//! imap-cli - Command line tool for the inspection map backend.

use clap::Parser;
use log::debug;

#[derive(Parser)]
#[command(
    name = "imap-cli",
    version,
    about = "Inspection map toolkit: queries, areas and installations"
)]
struct Cli {
    #[command(flatten)]
    client: imap_cmd::ClientArgs,

    #[command(subcommand)]
    command: imap_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.client.config();
    debug!("Using backend {} (timeout {:?})", config.base_url, config.timeout);
    imap_cmd::run(config, cli.command).await
}
