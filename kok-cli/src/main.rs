//! Kok CLI - serve, import and inspect river monitoring station data.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "kok",
    version,
    about = "Kok river water and soil monitoring stations"
)]
struct Cli {
    #[command(subcommand)]
    command: kok_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    log::debug!("kok {}", env!("CARGO_PKG_VERSION"));
    kok_cmd::run(cli.command).await
}
