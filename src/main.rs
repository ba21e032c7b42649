use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use o3de_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("o3de_cli=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    if let Err(error) = cli.execute().await {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
