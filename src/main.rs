use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use compactgen::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_level.as_deref());
    compactgen::run(args).await
}

fn init_tracing(level: Option<&str>) {
    let env_filter = match level {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
