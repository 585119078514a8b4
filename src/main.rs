use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use depthview::cli;

fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag, RUST_LOG otherwise
    let filter = if cli.verbose {
        EnvFilter::new("depthview=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("depthview=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        cli::Commands::Plot(args) => cli::plot::run(args),
        cli::Commands::Stats(args) => cli::stats::run(args),
    };

    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}
