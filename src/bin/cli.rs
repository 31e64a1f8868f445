//! resgraph CLI - resource graph builder and resolver.
//!
//! Usage:
//!   resgraph build                 # Build and store the global resource graph
//!   resgraph load [id]             # Show a stored graph (latest by default)
//!   resgraph find "src/*.ts"       # Match resource paths
//!   resgraph deps <path>           # Dependencies and dependents
//!   resgraph cycles                # Dependency cycles
//!   resgraph --json missing        # Missing dependencies as JSON

use clap::Parser;
use resgraph::cli::{run, Cli};

fn main() {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Err(e) = run(&cli, &mut out) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
