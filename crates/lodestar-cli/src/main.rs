//! lodestar debugging CLI
//!
//! Resolves a dial URI against a live registry and prints every address-set
//! update until interrupted. Useful for checking what an RPC client would
//! see for a given target.

use clap::Parser;
use lodestar_core::LodestarResult;
use lodestar_resolver::{AddressSink, ConsulBuilder, SchemeRegistry};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use url::Url;

/// Watch the resolved address set for a dial target
#[derive(Parser, Debug)]
#[command(name = "lodestar")]
#[command(version, about, long_about = None)]
struct Args {
    /// Dial URI, e.g. consul://127.0.0.1:8500/inventory?tag=grpc
    target: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Sink that prints each update to stdout
struct PrintSink;

impl AddressSink for PrintSink {
    fn update(&self, addresses: Vec<String>) -> LodestarResult<()> {
        if addresses.is_empty() {
            println!("resolved: (no addresses)");
        } else {
            println!("resolved: {}", addresses.join(", "));
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let mut schemes = SchemeRegistry::new();
    schemes.register(Arc::new(ConsulBuilder::new()));

    let scheme = match Url::parse(&args.target) {
        Ok(url) => url.scheme().to_string(),
        Err(e) => {
            eprintln!("Invalid dial target {:?}: {}", args.target, e);
            std::process::exit(1);
        }
    };
    let Some(builder) = schemes.lookup(&scheme) else {
        eprintln!("No resolver registered for scheme {:?}", scheme);
        std::process::exit(1);
    };

    let mut resolver = match builder.build(&args.target, Arc::new(PrintSink)) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    info!("Watching {} (ctrl-c to stop)", args.target);
    tokio::signal::ctrl_c().await.expect("Failed to listen for ctrl-c");
    resolver.close();
}
