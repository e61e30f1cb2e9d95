use std::sync::Arc;
use clap::Parser;
use clap_derive::Parser;
use ratestream::config::{RateFraming, ReceiverConfig};
use ratestream::server::run_server;
use ratestream::util::shutdown::shutdown_signal;
use tokio::net::TcpListener;
use tracing::{info, Level};

#[derive(Parser)]
struct Args {
    #[clap(long, default_value = "localhost:54321")]
    address: String,

    /// prefix rate messages with their length instead of relying on one read per message
    #[clap(long, default_value_t = false)]
    length_prefixed: bool,

    #[clap(short, long, default_value_t = false)]
    verbose: bool,

    #[clap(long, default_value_t = false)]
    very_verbose: bool,
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match (args.verbose, args.very_verbose) {
        (_, true) => Level::TRACE,
        (true, _) => Level::DEBUG,
        (false, false) => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .ok();

    let mut config = ReceiverConfig::new();
    if args.length_prefixed {
        config.rate_framing = RateFraming::LengthPrefixed;
    }

    let listener = TcpListener::bind(&args.address).await?;

    let (shutdown_send, shutdown_recv) = shutdown_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted");
            let _ = shutdown_send.send(true);
        }
    });

    run_server(listener, Arc::new(config), shutdown_recv).await
}
