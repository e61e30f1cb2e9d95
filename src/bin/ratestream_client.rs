use std::sync::Arc;
use clap::Parser;
use clap_derive::Parser;
use ratestream::client::run_client;
use ratestream::config::{RateFraming, SenderConfig};
use ratestream::util::shutdown::shutdown_signal;
use tracing::{info, Level};

#[derive(Parser)]
struct Args {
    #[clap(long, default_value = "localhost:54321")]
    address: String,

    /// the first value to send
    #[clap(long, default_value_t = 1, allow_negative_numbers = true)]
    initial_counter: i64,

    /// expect rate messages prefixed with their length instead of one read per message
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

    let mut config = SenderConfig::new(args.initial_counter);
    if args.length_prefixed {
        config.rate_framing = RateFraming::LengthPrefixed;
    }

    let (shutdown_send, shutdown_recv) = shutdown_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted");
            let _ = shutdown_send.send(true);
        }
    });

    run_client(args.address, Arc::new(config), shutdown_recv).await
}
