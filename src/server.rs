use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::select;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::config::ReceiverConfig;
use crate::receiver::rate_selector::RandomRateSelector;
use crate::receiver::run_receiver;
use crate::util::shutdown::shutdown_requested;

/// Accepts connections until shutdown is requested, running an independent receiver session for
///  each of them. A session ending - for whatever reason - does not affect the accept loop or
///  other sessions.
pub async fn run_server(listener: TcpListener, config: Arc<ReceiverConfig>, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    config.validate()?;
    info!("waiting for new connections on {}", listener.local_addr()?);

    let mut accept_shutdown = shutdown.clone();
    loop {
        let (stream, peer) = select! {
            _ = shutdown_requested(&mut accept_shutdown) => {
                info!("shutting down server");
                return Ok(());
            }
            accepted = listener.accept() => accepted?,
        };
        info!("connected with {}", peer);

        tokio::spawn(handle_connection(peer, stream, config.clone(), shutdown.clone()));
    }
}

#[instrument(name = "session", skip_all, fields(peer = %peer))]
async fn handle_connection(peer: SocketAddr, stream: TcpStream, config: Arc<ReceiverConfig>, shutdown: watch::Receiver<bool>) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("could not disable Nagle's algorithm: {}", e);
    }

    let rate_selector = RandomRateSelector::new(config.max_rate_exclusive);
    match run_receiver(config, stream, rate_selector, shutdown).await {
        Ok(_) => debug!("session with {} shut down", peer),
        Err(e) => debug!("session with {} failed: {:#}", peer, e),
    }
}
