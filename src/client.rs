use std::sync::Arc;
use anyhow::Context;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::watch;
use tracing::{info, info_span, Instrument};

use crate::config::SenderConfig;
use crate::sender::run_sender;

/// Connects to a receiver and sends until the session ends
pub async fn run_client(addr: impl ToSocketAddrs, config: Arc<SenderConfig>, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let stream = TcpStream::connect(addr).await
        .context("error establishing connection")?;
    stream.set_nodelay(true)?;

    let peer = stream.peer_addr()?;
    info!("connection established with {}", peer);

    run_sender(config, stream, shutdown)
        .instrument(info_span!("session", peer = %peer))
        .await
}
