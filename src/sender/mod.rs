use std::sync::Arc;
use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::select;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn, Instrument};

use crate::config::SenderConfig;
use crate::connection::Connection;
use crate::error::SessionError;
use crate::sender::rate_listener::listen_for_rate_updates;
use crate::sender::sender_logic::SenderLogic;
use crate::util::shutdown::shutdown_requested;
use crate::util::ticker::ticker;

pub mod sender_logic;
pub mod rate_listener;


/// Runs the sending side of a session on an established connection: once per emission interval,
///  the next `rate` counter values go out in a single write, `rate` being whatever the receiver
///  mandated most recently.
///
/// This runs until shutdown is requested (`Ok`) or the session fails. When this returns, the
///  connection is closed and the rate listener has stopped.
pub async fn run_sender<S>(
    config: Arc<SenderConfig>,
    stream: S,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    config.validate()?;

    let (read_half, write_half) = tokio::io::split(stream);
    let (rate_send, mut rate_recv) = mpsc::channel(1);
    let listener = tokio::spawn(
        listen_for_rate_updates(read_half, config.rate_framing, config.max_rate_message_len, config.max_rate, rate_send)
            .in_current_span()
    );
    let mut connection = Connection::new(write_half, listener);

    let result = emission_loop(config.as_ref(), &mut connection, &mut rate_recv, &mut shutdown).await;

    // closing the connection stops the listener, and only then is the channel released
    connection.close().await;
    drop(rate_recv);

    match &result {
        Ok(_) => info!("sender stopped"),
        Err(e) => warn!("sender stopped: {:#}", e),
    }
    result
}

async fn emission_loop<W: AsyncWrite + Unpin>(
    config: &SenderConfig,
    connection: &mut Connection<W>,
    rate_updates: &mut mpsc::Receiver<u32>,
    shutdown: &mut watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut logic = SenderLogic::new(config.initial_counter);
    let mut emission_ticks = ticker(config.emission_interval);

    info!("sending, starting at {}", logic.counter());

    loop {
        // a rate update that arrives together with a tick applies to that tick already
        select! {
            biased;
            _ = shutdown_requested(shutdown) => {
                info!("shutdown requested");
                return Ok(());
            }
            rate = rate_updates.recv() => {
                match rate {
                    Some(rate) => {
                        logic.set_rate(rate);
                        info!("updated rate to {}", rate);
                    }
                    None => {
                        let reason = connection.reader_outcome().await
                            .err()
                            .unwrap_or(SessionError::ConnectionClosed);
                        return Err(reason).context("error reading rate updates");
                    }
                }
            }
            _ = emission_ticks.tick() => {
                if !emit_batch(&mut logic, connection, shutdown).await? {
                    info!("shutdown requested while sending");
                    return Ok(());
                }
            }
        }
    }
}

/// returns `false` if shutdown was requested before the batch was written
async fn emit_batch<W: AsyncWrite + Unpin>(
    logic: &mut SenderLogic,
    connection: &mut Connection<W>,
    shutdown: &mut watch::Receiver<bool>,
) -> anyhow::Result<bool> {
    debug!("sending {} values, next counter {}", logic.rate(), logic.counter());

    let batch = logic.next_batch()?;
    if batch.is_empty() {
        return Ok(true);
    }

    let written = connection.write_all_unless_shutdown(&batch, shutdown).await
        .context("error sending values")?;
    Ok(written)
}
