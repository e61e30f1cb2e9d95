use std::sync::Arc;
use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::select;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn, Instrument};

use crate::codec::rate_message::RateMessage;
use crate::codec::sequence_codec::SequenceReader;
use crate::config::ReceiverConfig;
use crate::connection::Connection;
use crate::error::SessionError;
use crate::receiver::rate_selector::RateSelector;
use crate::receiver::receiver_logic::{ReceiverLogic, WindowVerdict};
use crate::util::shutdown::shutdown_requested;
use crate::util::ticker::ticker;

pub mod receiver_logic;
pub mod rate_selector;


/// Runs the receiving side of a session on an established connection until the session ends.
///
/// The result is `Ok` only if the session ended because shutdown was requested. Protocol
///  violations and connection failures end the session with an error that has a
///  [SessionError] at its root. Either way, the connection is closed when this returns.
pub async fn run_receiver<S, R>(
    config: Arc<ReceiverConfig>,
    stream: S,
    mut rate_selector: R,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    R: RateSelector,
{
    config.validate()?;

    let (read_half, write_half) = tokio::io::split(stream);
    let (value_send, mut value_recv) = mpsc::channel(1);
    let reader = tokio::spawn(decode_loop(read_half, value_send).in_current_span());
    let mut connection = Connection::new(write_half, reader);

    let result = decision_loop(config.as_ref(), &mut connection, &mut value_recv, &mut rate_selector, &mut shutdown).await;

    // the connection is closed before the channel so the reader never sends into a channel that
    //  nobody listens to
    connection.close().await;
    drop(value_recv);

    match &result {
        Ok(_) => info!("session ended"),
        Err(e) => warn!("session ended: {:#}", e),
    }
    result
}

async fn decode_loop<R: AsyncRead + Unpin>(reader: R, values: mpsc::Sender<i64>) -> Result<(), SessionError> {
    let mut reader = SequenceReader::new(reader);
    loop {
        let value = match reader.next_value().await {
            Ok(value) => value,
            Err(e) => {
                debug!("stopped reading sequence values: {}", e);
                return Err(e);
            }
        };

        if values.send(value).await.is_err() {
            debug!("decision loop is gone, stopping to read");
            return Ok(());
        }
    }
}

async fn decision_loop<W: AsyncWrite + Unpin>(
    config: &ReceiverConfig,
    connection: &mut Connection<W>,
    values: &mut mpsc::Receiver<i64>,
    rate_selector: &mut impl RateSelector,
    shutdown: &mut watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut logic = ReceiverLogic::new(config.first_expected_value);

    let mut validation_ticks = ticker(config.validation_interval);
    let mut rate_selection_ticks = ticker(config.rate_selection_interval);

    info!("receiving, expecting {} first", logic.expected_next());

    loop {
        // A validation tick that is due together with a rate selection tick is handled first:
        //  the window that just ended is judged by the rate that was in effect during it.
        select! {
            biased;
            _ = shutdown_requested(shutdown) => {
                info!("shutdown requested");
                return Ok(());
            }
            _ = validation_ticks.tick() => {
                match logic.on_validation_tick()? {
                    WindowVerdict::Grace { received } => debug!("skipped validation after rate change ({} received)", received),
                    WindowVerdict::Compliant { received } => debug!("received {} as mandated", received),
                }
            }
            _ = rate_selection_ticks.tick() => {
                if !mandate_new_rate(config, connection, &mut logic, rate_selector, shutdown).await? {
                    info!("shutdown requested while sending a new rate");
                    return Ok(());
                }
            }
            value = values.recv() => {
                match value {
                    Some(value) => logic.on_sequence_value(value)?,
                    None => {
                        let reason = connection.reader_outcome().await
                            .err()
                            .unwrap_or(SessionError::ConnectionClosed);
                        return Err(reason).context("error reading sequence values");
                    }
                }
            }
        }
    }
}

/// returns `false` if shutdown was requested before the rate was sent
async fn mandate_new_rate<W: AsyncWrite + Unpin>(
    config: &ReceiverConfig,
    connection: &mut Connection<W>,
    logic: &mut ReceiverLogic,
    rate_selector: &mut impl RateSelector,
    shutdown: &mut watch::Receiver<bool>,
) -> anyhow::Result<bool> {
    let rate = rate_selector.select_rate();
    info!("setting rate {}", rate);

    let buf = config.rate_framing.frame(&RateMessage::new(rate))?;
    if !connection.write_all_unless_shutdown(&buf, shutdown).await
        .context("error sending new rate")? {
        return Ok(false);
    }
    debug!("sent new rate {}", rate);

    logic.on_rate_mandated(rate);
    Ok(true)
}
