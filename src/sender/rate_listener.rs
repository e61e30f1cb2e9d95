use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::codec::rate_framing::RateMessageReader;
use crate::config::RateFraming;
use crate::error::SessionError;

/// Reads rate messages from the receiver and forwards the new rates to the emission loop until
///  the connection fails or the emission loop is gone. A rate above `max_rate` is rejected like a
///  malformed message.
pub async fn listen_for_rate_updates<R: AsyncRead + Unpin>(
    reader: R,
    framing: RateFraming,
    max_message_len: usize,
    max_rate: u32,
    rate_updates: mpsc::Sender<u32>,
) -> Result<(), SessionError> {
    let mut reader = RateMessageReader::new(reader, framing, max_message_len);

    loop {
        let msg = match reader.next_message().await {
            Ok(msg) => msg,
            Err(e) => {
                debug!("stopped reading rate updates: {}", e);
                return Err(e);
            }
        };

        if msg.rate > max_rate {
            warn!("rejecting rate {}, maximum is {}", msg.rate, max_rate);
            return Err(SessionError::MalformedRateMessage(format!("rate {} exceeds maximum of {}", msg.rate, max_rate)));
        }

        info!("got new rate {}", msg.rate);
        if rate_updates.send(msg.rate).await.is_err() {
            debug!("emission loop is gone, stopping to read");
            return Ok(());
        }
    }
}
