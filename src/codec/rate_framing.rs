use std::io::ErrorKind;
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::codec::rate_message::RateMessage;
use crate::config::RateFraming;
use crate::error::SessionError;

impl RateFraming {
    /// Returns the complete bytes for a message, to be sent in a single write
    pub fn frame(&self, msg: &RateMessage) -> anyhow::Result<BytesMut> {
        let body = msg.ser()?;

        let mut buf = BytesMut::with_capacity(body.len() + 4);
        if let RateFraming::LengthPrefixed = self {
            buf.put_u32(u32::try_from(body.len())?);
        }
        buf.put_slice(&body);
        Ok(buf)
    }
}

/// Reads rate messages from a byte stream
pub struct RateMessageReader<R> {
    reader: R,
    framing: RateFraming,
    buf: Vec<u8>,
}

impl <R: AsyncRead + Unpin> RateMessageReader<R> {
    pub fn new(reader: R, framing: RateFraming, max_message_len: usize) -> RateMessageReader<R> {
        RateMessageReader {
            reader,
            framing,
            buf: vec![0u8; max_message_len],
        }
    }

    pub async fn next_message(&mut self) -> Result<RateMessage, SessionError> {
        match self.framing {
            RateFraming::Unframed => self.next_unframed().await,
            RateFraming::LengthPrefixed => self.next_length_prefixed().await,
        }
    }

    async fn next_unframed(&mut self) -> Result<RateMessage, SessionError> {
        let num_read = self.reader.read(&mut self.buf).await?;
        if num_read == 0 {
            return Err(SessionError::ConnectionClosed);
        }
        trace!("read {} bytes of rate message", num_read);
        RateMessage::deser(&self.buf[..num_read])
    }

    async fn next_length_prefixed(&mut self) -> Result<RateMessage, SessionError> {
        let mut len_buf = [0u8; 4];
        read_exact_or_closed(&mut self.reader, &mut len_buf).await?;

        let msg_len = u32::from_be_bytes(len_buf) as usize;
        if msg_len > self.buf.len() {
            return Err(SessionError::MalformedRateMessage(format!("length prefix {} exceeds the maximum of {}", msg_len, self.buf.len())));
        }

        read_exact_or_closed(&mut self.reader, &mut self.buf[..msg_len]).await?;
        RateMessage::deser(&self.buf[..msg_len])
    }
}

async fn read_exact_or_closed(reader: &mut (impl AsyncRead + Unpin), buf: &mut [u8]) -> Result<(), SessionError> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(SessionError::ConnectionClosed),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;
    use super::*;

    #[test]
    fn test_frame_unframed() {
        let buf = RateFraming::Unframed.frame(&RateMessage::new(3)).unwrap();
        assert_eq!(buf.as_ref(), br#"{"rate":3}"#);
    }

    #[test]
    fn test_frame_length_prefixed() {
        let buf = RateFraming::LengthPrefixed.frame(&RateMessage::new(3)).unwrap();
        assert_eq!(&buf[..4], &[0, 0, 0, 10]);
        assert_eq!(&buf[4..], br#"{"rate":3}"#);
    }

    #[tokio::test]
    async fn test_unframed_one_read_per_message() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut reader = RateMessageReader::new(server, RateFraming::Unframed, 1024);

        client.write_all(&RateFraming::Unframed.frame(&RateMessage::new(17)).unwrap()).await.unwrap();
        assert_eq!(reader.next_message().await.unwrap(), RateMessage::new(17));

        client.write_all(&RateFraming::Unframed.frame(&RateMessage::new(0)).unwrap()).await.unwrap();
        assert_eq!(reader.next_message().await.unwrap(), RateMessage::new(0));

        drop(client);
        assert!(matches!(reader.next_message().await, Err(SessionError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_unframed_coalesced_messages_are_malformed() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut reader = RateMessageReader::new(server, RateFraming::Unframed, 1024);

        client.write_all(br#"{"rate":1}{"rate":2}"#).await.unwrap();
        assert!(matches!(reader.next_message().await, Err(SessionError::MalformedRateMessage(_))));
    }

    #[tokio::test]
    async fn test_length_prefixed_survives_coalescing_and_splitting() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut reader = RateMessageReader::new(server, RateFraming::LengthPrefixed, 1024);

        let mut buf = RateFraming::LengthPrefixed.frame(&RateMessage::new(1)).unwrap();
        buf.extend_from_slice(&RateFraming::LengthPrefixed.frame(&RateMessage::new(2)).unwrap());
        let (first, second) = buf.split_at(13);
        client.write_all(first).await.unwrap();
        client.write_all(second).await.unwrap();
        drop(client);

        assert_eq!(reader.next_message().await.unwrap(), RateMessage::new(1));
        assert_eq!(reader.next_message().await.unwrap(), RateMessage::new(2));
        assert!(matches!(reader.next_message().await, Err(SessionError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_length_prefixed_rejects_oversized_message() {
        let (mut client, server) = tokio::io::duplex(1024);
        let mut reader = RateMessageReader::new(server, RateFraming::LengthPrefixed, 16);

        client.write_all(&[0, 0, 0, 17]).await.unwrap();
        assert!(matches!(reader.next_message().await, Err(SessionError::MalformedRateMessage(_))));
    }
}
