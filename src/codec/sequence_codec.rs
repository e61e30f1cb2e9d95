use bytes::{Buf, BufMut, BytesMut};
use bytes_varint::{VarIntSupport, VarIntSupportMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::error::SessionError;

/// upper bound for the encoded length of an i64: 64 bits in 7 bit groups
pub const MAX_ENCODED_LEN: usize = 10;

pub fn encode_sequence_value(value: i64, buf: &mut impl BufMut) {
    buf.put_i64_varint(value);
}

/// Decodes a single value from the start of a buffer that is expected to contain it completely,
///  returning the value and the number of bytes it occupied.
pub fn decode_sequence_value(bytes: &[u8]) -> Result<(i64, usize), SessionError> {
    let mut cursor = bytes;
    let value = cursor.try_get_i64_varint()
        .map_err(|e| SessionError::MalformedSequenceValue(format!("{:?} in {:?}", e, bytes)))?;
    Ok((value, bytes.len() - cursor.len()))
}

/// Incremental decoding for data arriving in arbitrary chunks: takes the first value off the
///  buffer if it is complete, leaving the buffer untouched if more bytes are needed.
pub fn try_decode_sequence_value(buf: &mut BytesMut) -> Result<Option<i64>, SessionError> {
    let terminator = buf.iter()
        .take(MAX_ENCODED_LEN)
        .position(|b| b & 0x80 == 0);

    match terminator {
        Some(idx) => {
            let (value, consumed) = decode_sequence_value(&buf[..=idx])?;
            buf.advance(consumed);
            Ok(Some(value))
        }
        None if buf.len() >= MAX_ENCODED_LEN => {
            Err(SessionError::MalformedSequenceValue(format!("no terminating byte in {:?}", &buf[..MAX_ENCODED_LEN])))
        }
        None => Ok(None),
    }
}

/// Reads sequence values from a byte stream, buffering values that are split across reads.
pub struct SequenceReader<R> {
    reader: R,
    buf: BytesMut,
}

impl <R: AsyncRead + Unpin> SequenceReader<R> {
    pub fn new(reader: R) -> SequenceReader<R> {
        SequenceReader {
            reader,
            buf: BytesMut::with_capacity(4096),
        }
    }

    /// Waits until the next value is available. The end of the stream is reported as
    ///  [SessionError::ConnectionClosed], regardless of whether it happens between values or in
    ///  the middle of one.
    pub async fn next_value(&mut self) -> Result<i64, SessionError> {
        loop {
            if let Some(value) = try_decode_sequence_value(&mut self.buf)? {
                trace!("decoded {}", value);
                return Ok(value);
            }

            let num_read = self.reader.read_buf(&mut self.buf).await?;
            if num_read == 0 {
                if !self.buf.is_empty() {
                    debug!("stream ended in the middle of a value, {} bytes pending", self.buf.len());
                }
                return Err(SessionError::ConnectionClosed);
            }
        }
    }
}
