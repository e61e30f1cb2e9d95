use bytes::BytesMut;

use crate::codec::sequence_codec::{encode_sequence_value, MAX_ENCODED_LEN};
use crate::error::SessionError;

/// The sender's state: the rate currently in effect and the next counter value to send.
#[derive(Debug)]
pub struct SenderLogic {
    rate: u32,
    counter: i64,
}

impl SenderLogic {
    /// Starts out silent (rate 0) until the receiver mandates a rate.
    pub fn new(initial_counter: i64) -> SenderLogic {
        SenderLogic {
            rate: 0,
            counter: initial_counter,
        }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn counter(&self) -> i64 {
        self.counter
    }

    /// takes effect with the next batch
    pub fn set_rate(&mut self, rate: u32) {
        self.rate = rate;
    }

    /// Encodes the next `rate` counter values into a single buffer and advances the counter
    ///  past them. The buffer is empty if the rate is 0.
    pub fn next_batch(&mut self) -> Result<BytesMut, SessionError> {
        let next_counter = self.counter.checked_add(self.rate.into())
            .ok_or(SessionError::SequenceExhausted { last: i64::MAX })?;

        let mut buf = BytesMut::with_capacity(self.rate as usize * MAX_ENCODED_LEN);
        for value in self.counter..next_counter {
            encode_sequence_value(value, &mut buf);
        }
        self.counter = next_counter;
        Ok(buf)
    }
}
