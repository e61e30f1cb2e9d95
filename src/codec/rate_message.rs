use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// The message a receiver sends to mandate a new emission rate, in JSON: `{"rate":42}`
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct RateMessage {
    pub rate: u32,
}

impl RateMessage {
    pub fn new(rate: u32) -> RateMessage {
        RateMessage { rate }
    }

    pub fn ser(&self) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// `buf` must contain exactly one message, optionally surrounded by whitespace
    pub fn deser(buf: &[u8]) -> Result<RateMessage, SessionError> {
        serde_json::from_slice(buf)
            .map_err(|e| SessionError::MalformedRateMessage(format!("{} in {:?}", e, String::from_utf8_lossy(buf))))
    }
}
