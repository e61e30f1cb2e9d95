//! Encoding and decoding of the two kinds of data that travel over a session's connection:
//!  sequence values (sender to receiver) and rate messages (receiver to sender).

pub mod sequence_codec;
pub mod rate_message;
pub mod rate_framing;
