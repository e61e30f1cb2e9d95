//! A rate-controlled streaming protocol between one sender and one receiver sharing a single
//!  duplex byte stream.
//!
//! ## Wire protocol
//!
//! Sender to receiver: a back-to-back stream of signed varints (zig-zag mapped LEB128, at most 10
//!  bytes each), one per counter value. There is no separator or framing - each value is
//!  self-delimiting, and the receiver must not assume any relation between write boundaries and
//!  value boundaries.
//!
//! Receiver to sender: JSON rate messages, one per write:
//! ```ascii
//! {"rate":42}
//! ```
//! By default a message is not framed at all, and the sender decodes whatever a single read
//!  returns. Optionally, both peers can agree on a 4-byte big-endian length prefix instead (see
//!  [config::RateFraming]).
//!
//! ## Timing
//!
//! * The sender emits `rate` consecutive counter values once per second, as a single write
//! * The receiver validates once per second that the window that just ended contained exactly
//!    the mandated number of values
//! * Every five seconds the receiver picks a new rate and sends it to the sender. The window
//!    following a rate change is a grace window that is not validated, giving the sender time to
//!    react
//!
//! Any protocol violation (a gap or repeat in the sequence, a wrong number of values in a
//!  window, malformed data) ends the session and closes the connection.

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod receiver;
pub mod sender;
pub mod server;
pub mod client;
pub mod util;
pub mod test_util;


#[cfg(test)]
mod test {
    use tracing::Level;

    #[ctor::ctor]
    fn init_test_logging() {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(Level::TRACE)
            .try_init()
            .ok();
    }
}
