use std::time::Duration;
use anyhow::bail;

/// How rate messages are delimited on the wire. Both peers must use the same framing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum RateFraming {
    /// A message is exactly one write on the sending side and one read on the receiving side.
    ///
    /// This relies on the transport not coalescing or splitting writes, which TCP does not
    ///  guarantee. It works in practice because rate messages are tiny and seconds apart, and it
    ///  is what existing peers speak.
    #[default]
    Unframed,
    /// Every message is preceded by its length as a u32 in network byte order. Frame and body
    ///  are still sent in a single write.
    LengthPrefixed,
}

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// length of a validation window
    pub validation_interval: Duration,
    /// interval between choosing (and sending) a new rate
    pub rate_selection_interval: Duration,
    /// randomly chosen rates are in `0..max_rate_exclusive`
    pub max_rate_exclusive: u32,
    /// the first value a sender is expected to send
    pub first_expected_value: i64,
    pub rate_framing: RateFraming,
}

impl ReceiverConfig {
    pub fn new() -> ReceiverConfig {
        ReceiverConfig {
            validation_interval: Duration::from_secs(1),
            rate_selection_interval: Duration::from_secs(5),
            max_rate_exclusive: 100,
            first_expected_value: 1,
            rate_framing: RateFraming::Unframed,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.validation_interval.is_zero() {
            bail!("validation interval must not be zero");
        }
        if self.rate_selection_interval.is_zero() {
            bail!("rate selection interval must not be zero");
        }
        if self.max_rate_exclusive == 0 {
            bail!("range of rates to choose from is empty");
        }
        Ok(())
    }
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// the first counter value to send - not necessarily 0 or 1
    pub initial_counter: i64,
    /// interval between two batches of values
    pub emission_interval: Duration,
    pub rate_framing: RateFraming,
    /// This is the read buffer size for rate messages, and it limits the length of a single
    ///  message regardless of framing. A length prefix exceeding it is treated as malformed.
    pub max_rate_message_len: usize,
    /// The highest rate the sender accepts. A receiver mandating more ends the session, since a
    ///  batch is encoded into a single buffer.
    pub max_rate: u32,
}

impl SenderConfig {
    pub fn new(initial_counter: i64) -> SenderConfig {
        SenderConfig {
            initial_counter,
            emission_interval: Duration::from_secs(1),
            rate_framing: RateFraming::Unframed,
            max_rate_message_len: 1024,
            max_rate: 100_000,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.emission_interval.is_zero() {
            bail!("emission interval must not be zero");
        }
        if self.max_rate_message_len == 0 {
            bail!("maximum rate message length must not be zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ReceiverConfig::new().validate().is_ok());
        assert!(SenderConfig::new(1).validate().is_ok());
        assert_eq!(ReceiverConfig::new().rate_framing, RateFraming::Unframed);
    }

    #[rstest]
    #[case::zero_validation(Duration::ZERO, Duration::from_secs(5), 100)]
    #[case::zero_selection(Duration::from_secs(1), Duration::ZERO, 100)]
    #[case::empty_rate_range(Duration::from_secs(1), Duration::from_secs(5), 0)]
    fn test_invalid_receiver_config(#[case] validation_interval: Duration, #[case] rate_selection_interval: Duration, #[case] max_rate_exclusive: u32) {
        let config = ReceiverConfig {
            validation_interval,
            rate_selection_interval,
            max_rate_exclusive,
            ..ReceiverConfig::new()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_sender_config() {
        let mut config = SenderConfig::new(1);
        config.emission_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = SenderConfig::new(1);
        config.max_rate_message_len = 0;
        assert!(config.validate().is_err());
    }
}
