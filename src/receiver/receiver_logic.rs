use tracing::{debug, trace, warn};

use crate::error::SessionError;

/// Outcome of a validation tick that did not end the session
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WindowVerdict {
    /// The rate changed during the window that just ended, so it was not validated
    Grace { received: u32 },
    /// The window contained exactly the mandated number of values
    Compliant { received: u32 },
}

/// The receiver's protocol state, free of any I/O or timing: the decision loop feeds it events
///  one at a time.
#[derive(Debug)]
pub struct ReceiverLogic {
    expected_next: i64,
    window_count: u32,
    mandated_rate: u32,
    rate_just_changed: bool,
}

impl ReceiverLogic {
    /// A new session starts with a mandated rate of 0, and its first window is a grace window.
    pub fn new(first_expected_value: i64) -> ReceiverLogic {
        ReceiverLogic {
            expected_next: first_expected_value,
            window_count: 0,
            mandated_rate: 0,
            rate_just_changed: true,
        }
    }

    pub fn expected_next(&self) -> i64 {
        self.expected_next
    }

    #[cfg(test)]
    pub(crate) fn window_count(&self) -> u32 {
        self.window_count
    }

    #[cfg(test)]
    pub(crate) fn mandated_rate(&self) -> u32 {
        self.mandated_rate
    }

    #[cfg(test)]
    pub(crate) fn is_rate_just_changed(&self) -> bool {
        self.rate_just_changed
    }

    pub fn on_sequence_value(&mut self, value: i64) -> Result<(), SessionError> {
        if value != self.expected_next {
            warn!("out of order: expected {}, got {}", self.expected_next, value);
            return Err(SessionError::SequenceViolation {
                expected: self.expected_next,
                actual: value,
            });
        }

        self.expected_next = value.checked_add(1)
            .ok_or(SessionError::SequenceExhausted { last: value })?;
        self.window_count = self.window_count.saturating_add(1);
        trace!("accepted {}, {} in current window", value, self.window_count);
        Ok(())
    }

    /// Called at the end of every window. Starts a new window unless the session must end.
    pub fn on_validation_tick(&mut self) -> Result<WindowVerdict, SessionError> {
        let received = self.window_count;

        if self.rate_just_changed {
            debug!("grace window after rate change: received {}, mandated {}", received, self.mandated_rate);
            self.rate_just_changed = false;
            self.window_count = 0;
            return Ok(WindowVerdict::Grace { received });
        }

        if received != self.mandated_rate {
            warn!("rate not complied with: mandated {}, received {}", self.mandated_rate, received);
            return Err(SessionError::RateComplianceViolation {
                mandated: self.mandated_rate,
                received,
            });
        }

        debug!("window complied with rate {}", self.mandated_rate);
        self.window_count = 0;
        Ok(WindowVerdict::Compliant { received })
    }

    /// The window in progress has no expectation for a rate that was just set, so it is
    ///  discarded, and the next validation tick is a grace tick.
    pub fn on_rate_mandated(&mut self, rate: u32) {
        self.mandated_rate = rate;
        self.window_count = 0;
        self.rate_just_changed = true;
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use super::*;

    fn logic_with_rate(rate: u32) -> ReceiverLogic {
        let mut logic = ReceiverLogic::new(1);
        logic.on_rate_mandated(rate);
        assert!(matches!(logic.on_validation_tick(), Ok(WindowVerdict::Grace { .. })));
        logic
    }

    fn receive(logic: &mut ReceiverLogic, num_values: u32) {
        for _ in 0..num_values {
            let next = logic.expected_next();
            logic.on_sequence_value(next).unwrap();
        }
    }

    #[test]
    fn test_initial_state() {
        let logic = ReceiverLogic::new(1);
        assert_eq!(logic.expected_next(), 1);
        assert_eq!(logic.window_count(), 0);
        assert_eq!(logic.mandated_rate(), 0);
        assert!(logic.is_rate_just_changed());
    }

    #[test]
    fn test_accepts_expected_value() {
        let mut logic = ReceiverLogic::new(5);
        logic.on_sequence_value(5).unwrap();
        assert_eq!(logic.expected_next(), 6);
        assert_eq!(logic.window_count(), 1);
    }

    #[rstest]
    #[case::gap(4)]
    #[case::repeat(2)]
    #[case::far_behind(-100)]
    #[case::far_ahead(i64::MAX)]
    fn test_rejects_unexpected_value(#[case] value: i64) {
        let mut logic = ReceiverLogic::new(1);
        logic.on_sequence_value(1).unwrap();
        logic.on_sequence_value(2).unwrap();

        match logic.on_sequence_value(value) {
            Err(SessionError::SequenceViolation { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, value);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_exhausted_sequence() {
        let mut logic = ReceiverLogic::new(i64::MAX);
        assert!(matches!(logic.on_sequence_value(i64::MAX), Err(SessionError::SequenceExhausted { last: i64::MAX })));
    }

    #[rstest]
    #[case::silent(0, 0)]
    #[case::matching(5, 5)]
    #[case::large(99, 99)]
    fn test_compliant_window(#[case] rate: u32, #[case] received: u32) {
        let mut logic = logic_with_rate(rate);
        receive(&mut logic, received);

        assert_eq!(logic.on_validation_tick().unwrap(), WindowVerdict::Compliant { received });
        assert_eq!(logic.window_count(), 0);

        // a second window is validated the same way
        receive(&mut logic, received);
        assert_eq!(logic.on_validation_tick().unwrap(), WindowVerdict::Compliant { received });
    }

    #[rstest]
    #[case::too_few(5, 4)]
    #[case::too_many(5, 6)]
    #[case::nothing(3, 0)]
    #[case::something_when_silent(0, 1)]
    fn test_non_compliant_window(#[case] rate: u32, #[case] received: u32) {
        let mut logic = logic_with_rate(rate);
        receive(&mut logic, received);

        match logic.on_validation_tick() {
            Err(SessionError::RateComplianceViolation { mandated, received: actual }) => {
                assert_eq!(mandated, rate);
                assert_eq!(actual, received);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[rstest]
    #[case::zero_to_zero(0, 0, 17)]
    #[case::up(3, 50, 0)]
    #[case::down(50, 3, 200)]
    fn test_grace_window_after_rate_change(#[case] old_rate: u32, #[case] new_rate: u32, #[case] received_in_grace: u32) {
        let mut logic = logic_with_rate(old_rate);
        receive(&mut logic, old_rate);
        assert!(logic.on_validation_tick().is_ok());

        logic.on_rate_mandated(new_rate);
        assert!(logic.is_rate_just_changed());
        receive(&mut logic, received_in_grace);
        assert_eq!(logic.on_validation_tick().unwrap(), WindowVerdict::Grace { received: received_in_grace });
        assert!(!logic.is_rate_just_changed());

        receive(&mut logic, new_rate);
        assert_eq!(logic.on_validation_tick().unwrap(), WindowVerdict::Compliant { received: new_rate });
    }

    #[test]
    fn test_rate_change_discards_window_in_progress() {
        let mut logic = logic_with_rate(3);
        receive(&mut logic, 2);
        logic.on_rate_mandated(4);
        assert_eq!(logic.window_count(), 0);

        // sequence continuity is unaffected
        assert_eq!(logic.expected_next(), 3);
    }

    #[test]
    fn test_first_window_is_grace() {
        let mut logic = ReceiverLogic::new(1);
        receive(&mut logic, 10);
        assert_eq!(logic.on_validation_tick().unwrap(), WindowVerdict::Grace { received: 10 });

        // until the first rate is mandated, the sender is expected to be silent
        assert_eq!(logic.on_validation_tick().unwrap(), WindowVerdict::Compliant { received: 0 });
    }
}
