use thiserror::Error;

/// Everything that can end a session. Every variant is fatal for the connection it occurred on,
///  and none of them affects other sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed sequence value: {0}")]
    MalformedSequenceValue(String),

    #[error("malformed rate message: {0}")]
    MalformedRateMessage(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// received a value other than the next one in the sequence
    #[error("out of order: expected {expected}, got {actual}")]
    SequenceViolation {
        expected: i64,
        actual: i64,
    },

    /// a fully validated window did not contain exactly the mandated number of values
    #[error("rate not complied with: mandated {mandated}, received {received}")]
    RateComplianceViolation {
        mandated: u32,
        received: u32,
    },

    /// the sequence reached i64::MAX and cannot advance without wrapping
    #[error("sequence exhausted after {last}")]
    SequenceExhausted {
        last: i64,
    },
}

impl SessionError {
    /// Finds the [SessionError] at the root of an error chain, if there is one
    pub fn find_in(err: &anyhow::Error) -> Option<&SessionError> {
        err.chain()
            .find_map(|e| e.downcast_ref::<SessionError>())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use super::*;

    #[test]
    fn test_find_in_context_chain() {
        let err = Err::<(), _>(SessionError::SequenceViolation { expected: 3, actual: 4 })
            .context("session ended")
            .unwrap_err();

        match SessionError::find_in(&err) {
            Some(SessionError::SequenceViolation { expected, actual }) => {
                assert_eq!(*expected, 3);
                assert_eq!(*actual, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_find_in_foreign_error() {
        let err = anyhow::anyhow!("something else");
        assert!(SessionError::find_in(&err).is_none());
    }

    #[test]
    fn test_display_has_expected_and_actual() {
        let msg = SessionError::RateComplianceViolation { mandated: 5, received: 4 }.to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains('4'));
    }
}
