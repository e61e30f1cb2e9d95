//! Utilities for testing code that runs sessions. They are part of the regular
//!  (non-#[cfg(test)]) code so that integration tests and applications can use them as well.

use crate::receiver::rate_selector::RateSelector;

pub mod counting_stream;

/// Replays a fixed list of rates, starting over at the beginning when the list is exhausted.
#[derive(Debug, Clone)]
pub struct FixedRateSelector {
    rates: Vec<u32>,
    next_idx: usize,
}

impl FixedRateSelector {
    /// An empty list is treated as a list containing only 0
    pub fn new(rates: Vec<u32>) -> FixedRateSelector {
        FixedRateSelector {
            rates,
            next_idx: 0,
        }
    }
}

impl RateSelector for FixedRateSelector {
    fn select_rate(&mut self) -> u32 {
        if self.rates.is_empty() {
            return 0;
        }

        let result = self.rates[self.next_idx];
        self.next_idx = (self.next_idx + 1) % self.rates.len();
        result
    }
}
