use rand::Rng;

/// Policy for choosing the next mandated rate. Protocol correctness does not depend on the
///  values chosen, so this is a seam for tests to make rates deterministic.
#[cfg_attr(test, mockall::automock)]
pub trait RateSelector: Send {
    fn select_rate(&mut self) -> u32;
}

/// Chooses rates uniformly at random in `0..max_rate_exclusive`
pub struct RandomRateSelector {
    max_rate_exclusive: u32,
}

impl RandomRateSelector {
    pub fn new(max_rate_exclusive: u32) -> RandomRateSelector {
        RandomRateSelector {
            max_rate_exclusive,
        }
    }
}

impl RateSelector for RandomRateSelector {
    fn select_rate(&mut self) -> u32 {
        if self.max_rate_exclusive == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..self.max_rate_exclusive)
    }
}
