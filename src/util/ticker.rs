use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// A periodic tick whose first tick is one full `period` from now (rather than immediately, which
///  is tokio's default). Ticks missed because the loop was busy are skipped rather than fired in
///  a burst.
pub fn ticker(period: Duration) -> Interval {
    let mut result = interval_at(Instant::now() + period, period);
    result.set_missed_tick_behavior(MissedTickBehavior::Skip);
    result
}

#[cfg(test)]
mod tests {
    use tokio::time::timeout;
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let start = Instant::now();
        let mut ticks = ticker(Duration::from_secs(1));

        assert!(timeout(Duration::from_millis(999), ticks.tick()).await.is_err());

        ticks.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        ticks.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }
}
