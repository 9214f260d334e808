//! Leaky-bucket flood prevention.
//!
//! Outbound pacing uses a counter that increases on each send and
//! drains steadily with time. Bursts up to `max_burst` go out
//! immediately; beyond that, each message must wait one counter period.

use std::time::{Duration, Instant};

/// Flood preventer parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FloodConfig {
    /// Number of messages that may be sent back-to-back.
    pub max_burst: u32,
    /// Time for the counter to drain by one.
    pub counter_period: Duration,
}

impl Default for FloodConfig {
    fn default() -> FloodConfig {
        FloodConfig {
            max_burst: 4,
            counter_period: Duration::from_millis(2000),
        }
    }
}

/// Leaky-bucket send-delay computer.
#[derive(Debug)]
pub struct FloodPreventer {
    max_burst: u64,
    period_ms: u64,
    counter: u64,
    last_decrement_ms: u64,
    origin: Instant,
}

impl FloodPreventer {
    /// Create a preventer with the given parameters.
    pub fn new(config: FloodConfig) -> FloodPreventer {
        FloodPreventer {
            max_burst: u64::from(config.max_burst),
            period_ms: (config.counter_period.as_millis() as u64).max(1),
            counter: 0,
            last_decrement_ms: 0,
            origin: Instant::now(),
        }
    }

    /// How long to wait before the next send. Zero means send now.
    pub fn get_send_delay(&mut self) -> Duration {
        let now_ms = self.origin.elapsed().as_millis() as u64;
        Duration::from_millis(self.delay_at(now_ms))
    }

    /// Record that one message was handed to the transport.
    pub fn on_sent(&mut self) {
        self.counter += 1;
    }

    /// Core computation against an explicit clock, in milliseconds
    /// since the preventer was created.
    fn delay_at(&mut self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.last_decrement_ms);
        let drained = elapsed / self.period_ms;
        self.counter = self.counter.saturating_sub(drained);
        self.last_decrement_ms += drained * self.period_ms;
        let remainder = elapsed % self.period_ms;

        if self.counter > self.max_burst {
            (self.counter - self.max_burst) * self.period_ms - remainder
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preventer(max_burst: u32, period_ms: u64) -> FloodPreventer {
        FloodPreventer::new(FloodConfig {
            max_burst,
            counter_period: Duration::from_millis(period_ms),
        })
    }

    #[test]
    fn test_burst_goes_out_immediately() {
        let mut fp = preventer(4, 2000);
        for _ in 0..4 {
            assert_eq!(fp.delay_at(0), 0);
            fp.on_sent();
        }
        // The fifth message in the same instant must wait.
        assert!(fp.delay_at(0) > 0);
    }

    #[test]
    fn test_third_message_waits_one_period() {
        let mut fp = preventer(2, 1000);
        fp.on_sent();
        fp.on_sent();
        fp.on_sent();
        assert_eq!(fp.delay_at(0), 1000);
        assert_eq!(fp.delay_at(1000), 0);
    }

    #[test]
    fn test_counter_drains_by_elapsed_periods() {
        let mut fp = preventer(2, 1000);
        for _ in 0..6 {
            fp.on_sent();
        }
        assert_eq!(fp.delay_at(0), 4000);
        // 3 periods later, exactly 3 drained.
        assert_eq!(fp.delay_at(3000), 1000);
        assert_eq!(fp.counter, 3);
    }

    #[test]
    fn test_partial_period_reduces_delay() {
        let mut fp = preventer(2, 1000);
        fp.on_sent();
        fp.on_sent();
        fp.on_sent();
        assert_eq!(fp.delay_at(400), 600);
    }

    #[test]
    fn test_counter_clamps_at_zero() {
        let mut fp = preventer(4, 100);
        fp.on_sent();
        assert_eq!(fp.delay_at(100_000), 0);
        assert_eq!(fp.counter, 0);
        // Long idle does not accumulate credit beyond empty.
        fp.on_sent();
        fp.on_sent();
        fp.on_sent();
        fp.on_sent();
        fp.on_sent();
        assert!(fp.delay_at(100_000) > 0);
    }

    #[test]
    fn test_default_config() {
        let config = FloodConfig::default();
        assert_eq!(config.max_burst, 4);
        assert_eq!(config.counter_period, Duration::from_millis(2000));
    }
}
