use rand::Rng;
use std::time::Duration;

const NOMINAL_TICK_INTERVAL_SECS: u64 = 60;
const JITTER_SECS: i64 = 3;
const BACKOFF_CEILING_SECS: u64 = 300;

/// Nominal inter-tick sleep, jittered uniformly by ±`JITTER_SECS` so many
/// daemons started at the same moment don't all wake in lockstep.
pub fn jittered_sleep_duration() -> Duration {
    let mut rng = rand::thread_rng();
    let jitter: i64 = rng.gen_range(-JITTER_SECS..=JITTER_SECS);
    let secs = (NOMINAL_TICK_INTERVAL_SECS as i64 + jitter).max(1);
    Duration::from_secs(secs as u64)
}

/// Exponential backoff on consecutive tick failures:
/// `min(tick_interval * 2^min(consecutive_failures, 3), 300)` seconds.
pub fn backoff_duration(consecutive_failures: u32) -> Duration {
    let exponent = consecutive_failures.min(3);
    let secs = NOMINAL_TICK_INTERVAL_SECS.saturating_mul(1u64 << exponent);
    Duration::from_secs(secs.min(BACKOFF_CEILING_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jittered_sleep_stays_within_the_nominal_band() {
        for _ in 0..50 {
            let d = jittered_sleep_duration();
            assert!(d.as_secs() >= 57 && d.as_secs() <= 63);
        }
    }

    #[test]
    fn backoff_doubles_up_to_the_exponent_cap() {
        assert_eq!(backoff_duration(0).as_secs(), 60);
        assert_eq!(backoff_duration(1).as_secs(), 120);
        assert_eq!(backoff_duration(2).as_secs(), 240);
        assert_eq!(backoff_duration(3).as_secs(), 300);
    }

    #[test]
    fn backoff_never_exceeds_the_ceiling_past_the_exponent_cap() {
        assert_eq!(backoff_duration(4).as_secs(), 300);
        assert_eq!(backoff_duration(10).as_secs(), 300);
    }
}
