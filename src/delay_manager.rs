use std::thread;
use std::time::Duration;

use log::info;
use rand::Rng;

use crate::config::RetryPolicy;

/// Backoff before retry number `attempt` (1-based): doubles from the base
/// delay, capped, plus up to 25% jitter.
pub fn backoff(policy: &RetryPolicy, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let delay = policy
        .base_delay
        .saturating_mul(1u32 << exp)
        .min(policy.max_delay);
    let max_jitter = delay / 4;
    let mut rng = rand::thread_rng();
    delay.saturating_add(max_jitter.mul_f64(rng.gen_range(0.0..=1.0)))
}

pub fn retry_delay(policy: &RetryPolicy, attempt: u32) {
    let delay = backoff(policy, attempt);
    info!("Waiting for {:.1} seconds before retry {}...", delay.as_secs_f64(), attempt);
    thread::sleep(delay);
}

pub fn cycle_delay(interval: Duration) {
    info!("Sleeping for {} hours until the next cycle...", interval.as_secs() / 3600);
    thread::sleep(interval);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
        };
        let first = backoff(&policy, 1);
        assert!(first >= Duration::from_secs(5) && first <= Duration::from_millis(6250));
        let third = backoff(&policy, 3);
        assert!(third >= Duration::from_secs(20) && third <= Duration::from_secs(25));
        let late = backoff(&policy, 9);
        assert!(late >= Duration::from_secs(60) && late <= Duration::from_secs(75));
    }

    #[test]
    fn zero_base_never_sleeps() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        };
        assert_eq!(backoff(&policy, 2), Duration::ZERO);
    }

    #[test]
    fn huge_caps_do_not_overflow() {
        let policy = RetryPolicy {
            max_attempts: 40,
            base_delay: Duration::from_secs(u64::MAX / 2),
            max_delay: Duration::MAX,
        };
        assert!(backoff(&policy, 30) >= Duration::from_secs(u64::MAX / 2));
    }
}
