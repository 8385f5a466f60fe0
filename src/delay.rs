//! Post-match delivery delay.
//!
//! Runs after the replacement is already committed, so it only holds back
//! delivery. Uses the thread-local PRNG; timing is not security relevant.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::config::DelayConfig;

/// Computes and waits the randomized delay.
#[derive(Debug, Clone, Copy)]
pub struct DelayController {
    config: DelayConfig,
}

impl DelayController {
    pub fn new(config: DelayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> DelayConfig {
        self.config
    }

    /// Pick a delay, or `None` when no wait should happen.
    pub fn pick(&self) -> Option<Duration> {
        pick_delay(&self.config, &mut rand::thread_rng())
    }

    /// Wait the picked delay, if any. Returns what was waited.
    pub async fn maybe_delay(&self) -> Option<Duration> {
        let delay = self.pick()?;
        debug!(delay_secs = delay.as_secs_f64(), "Delaying delivery");
        tokio::time::sleep(delay).await;
        Some(delay)
    }
}

/// Normalize bounds and draw a delay from `[max(min, 0), max]`.
///
/// Inverted bounds are swapped with a warning. A zero draw counts as no
/// delay.
pub fn pick_delay<R: Rng + ?Sized>(config: &DelayConfig, rng: &mut R) -> Option<Duration> {
    if !config.enabled {
        return None;
    }

    let (mut min, mut max) = (config.min_seconds, config.max_seconds);
    if !min.is_finite() || !max.is_finite() {
        warn!(min, max, "Delay bounds are not finite numbers, skipping delay");
        return None;
    }

    if min > max {
        warn!(min, max, "Delay minimum is greater than maximum, swapping the bounds");
        std::mem::swap(&mut min, &mut max);
    }

    if max <= 0.0 {
        return None;
    }

    let secs = rng.gen_range(min.max(0.0)..=max);
    if secs <= 0.0 {
        return None;
    }

    Duration::try_from_secs_f64(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(enabled: bool, min: f64, max: f64) -> DelayConfig {
        DelayConfig {
            enabled,
            min_seconds: min,
            max_seconds: max,
        }
    }

    #[test]
    fn disabled_never_delays() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_delay(&config(false, 1.0, 3.0), &mut rng).is_none());
    }

    #[test]
    fn draws_within_bounds() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..500 {
            let d = pick_delay(&config(true, 1.0, 3.0), &mut rng).unwrap();
            assert!((1.0..=3.0).contains(&d.as_secs_f64()));
        }
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let d = pick_delay(&config(true, 5.0, 1.0), &mut rng).unwrap();
            assert!((1.0..=5.0).contains(&d.as_secs_f64()));
        }
    }

    #[test]
    fn negative_minimum_is_clamped() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..500 {
            if let Some(d) = pick_delay(&config(true, -10.0, 0.5), &mut rng) {
                assert!(d.as_secs_f64() <= 0.5);
            }
        }
    }

    #[test]
    fn non_positive_maximum_is_no_op() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(pick_delay(&config(true, 0.0, 0.0), &mut rng).is_none());
        assert!(pick_delay(&config(true, -3.0, -1.0), &mut rng).is_none());
        // Inverted negatives: swap first, then the max is still <= 0.
        assert!(pick_delay(&config(true, 0.0, -2.0), &mut rng).is_none());
    }

    #[test]
    fn non_finite_bounds_are_no_op() {
        let mut rng = StdRng::seed_from_u64(6);
        assert!(pick_delay(&config(true, f64::NAN, 1.0), &mut rng).is_none());
        assert!(pick_delay(&config(true, 0.0, f64::INFINITY), &mut rng).is_none());
    }

    #[tokio::test]
    async fn waits_the_picked_delay() {
        let controller = DelayController::new(config(true, 0.01, 0.02));
        let started = std::time::Instant::now();
        let waited = controller.maybe_delay().await.unwrap();
        assert!(started.elapsed() >= waited);
        assert!(waited <= Duration::from_millis(20));
    }
}
