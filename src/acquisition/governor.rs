// src/acquisition/governor.rs
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::acquisition::types::ActionKind;
use crate::config::RateLimitConfig;

/// Pure timing gate between page-affecting actions.
///
/// The governor has no idea what it is pacing: it only sees action kinds
/// and counts, which keeps it swappable for tokio's paused clock in tests.
/// Two policies: a minimum spacing between any two actions, and a longer
/// jittered pause each time the processed-entry count crosses a batch
/// boundary. The jitter avoids a fixed-interval fingerprint.
pub struct RateGovernor {
    min_spacing: Duration,
    batch_size: usize,
    batch_pause_min_ms: u64,
    batch_pause_max_ms: u64,
    last_action: Option<Instant>,
    processed: usize,
}

impl RateGovernor {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            min_spacing: Duration::from_millis(config.min_action_spacing_ms),
            batch_size: config.batch_size.max(1),
            batch_pause_min_ms: config.batch_pause_min_ms,
            batch_pause_max_ms: config.batch_pause_max_ms.max(config.batch_pause_min_ms),
            last_action: None,
            processed: 0,
        }
    }

    /// Suspends the caller until the next action is allowed.
    pub async fn before_action(&mut self, kind: ActionKind) {
        if let Some(last) = self.last_action {
            let elapsed = last.elapsed();
            if elapsed < self.min_spacing {
                let wait = self.min_spacing - elapsed;
                debug!("Pacing {:?} for {}ms", kind, wait.as_millis());
                tokio::time::sleep(wait).await;
            }
        }
        self.last_action = Some(Instant::now());
    }

    /// Called once per completed batch with the number of entries it
    /// processed. Inserts the long pause whenever the running total crosses
    /// a multiple of `batch_size`.
    pub async fn on_batch_boundary(&mut self, batch_size: usize) {
        if batch_size == 0 {
            return;
        }
        let before = self.processed;
        self.processed += batch_size;
        if self.processed / self.batch_size > before / self.batch_size {
            let pause = self.jittered_pause();
            debug!(
                "Batch pause: {}ms after {} processed entries",
                pause.as_millis(),
                self.processed
            );
            tokio::time::sleep(pause).await;
        }
    }

    fn jittered_pause(&self) -> Duration {
        let ms = fastrand::u64(self.batch_pause_min_ms..=self.batch_pause_max_ms);
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RateLimitConfig {
        RateLimitConfig {
            min_action_spacing_ms: 2_000,
            batch_size: 10,
            batch_pause_min_ms: 5_000,
            batch_pause_max_ms: 10_000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn enforces_minimum_spacing_across_fifty_actions() {
        let mut governor = RateGovernor::new(&test_config());
        let mut stamps = Vec::new();

        for i in 0..50 {
            let kind = if i % 5 == 0 {
                ActionKind::Reveal
            } else {
                ActionKind::Extract
            };
            governor.before_action(kind).await;
            stamps.push(Instant::now());
        }

        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(2_000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_action_is_not_delayed() {
        let mut governor = RateGovernor::new(&test_config());
        let start = Instant::now();
        governor.before_action(ActionKind::Reveal).await;
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn batch_pause_fires_when_crossing_batch_size() {
        let mut governor = RateGovernor::new(&test_config());

        let start = Instant::now();
        governor.on_batch_boundary(4).await;
        assert_eq!(Instant::now(), start, "4/10 entries, no pause yet");

        let start = Instant::now();
        governor.on_batch_boundary(7).await;
        let paused = Instant::now() - start;
        assert!(paused >= Duration::from_millis(5_000), "crossed 10, long pause");
        assert!(paused <= Duration::from_millis(10_000));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_batch_never_pauses() {
        let mut governor = RateGovernor::new(&test_config());
        let start = Instant::now();
        governor.on_batch_boundary(0).await;
        assert_eq!(Instant::now(), start);
    }
}
