// src/acquisition/discoverer.rs
use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::acquisition::types::{AcquireError, EntryHandle};
use crate::config::AcquisitionConfig;
use crate::driver::SurfaceDriver;

/// Drives the scrollable listing and yields newly-visible entries.
///
/// Stateless across calls apart from the no-growth strike counter: the
/// caller supplies its own `seen_keys` on every invocation, because the
/// surface re-renders under us and handle positions mean nothing.
pub struct EntryDiscoverer<'a> {
    driver: &'a dyn SurfaceDriver,
    settle_timeout: Duration,
    settle_poll: Duration,
    no_growth_strikes: u32,
    exhausted: bool,
}

impl<'a> EntryDiscoverer<'a> {
    pub fn new(driver: &'a dyn SurfaceDriver, config: &AcquisitionConfig) -> Self {
        Self {
            driver,
            settle_timeout: Duration::from_millis(config.settle_timeout_ms),
            settle_poll: Duration::from_millis(config.settle_poll_ms.max(1)),
            no_growth_strikes: 0,
            exhausted: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Reveal more of the listing and return the entries whose identity key
    /// is not yet in `seen_keys`. Two consecutive reveals with zero new
    /// keys flip the discoverer to exhausted; a single empty round is
    /// forgiven as a slow render.
    pub async fn next_batch(
        &mut self,
        seen_keys: &HashSet<String>,
    ) -> Result<Vec<EntryHandle>, AcquireError> {
        let before = self.driver.find_visible_entries().await?.len();
        self.driver.trigger_reveal().await?;
        self.wait_for_settle(before).await?;

        let visible = self.driver.find_visible_entries().await?;
        let total_visible = visible.len();

        let mut batch_keys = HashSet::new();
        let fresh: Vec<EntryHandle> = visible
            .into_iter()
            .filter(|handle| {
                !seen_keys.contains(&handle.key) && batch_keys.insert(handle.key.clone())
            })
            .collect();

        if fresh.is_empty() {
            self.no_growth_strikes += 1;
            debug!(
                "No new entries ({} visible), strike {}/2",
                total_visible, self.no_growth_strikes
            );
            if self.no_growth_strikes >= 2 {
                info!("Listing exhausted after {} entries", seen_keys.len());
                self.exhausted = true;
            }
        } else {
            self.no_growth_strikes = 0;
            debug!("Revealed {} new entries ({} visible)", fresh.len(), total_visible);
        }

        Ok(fresh)
    }

    /// Wait until the visible entry count moves off `before`, or the settle
    /// timeout elapses, whichever comes first.
    async fn wait_for_settle(&self, before: usize) -> Result<(), AcquireError> {
        let deadline = Instant::now() + self.settle_timeout;
        loop {
            tokio::time::sleep(self.settle_poll).await;
            let count = self.driver.find_visible_entries().await?.len();
            if count != before || Instant::now() >= deadline {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::testing::ScriptedDriver;

    fn config() -> AcquisitionConfig {
        AcquisitionConfig {
            per_op_timeout_ms: 1_000,
            settle_timeout_ms: 2_000,
            settle_poll_ms: 100,
            abort_threshold: 3,
            default_target_count: 50,
        }
    }

    fn href(letter: char) -> String {
        format!("https://www.google.com/maps/place/{letter}")
    }

    #[tokio::test(start_paused = true)]
    async fn filters_out_entries_already_seen() {
        let driver = ScriptedDriver::new();
        driver.queue_reveal(&[&href('a'), &href('b'), &href('c')]);
        let mut discoverer = EntryDiscoverer::new(&driver, &config());

        let mut seen = HashSet::new();
        seen.insert(EntryHandle::from_href(&href('a')).unwrap().key);

        let batch = discoverer.next_batch(&seen).await.unwrap();
        let keys: Vec<&str> = batch.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].ends_with("/b"));
        assert!(keys[1].ends_with("/c"));
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_keys_within_one_reveal_collapse() {
        let driver = ScriptedDriver::new();
        let twin_a = format!("{}?session=2", href('a'));
        driver.queue_reveal(&[&href('a'), &twin_a, &href('b')]);
        let mut discoverer = EntryDiscoverer::new(&driver, &config());

        let batch = discoverer.next_batch(&HashSet::new()).await.unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn one_empty_reveal_is_forgiven() {
        let driver = ScriptedDriver::new();
        driver.queue_reveal(&[&href('a')]);
        let mut discoverer = EntryDiscoverer::new(&driver, &config());

        let mut seen = HashSet::new();
        for handle in discoverer.next_batch(&seen).await.unwrap() {
            seen.insert(handle.key);
        }

        // script dry: the reveal is a no-op, nothing new appears
        let batch = discoverer.next_batch(&seen).await.unwrap();
        assert!(batch.is_empty());
        assert!(!discoverer.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn two_strikes_flip_exhausted() {
        let driver = ScriptedDriver::new();
        driver.queue_reveal(&[&href('a')]);
        let mut discoverer = EntryDiscoverer::new(&driver, &config());

        let mut seen = HashSet::new();
        for handle in discoverer.next_batch(&seen).await.unwrap() {
            seen.insert(handle.key);
        }

        // script is dry now: two no-growth reveals in a row
        assert!(discoverer.next_batch(&seen).await.unwrap().is_empty());
        assert!(!discoverer.is_exhausted());
        assert!(discoverer.next_batch(&seen).await.unwrap().is_empty());
        assert!(discoverer.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn growth_resets_the_strike_counter() {
        let driver = ScriptedDriver::new();
        driver.queue_reveal(&[&href('a')]);
        driver.queue_reveal(&[&href('a')]); // no growth, strike 1
        driver.queue_reveal(&[&href('a'), &href('b')]); // growth again
        let mut discoverer = EntryDiscoverer::new(&driver, &config());

        let mut seen = HashSet::new();
        for handle in discoverer.next_batch(&seen).await.unwrap() {
            seen.insert(handle.key);
        }
        assert!(discoverer.next_batch(&seen).await.unwrap().is_empty());
        let batch = discoverer.next_batch(&seen).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert!(!discoverer.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn reveal_failure_propagates_as_surface_unavailable() {
        let driver = ScriptedDriver::new();
        driver.queue_failure("results panel detached");
        let mut discoverer = EntryDiscoverer::new(&driver, &config());

        let err = discoverer.next_batch(&HashSet::new()).await.unwrap_err();
        assert!(matches!(err, AcquireError::SurfaceUnavailable(_)));
        assert!(!discoverer.is_exhausted());
    }
}
