// src/acquisition/engine.rs
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::acquisition::discoverer::EntryDiscoverer;
use crate::acquisition::extractor::FieldExtractor;
use crate::acquisition::governor::RateGovernor;
use crate::acquisition::types::{
    AcquireError, AcquisitionReport, AcquisitionState, ActionKind, EntryHandle,
};
use crate::config::Config;
use crate::driver::SurfaceDriver;
use crate::models::{BusinessRecord, SearchRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Draining,
    Done,
    Aborted,
}

/// Orchestrates discoverer, governor and extractor over one search.
///
/// Strictly sequential: the listing surface is a single-cursor resource, so
/// there is never more than one in-flight operation. The governor's sleeps
/// are the only suspension points; cancellation is polled between entries
/// and never interrupts an extraction in progress.
pub struct AcquisitionEngine<'a> {
    driver: &'a dyn SurfaceDriver,
    config: &'a Config,
    cancel: CancellationToken,
}

impl<'a> AcquisitionEngine<'a> {
    pub fn new(driver: &'a dyn SurfaceDriver, config: &'a Config, cancel: CancellationToken) -> Self {
        Self {
            driver,
            config,
            cancel,
        }
    }

    /// Run the acquisition until the target count is met, the listing is
    /// exhausted, the caller cancels, or the surface fails hard. Always
    /// returns whatever was accumulated; `aborted` is the only failure
    /// signal that reaches the caller.
    pub async fn run(&self, request: &SearchRequest) -> AcquisitionReport {
        let run_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        let abort_threshold = self.config.acquisition.abort_threshold.max(1);
        let progress_interval = self.config.logging.progress_interval.max(1);

        let mut state = AcquisitionState::default();
        let mut discoverer = EntryDiscoverer::new(self.driver, &self.config.acquisition);
        let mut governor = RateGovernor::new(&self.config.rate_limit);
        let extractor = FieldExtractor::new(self.driver);

        let mut run_state = RunState::Running;
        let mut skipped = 0usize;
        let mut consecutive_failures = 0u32;
        let mut abort_reason: Option<String> = None;

        info!(
            "🚀 Acquisition {} started: '{}' in '{}' (target {})",
            run_id, request.query, request.location, request.target_count
        );

        while run_state == RunState::Running {
            if self.cancel.is_cancelled() {
                info!("🛑 Cancellation requested, draining with {} records", state.records.len());
                run_state = RunState::Draining;
                break;
            }
            if state.records.len() >= request.target_count {
                debug!("Target count reached");
                run_state = RunState::Draining;
                break;
            }
            if state.exhausted {
                run_state = RunState::Draining;
                break;
            }

            governor.before_action(ActionKind::Reveal).await;
            let batch = match discoverer.next_batch(&state.seen_keys).await {
                Ok(batch) => {
                    consecutive_failures = 0;
                    batch
                }
                Err(err) => {
                    // discovery failures are all surface-level
                    consecutive_failures += 1;
                    warn!(
                        "⚠️  Surface unavailable ({}/{}): {}",
                        consecutive_failures, abort_threshold, err
                    );
                    if consecutive_failures >= abort_threshold {
                        abort_reason = Some(err.to_string());
                        run_state = RunState::Aborted;
                    }
                    continue;
                }
            };
            state.exhausted = discoverer.is_exhausted();

            let mut processed_in_batch = 0usize;
            for handle in batch {
                if self.cancel.is_cancelled() {
                    info!("🛑 Cancellation requested, draining with {} records", state.records.len());
                    run_state = RunState::Draining;
                    break;
                }
                if state.records.len() >= request.target_count {
                    run_state = RunState::Draining;
                    break;
                }
                if state.seen_keys.contains(&handle.key) {
                    continue;
                }

                governor.before_action(ActionKind::Extract).await;
                processed_in_batch += 1;

                match self.extract_with_retry(&extractor, &handle).await {
                    Ok(record) => {
                        consecutive_failures = 0;
                        state.seen_keys.insert(handle.key.clone());
                        // the extract-time map URL is authoritative; it can
                        // differ from the discovery-time key after a re-render
                        let duplicate = record.map_url != handle.key
                            && !state.seen_keys.insert(record.map_url.clone());
                        if duplicate {
                            debug!("Duplicate after canonicalization: {}", record.map_url);
                            continue;
                        }
                        debug!(
                            "📇 {} ({})",
                            record.name.as_deref().unwrap_or("<unnamed>"),
                            record.map_url
                        );
                        state.records.push(record);
                        if state.records.len() % progress_interval == 0 {
                            info!(
                                "Progress: {}/{} records",
                                state.records.len(),
                                request.target_count
                            );
                        }
                    }
                    Err(AcquireError::SurfaceUnavailable(reason)) => {
                        consecutive_failures += 1;
                        skipped += 1;
                        warn!(
                            "⚠️  Surface unavailable mid-batch ({}/{}): {}",
                            consecutive_failures, abort_threshold, reason
                        );
                        if consecutive_failures >= abort_threshold {
                            abort_reason = Some(reason);
                            run_state = RunState::Aborted;
                        }
                        // the rest of this batch is unreachable either way
                        break;
                    }
                    Err(err) => {
                        skipped += 1;
                        // keep the key so the discoverer stops re-offering
                        // an entry that can never produce a record
                        state.seen_keys.insert(handle.key.clone());
                        debug!("⏭️  Skipping entry {}: {}", handle.key, err);
                    }
                }
            }
            if run_state == RunState::Running {
                governor.on_batch_boundary(processed_in_batch).await;
            }
        }

        if run_state == RunState::Draining {
            // nothing is ever in flight between entries; draining is just
            // the named step before Done
            debug!("Draining complete");
            run_state = RunState::Done;
        }

        let aborted = run_state == RunState::Aborted;
        let duration_ms = started.elapsed().as_millis() as u64;
        if aborted {
            warn!(
                "❌ Acquisition {} aborted after {}ms: {} records kept, {} skipped",
                run_id,
                duration_ms,
                state.records.len(),
                skipped
            );
        } else {
            info!(
                "🏁 Acquisition {} done in {}ms: {} records, {} skipped",
                run_id,
                duration_ms,
                state.records.len(),
                skipped
            );
        }

        AcquisitionReport {
            run_id,
            records: state.records,
            skipped,
            aborted,
            abort_reason,
            duration_ms,
        }
    }

    /// One extraction attempt, with a single retry for a stale handle. The
    /// retry re-resolves the entry by identity key from what is currently
    /// visible; `NoIdentity` is never retried.
    async fn extract_with_retry(
        &self,
        extractor: &FieldExtractor<'_>,
        handle: &EntryHandle,
    ) -> Result<BusinessRecord, AcquireError> {
        match extractor.extract(handle).await {
            Err(AcquireError::StaleHandle) => {
                debug!("🔄 Stale handle for {}, re-resolving once", handle.key);
                let visible = self.driver.find_visible_entries().await?;
                match visible.into_iter().find(|h| h.key == handle.key) {
                    Some(fresh) => extractor.extract(&fresh).await,
                    None => Err(AcquireError::StaleHandle),
                }
            }
            outcome => outcome,
        }
    }
}
