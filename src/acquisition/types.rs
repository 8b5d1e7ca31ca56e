// src/acquisition/types.rs
use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::models::BusinessRecord;

/// Reference to one rendered listing on the results surface.
///
/// The `key` is derived from the entry's canonical map URL, never from
/// scroll position or DOM index, since those don't survive a re-render. The raw
/// `href` is what the driver uses to locate the element again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHandle {
    pub key: String,
    pub href: String,
}

impl EntryHandle {
    /// Build a handle from a listing link's href. Returns `None` when the
    /// href can't yield a stable identity key.
    pub fn from_href(href: &str) -> Option<Self> {
        canonical_key(href).map(|key| Self {
            key,
            href: href.to_string(),
        })
    }
}

/// Canonical identity key for a listing: scheme, host and path of its map
/// URL. Query string and fragment are dropped; Maps appends per-session
/// parameters that would defeat deduplication.
pub fn canonical_key(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?;
    Some(format!("{}://{}{}", url.scheme(), host, url.path()))
}

/// The page-affecting actions the rate governor gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Reveal,
    Extract,
}

#[derive(Debug, Error)]
pub enum AcquireError {
    /// The entry has no resolvable map URL. The entry is unusable; the run
    /// continues without it.
    #[error("entry has no usable identity key")]
    NoIdentity,

    /// The element behind the handle disappeared between discovery and
    /// extraction. Worth one re-resolution attempt.
    #[error("entry handle went stale")]
    StaleHandle,

    /// A discovery or navigation primitive failed outright. Counts toward
    /// the run's consecutive-failure abort threshold.
    #[error("listing surface unavailable: {0}")]
    SurfaceUnavailable(String),
}

/// Accumulated state of one run. Owned exclusively by the engine; other
/// components only ever see the specific values they need.
#[derive(Debug, Default)]
pub struct AcquisitionState {
    pub seen_keys: HashSet<String>,
    pub records: Vec<BusinessRecord>,
    pub exhausted: bool,
}

/// What an acquisition run hands back to the caller. `aborted` is the only
/// way a run signals trouble: per-entry failures are absorbed into
/// `skipped` and the run keeps whatever it managed to collect.
#[derive(Debug)]
pub struct AcquisitionReport {
    pub run_id: String,
    pub records: Vec<BusinessRecord>,
    pub skipped: usize,
    pub aborted: bool,
    pub abort_reason: Option<String>,
    pub duration_ms: u64,
}
