// src/acquisition/testing.rs
//! Scripted in-memory surface driver for unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::acquisition::types::{AcquireError, EntryHandle};
use crate::driver::{EntryField, SurfaceDriver};

pub enum RevealStep {
    /// After this reveal the surface shows exactly these entry hrefs.
    Show(Vec<String>),
    /// This reveal fails with `SurfaceUnavailable`.
    Fail(String),
}

/// A `SurfaceDriver` whose surface is a script. Reveals consume the script
/// in order; once it runs dry further reveals are no-ops, which is how a
/// real listing behaves at the end of its results.
#[derive(Default)]
pub struct ScriptedDriver {
    visible: Mutex<Vec<String>>,
    reveals: Mutex<VecDeque<RevealStep>>,
    attributes: Mutex<HashMap<(String, EntryField), String>>,
    no_identity: Mutex<HashSet<String>>,
    stale_reads: Mutex<HashMap<String, u32>>,
    reveal_calls: AtomicUsize,
    map_url_reads: Mutex<Vec<String>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the currently-visible entries without consuming the script.
    pub fn show(&self, hrefs: &[&str]) {
        *self.visible.lock().unwrap() = hrefs.iter().map(|h| h.to_string()).collect();
    }

    pub fn queue_reveal(&self, hrefs: &[&str]) -> &Self {
        self.reveals
            .lock()
            .unwrap()
            .push_back(RevealStep::Show(hrefs.iter().map(|h| h.to_string()).collect()));
        self
    }

    pub fn queue_failure(&self, reason: &str) -> &Self {
        self.reveals
            .lock()
            .unwrap()
            .push_back(RevealStep::Fail(reason.to_string()));
        self
    }

    pub fn set_attribute(&self, href: &str, field: EntryField, value: &str) -> &Self {
        self.attributes
            .lock()
            .unwrap()
            .insert((href.to_string(), field), value.to_string());
        self
    }

    /// Make the entry's map URL unreadable, so extraction hits `NoIdentity`.
    pub fn drop_identity(&self, href: &str) -> &Self {
        self.no_identity.lock().unwrap().insert(href.to_string());
        self
    }

    /// The next `times` attribute reads of this entry fail with
    /// `StaleHandle`.
    pub fn mark_stale(&self, href: &str, times: u32) -> &Self {
        self.stale_reads.lock().unwrap().insert(href.to_string(), times);
        self
    }

    pub fn reveal_calls(&self) -> usize {
        self.reveal_calls.load(Ordering::SeqCst)
    }

    /// Hrefs whose map URL was read, one entry per extraction attempt.
    pub fn extraction_attempts(&self) -> Vec<String> {
        self.map_url_reads.lock().unwrap().clone()
    }
}

#[async_trait]
impl SurfaceDriver for ScriptedDriver {
    async fn find_visible_entries(&self) -> Result<Vec<EntryHandle>, AcquireError> {
        Ok(self
            .visible
            .lock()
            .unwrap()
            .iter()
            .filter_map(|href| EntryHandle::from_href(href))
            .collect())
    }

    async fn read_attribute(
        &self,
        handle: &EntryHandle,
        field: EntryField,
    ) -> Result<Option<String>, AcquireError> {
        {
            let mut stale = self.stale_reads.lock().unwrap();
            if let Some(remaining) = stale.get_mut(&handle.href) {
                if *remaining > 0 {
                    *remaining = remaining.saturating_sub(1);
                    return Err(AcquireError::StaleHandle);
                }
            }
        }

        if field == EntryField::MapUrl {
            self.map_url_reads.lock().unwrap().push(handle.href.clone());
        }

        let overridden = self
            .attributes
            .lock()
            .unwrap()
            .get(&(handle.href.clone(), field))
            .cloned();
        if overridden.is_some() {
            return Ok(overridden);
        }

        if field == EntryField::MapUrl {
            if self.no_identity.lock().unwrap().contains(&handle.href) {
                return Ok(None);
            }
            return Ok(Some(handle.href.clone()));
        }

        Ok(None)
    }

    async fn trigger_reveal(&self) -> Result<(), AcquireError> {
        self.reveal_calls.fetch_add(1, Ordering::SeqCst);
        match self.reveals.lock().unwrap().pop_front() {
            Some(RevealStep::Show(hrefs)) => {
                *self.visible.lock().unwrap() = hrefs;
                Ok(())
            }
            Some(RevealStep::Fail(reason)) => Err(AcquireError::SurfaceUnavailable(reason)),
            None => Ok(()),
        }
    }
}
