//! Browser-automation boundary.
//!
//! The acquisition engine talks to the listing surface through exactly
//! three primitives; everything else about the browser (launch, search
//! navigation, teardown) is session lifecycle owned by the caller.

pub mod chromium;

use async_trait::async_trait;

use crate::acquisition::types::{AcquireError, EntryHandle};

pub use chromium::ChromiumDriver;

/// The per-entry attributes a driver knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryField {
    Name,
    Address,
    Phone,
    Website,
    /// The combined rating element text, e.g. "4.5 stars 1,234 Reviews".
    RatingSummary,
    Category,
    MapUrl,
}

#[async_trait]
pub trait SurfaceDriver: Send + Sync {
    /// All entry handles currently rendered on the surface, in DOM order.
    async fn find_visible_entries(&self) -> Result<Vec<EntryHandle>, AcquireError>;

    /// Read one attribute of one entry. `Ok(None)` means the entry exists
    /// but doesn't carry the field; `StaleHandle` means the entry itself is
    /// gone.
    async fn read_attribute(
        &self,
        handle: &EntryHandle,
        field: EntryField,
    ) -> Result<Option<String>, AcquireError>;

    /// Ask the surface to reveal more entries (scroll the results panel).
    async fn trigger_reveal(&self) -> Result<(), AcquireError>;
}
