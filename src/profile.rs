use std::io::Read;

use crate::category::{CategoryIndex, CategoryList};
use crate::error::Error;
use crate::profile_json::{profile_from_json, ProfileJson};
use crate::thread::Thread;
use crate::timestamp::Timestamp;

/// The units of the sample columns, from `meta.sampleUnits`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleUnits {
    pub time: Option<String>,
    pub event_delay: Option<String>,
    pub thread_cpu_delta: Option<String>,
}

/// The profile-wide metadata from `meta`.
#[derive(Debug, Clone, Default)]
pub struct ProfileMeta {
    /// The sampling interval in milliseconds.
    pub interval: f64,
    /// Milliseconds since the unix epoch at which the profile's reference
    /// timestamp lies.
    pub start_time: f64,
    pub product: String,
    pub categories: CategoryList,
    pub sample_units: Option<SampleUnits>,
}

/// One page (tab / iframe document) from `pages[]`, keyed by its inner
/// window ID.
#[derive(Debug, Clone)]
pub struct Page {
    pub tab_id: Option<u64>,
    pub inner_window_id: u64,
    pub url: String,
    pub embedder_inner_window_id: u64,
    pub is_private_browsing: bool,
}

/// A parsed profile: metadata plus one table set per thread.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub meta: ProfileMeta,
    pub(crate) threads: Vec<Thread>,
    pub(crate) pages: Vec<Page>,
}

impl Profile {
    /// Parse a profile from processed-profile JSON text.
    pub fn from_str(json: &str) -> Result<Profile, Error> {
        let raw: ProfileJson = serde_json::from_str(json)?;
        profile_from_json(raw)
    }

    /// Parse a profile from a reader of processed-profile JSON.
    pub fn from_reader(reader: impl Read) -> Result<Profile, Error> {
        let raw: ProfileJson = serde_json::from_reader(reader)?;
        profile_from_json(raw)
    }

    /// Parse a profile from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Profile, Error> {
        let raw: ProfileJson = serde_json::from_value(value)?;
        profile_from_json(raw)
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn thread(&self, index: usize) -> Result<&Thread, Error> {
        self.threads
            .get(index)
            .ok_or(Error::InvalidThreadIndex(index))
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Look up the page for a marker's or frame's inner window ID.
    ///
    /// A miss is a soft failure: the tooltip or menu item that wanted the
    /// page is omitted, the profile stays usable.
    pub fn page_for_inner_window_id(&self, inner_window_id: u64) -> Option<&Page> {
        let page = self
            .pages
            .iter()
            .find(|p| p.inner_window_id == inner_window_id);
        if page.is_none() {
            log::warn!("No page found for innerWindowID {inner_window_id}");
        }
        page
    }

    pub fn default_category(&self) -> CategoryIndex {
        self.meta.categories.default_category()
    }

    /// The time span covered by all threads' samples and markers.
    pub fn time_range(&self) -> (Timestamp, Timestamp) {
        let mut start = Timestamp::MAX;
        let mut end = Timestamp::ZERO;
        for thread in &self.threads {
            if let Some((thread_start, thread_end)) = thread.time_range() {
                start = start.min(thread_start);
                end = end.max(thread_end);
            }
        }
        if start > end {
            (Timestamp::ZERO, Timestamp::ZERO)
        } else {
            (start, end)
        }
    }
}
