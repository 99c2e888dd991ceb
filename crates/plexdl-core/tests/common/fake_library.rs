//! In-memory Library Client with fetch instrumentation.
//!
//! Counts fetch calls, tracks how many fetches run at once (RAII gauge), and
//! can be told to fail (or panic on) specific items.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use plexdl_core::error::LibraryError;
use plexdl_core::library::{
    AssetDescriptor, AssetLocator, Collection, CollectionInfo, LibraryClient,
};

#[derive(Debug, Default)]
pub struct FetchStats {
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FetchStats {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight gauge when dropped.
struct InFlightGuard<'a>(&'a FetchStats);

impl<'a> InFlightGuard<'a> {
    fn enter(stats: &'a FetchStats) -> Self {
        stats.calls.fetch_add(1, Ordering::SeqCst);
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(stats)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
pub struct FakeLibrary {
    pub collection: Collection,
    /// Ordinal → failure reason.
    pub failures: HashMap<usize, String>,
    /// Ordinals whose fetch panics.
    pub panics: HashSet<usize>,
    pub delay: Duration,
    pub accounts: Vec<String>,
    pub stats: Arc<FetchStats>,
}

impl FakeLibrary {
    pub fn new(title: &str, items: Vec<AssetDescriptor>) -> Self {
        Self {
            collection: Collection {
                title: title.to_string(),
                items,
            },
            failures: HashMap::new(),
            panics: HashSet::new(),
            delay: Duration::ZERO,
            accounts: Vec::new(),
            stats: Arc::new(FetchStats::default()),
        }
    }

    /// Collection of `(title, container)` pairs in order, each with a server file name.
    pub fn with_tracks(title: &str, tracks: &[(&str, &str)]) -> Self {
        let items = tracks
            .iter()
            .enumerate()
            .map(|(i, (t, c))| {
                AssetDescriptor::new(i, *t, *c).with_locator(AssetLocator {
                    key: format!("/library/parts/{}", i),
                    file_name: Some(format!("{:02} {}.{}", i + 1, t, c)),
                })
            })
            .collect();
        Self::new(title, items)
    }

    pub fn failing(mut self, ordinal: usize, reason: &str) -> Self {
        self.failures.insert(ordinal, reason.to_string());
        self
    }

    pub fn panicking(mut self, ordinal: usize) -> Self {
        self.panics.insert(ordinal);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_account(mut self, name: &str) -> Self {
        self.accounts.push(name.to_string());
        self
    }
}

/// Bytes the fake serves for an asset.
pub fn body_for(asset: &AssetDescriptor) -> Vec<u8> {
    format!("audio:{}:{}", asset.ordinal, asset.title).into_bytes()
}

impl LibraryClient for FakeLibrary {
    fn switch_account(&self, account: &str) -> Result<Self, LibraryError> {
        if self.accounts.iter().any(|a| a == account) {
            Ok(self.clone())
        } else {
            Err(LibraryError::Auth(format!("no managed account {:?}", account)))
        }
    }

    fn collections(&self) -> Result<Vec<CollectionInfo>, LibraryError> {
        Ok(vec![CollectionInfo {
            title: self.collection.title.clone(),
            item_count: self.collection.items.len(),
        }])
    }

    fn collection(&self, name: &str) -> Result<Collection, LibraryError> {
        if name == self.collection.title {
            Ok(self.collection.clone())
        } else {
            Err(LibraryError::NotFound(format!("playlist {:?}", name)))
        }
    }

    fn fetch_asset(
        &self,
        asset: &AssetDescriptor,
        temp_dir: &Path,
    ) -> Result<PathBuf, LibraryError> {
        let _guard = InFlightGuard::enter(&self.stats);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.panics.contains(&asset.ordinal) {
            panic!("fake fetch blew up on {}", asset.title);
        }
        if let Some(reason) = self.failures.get(&asset.ordinal) {
            return Err(LibraryError::Fetch(reason.clone()));
        }
        let name = asset
            .locator
            .as_ref()
            .and_then(|l| l.file_name.clone())
            .unwrap_or_else(|| format!("asset-{}", asset.ordinal));
        let path = temp_dir.join(name);
        std::fs::write(&path, body_for(asset)).map_err(|e| LibraryError::Fetch(e.to_string()))?;
        Ok(path)
    }
}
