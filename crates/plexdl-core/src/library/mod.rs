//! Library Client seam.
//!
//! The pipeline only depends on the [`LibraryClient`] trait and the asset
//! types below. [`plex::PlexClient`] is the concrete implementation used by
//! the CLI; tests substitute their own.

pub mod plex;

mod asset;

pub use asset::{AssetDescriptor, AssetLocator, AttrValue, Collection, CollectionInfo};

use std::path::{Path, PathBuf};

use crate::error::LibraryError;

/// Operations the download pipeline needs from a remote media library.
///
/// Connecting is the constructor of each implementation (e.g.
/// [`plex::PlexClient::connect`]). All methods block; the pipeline calls
/// `fetch_asset` from `spawn_blocking`.
pub trait LibraryClient: Send + Sync + 'static {
    /// Returns a client acting as the named managed account.
    fn switch_account(&self, account: &str) -> Result<Self, LibraryError>
    where
        Self: Sized;

    /// Lists the collections (playlists) visible to this account.
    fn collections(&self) -> Result<Vec<CollectionInfo>, LibraryError>;

    /// Looks up a collection by name and returns its items in source order.
    fn collection(&self, name: &str) -> Result<Collection, LibraryError>;

    /// Downloads `asset` into `temp_dir`, returning the path of the fetched
    /// file. The file name is the server-side name of the asset.
    fn fetch_asset(&self, asset: &AssetDescriptor, temp_dir: &Path)
        -> Result<PathBuf, LibraryError>;
}
