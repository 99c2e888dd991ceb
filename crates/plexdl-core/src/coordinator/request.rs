use std::path::{Path, PathBuf};

use crate::config::{PlexdlConfig, DEFAULT_MAX_THREADS};
use crate::naming::{sanitize_component, CollisionPolicy, NamingMode, UNTITLED};

/// Everything one run needs besides the library client.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Collection (playlist) name to download.
    pub collection: String,
    /// Managed account to switch to before looking up the collection.
    pub switch_account: Option<String>,
    /// Directory that relative destinations resolve against.
    pub base_dir: PathBuf,
    /// Destination directory; defaults to the collection title.
    pub save_to: Option<PathBuf>,
    /// Attribute to sort the collection by before naming.
    pub order_by: Option<String>,
    pub naming: NamingMode,
    pub collisions: CollisionPolicy,
    pub max_concurrency: usize,
    /// Skip the confirmation gate (non-interactive use).
    pub confirmed: bool,
}

impl RunRequest {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            switch_account: None,
            base_dir: PathBuf::from("."),
            save_to: None,
            order_by: None,
            naming: NamingMode::default(),
            collisions: CollisionPolicy::default(),
            max_concurrency: DEFAULT_MAX_THREADS,
            confirmed: false,
        }
    }

    /// Request seeded from config; CLI flags are applied on top by the caller.
    pub fn from_config(collection: impl Into<String>, cfg: &PlexdlConfig) -> Self {
        Self {
            switch_account: cfg.plex.switch_user.clone(),
            save_to: cfg.plex.save_to.clone(),
            max_concurrency: cfg.plex.max_threads,
            collisions: cfg.download.collisions,
            ..Self::new(collection)
        }
    }

    /// Destination directory for a collection titled `collection_title`.
    pub fn destination(&self, collection_title: &str) -> PathBuf {
        match &self.save_to {
            Some(dir) => self.base_dir.join(dir),
            None => {
                let name = sanitize_component(collection_title);
                let name = if name.is_empty() { UNTITLED } else { name.as_str() };
                self.base_dir.join(Path::new(name))
            }
        }
    }
}
