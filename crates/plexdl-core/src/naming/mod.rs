//! Filename resolution.
//!
//! Every item's local name is decided here, once, before any byte moves:
//! `<title>.<container>` from the asset, or the fetched file's own name in
//! original-filename mode. No I/O happens in this module.

mod collision;
mod sanitize;
mod sort;

pub use collision::{apply_collision_policy, find_collisions, Collision, CollisionPolicy};
pub use sanitize::{sanitize_component, NAME_MAX, UNTITLED};

use sanitize::truncate_bytes;
pub use sort::sort_by_attribute;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::library::AssetDescriptor;

/// How local filenames are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingMode {
    /// `<title>.<container>`.
    #[default]
    TitleAndContainer,
    /// Keep the name of the file as the library serves it.
    Original,
}

/// Local name of one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetName {
    Resolved(String),
    /// Decided by the fetched file (original-filename mode).
    Original,
}

impl TargetName {
    pub fn resolved(&self) -> Option<&str> {
        match self {
            TargetName::Resolved(name) => Some(name),
            TargetName::Original => None,
        }
    }
}

/// An asset paired with where it will be written.
#[derive(Debug, Clone)]
pub struct NamedItem {
    pub asset: Arc<AssetDescriptor>,
    pub target: TargetName,
    pub directory: PathBuf,
}

impl NamedItem {
    pub fn title(&self) -> &str {
        &self.asset.title
    }

    /// Final path, when the name is known ahead of the download.
    pub fn final_path(&self) -> Option<PathBuf> {
        self.target.resolved().map(|name| self.directory.join(name))
    }
}

impl fmt::Display for NamedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            TargetName::Resolved(name) => f.write_str(name),
            TargetName::Original => write!(f, "{} (original filename)", self.asset.title),
        }
    }
}

fn stem(asset: &AssetDescriptor) -> String {
    let title = sanitize_component(&asset.title);
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// `<stem><tag>.<container>`, with the stem cut so the whole name stays
/// within [`NAME_MAX`] bytes. `tag` (e.g. ` (2)`) is never cut.
fn join_name(stem: &str, tag: &str, asset: &AssetDescriptor) -> String {
    let container = sanitize_component(&asset.container);
    // Keep at least one byte of stem even for absurd containers.
    let container = truncate_bytes(&container, NAME_MAX.saturating_sub(tag.len() + 2));
    let extension_len = if container.is_empty() { 0 } else { container.len() + 1 };
    let budget = NAME_MAX.saturating_sub(tag.len() + extension_len);
    let stem = truncate_bytes(stem, budget);
    if container.is_empty() {
        format!("{}{}", stem, tag)
    } else {
        format!("{}{}.{}", stem, tag, container)
    }
}

/// `<title>.<container>` for `asset`, sanitized; `<title>` alone when the
/// container is unknown. Never longer than [`NAME_MAX`] bytes.
pub fn resolve_filename(asset: &AssetDescriptor) -> String {
    join_name(&stem(asset), "", asset)
}

/// Pairs each asset with its target name under `directory`, preserving order.
pub fn resolve_items(
    assets: Vec<AssetDescriptor>,
    directory: &Path,
    mode: NamingMode,
) -> Vec<NamedItem> {
    assets
        .into_iter()
        .map(|asset| {
            let target = match mode {
                NamingMode::TitleAndContainer => TargetName::Resolved(resolve_filename(&asset)),
                NamingMode::Original => TargetName::Original,
            };
            NamedItem {
                asset: Arc::new(asset),
                target,
                directory: directory.to_path_buf(),
            }
        })
        .collect()
}
