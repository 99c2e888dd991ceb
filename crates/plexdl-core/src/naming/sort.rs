//! Optional ordering of a collection by an attribute.

use crate::error::RunError;
use crate::library::{AssetDescriptor, AttrValue};

/// Sorts `assets` ascending by `key`, keeping source order among equal keys.
///
/// Every asset must carry the key; otherwise nothing is reordered and a
/// configuration error names the first asset lacking it.
pub fn sort_by_attribute(assets: &mut [AssetDescriptor], key: &str) -> Result<(), RunError> {
    let mut keyed: Vec<(AttrValue, usize)> = Vec::with_capacity(assets.len());
    for (idx, asset) in assets.iter().enumerate() {
        let value = asset.attribute(key).ok_or_else(|| {
            RunError::Config(format!(
                "sort attribute {:?} does not exist on item {:?}",
                key, asset.title
            ))
        })?;
        keyed.push((value, idx));
    }

    // Stable by construction: ties fall back to the original index.
    keyed.sort();
    let reordered: Vec<AssetDescriptor> = keyed
        .into_iter()
        .map(|(_, idx)| assets[idx].clone())
        .collect();
    assets.clone_from_slice(&reordered);
    Ok(())
}
