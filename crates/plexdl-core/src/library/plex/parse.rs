//! Plex JSON responses (`Accept: application/json`) and their mapping to assets.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::LibraryError;
use crate::library::{AssetDescriptor, AssetLocator, AttrValue, CollectionInfo};
use crate::naming::sanitize_component;

/// Every Plex server response is wrapped in a `MediaContainer` object.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ServerIdentity {
    pub machine_identifier: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PlaylistList {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<PlaylistEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaylistEntry {
    pub rating_key: String,
    pub title: String,
    #[serde(default)]
    pub leaf_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ItemList {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<Map<String, Value>>,
}

/// plex.tv home user (`/api/v2/home/users`).
#[derive(Debug, Deserialize)]
pub(super) struct HomeUsers {
    #[serde(default)]
    pub users: Vec<HomeUser>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HomeUser {
    pub uuid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl HomeUser {
    pub fn matches(&self, name: &str) -> bool {
        [&self.title, &self.username]
            .into_iter()
            .flatten()
            .any(|n| n.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SwitchedUser {
    pub auth_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Resource {
    pub client_identifier: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

pub(super) fn decode<T: DeserializeOwned>(body: &[u8], what: &str) -> Result<T, LibraryError> {
    serde_json::from_slice(body).map_err(|e| LibraryError::Protocol(format!("{}: {}", what, e)))
}

impl From<&PlaylistEntry> for CollectionInfo {
    fn from(entry: &PlaylistEntry) -> Self {
        CollectionInfo {
            title: entry.title.clone(),
            item_count: entry.leaf_count.unwrap_or(0) as usize,
        }
    }
}

fn first_object<'a>(value: Option<&'a Value>) -> Option<&'a Map<String, Value>> {
    value?.as_array()?.first()?.as_object()
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Last component of a server-side path, which may use either separator.
fn basename(path: &str) -> Option<&str> {
    path.rsplit(['/', '\\']).next().filter(|s| !s.is_empty())
}

/// Converts one playlist item into an asset. Scalar top-level fields become
/// sortable attributes; the first media part becomes the locator.
pub(super) fn asset_from_item(ordinal: usize, item: &Map<String, Value>) -> AssetDescriptor {
    let title = str_field(item, "title").unwrap_or_default();
    let media = first_object(item.get("Media"));
    let part = media.and_then(|m| first_object(m.get("Part")));

    let container = media
        .and_then(|m| str_field(m, "container"))
        .or_else(|| part.and_then(|p| str_field(p, "container")))
        .unwrap_or_default();

    let mut asset = AssetDescriptor::new(ordinal, title, container);

    if let Some(key) = part.and_then(|p| str_field(p, "key")) {
        let file_name = part
            .and_then(|p| str_field(p, "file"))
            .and_then(basename)
            .map(sanitize_component)
            .filter(|s| !s.is_empty());
        asset = asset.with_locator(AssetLocator {
            key: key.to_string(),
            file_name,
        });
    }

    for (key, value) in item {
        let attr = match value {
            Value::Number(n) => n
                .as_i64()
                .map(AttrValue::Int)
                .or_else(|| n.as_f64().map(AttrValue::Float)),
            Value::String(s) => Some(AttrValue::Text(s.clone())),
            _ => None,
        };
        if let Some(attr) = attr {
            if !matches!(key.as_str(), "title" | "container") {
                asset.attributes.insert(key.clone(), attr);
            }
        }
    }

    asset
}
