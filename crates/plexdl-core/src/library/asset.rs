use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Sortable attribute value carried by an asset.
#[derive(Debug, Clone)]
pub enum AttrValue {
    Int(i64),
    /// Non-integral numbers (`userRating`, `audienceRating`, ...).
    Float(f64),
    Text(String),
}

impl AttrValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            AttrValue::Text(_) => None,
        }
    }
}

impl Ord for AttrValue {
    /// Numbers compare numerically (ints and floats together, floats by
    /// `total_cmp`) and text lexicographically; numbers sort before text when
    /// a key mixes both.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (AttrValue::Int(a), AttrValue::Int(b)) => a.cmp(b),
            (AttrValue::Text(a), AttrValue::Text(b)) => a.cmp(b),
            (AttrValue::Text(_), _) => Ordering::Greater,
            (_, AttrValue::Text(_)) => Ordering::Less,
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            },
        }
    }
}

impl PartialOrd for AttrValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AttrValue {}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Text(v) => f.write_str(v),
        }
    }
}

/// Where the client finds the bytes of an asset. Opaque to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocator {
    /// Client-specific key (for Plex, the media part path).
    pub key: String,
    /// File name of the asset on the server, if known.
    pub file_name: Option<String>,
}

/// One remote media item.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDescriptor {
    /// Zero-based position in the source collection.
    pub ordinal: usize,
    pub title: String,
    /// Primary container / extension (`mp3`, `flac`, ...). May be empty.
    pub container: String,
    pub locator: Option<AssetLocator>,
    /// Extra attributes usable as sort keys (`addedAt`, `year`, ...).
    pub attributes: BTreeMap<String, AttrValue>,
}

impl AssetDescriptor {
    pub fn new(ordinal: usize, title: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            ordinal,
            title: title.into(),
            container: container.into(),
            locator: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_locator(mut self, locator: AssetLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Value of a sort key. `title`, `container` and `ordinal` are always
    /// present; anything else comes from `attributes`.
    pub fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "title" => Some(AttrValue::Text(self.title.clone())),
            "container" => Some(AttrValue::Text(self.container.clone())),
            "ordinal" => i64::try_from(self.ordinal).ok().map(AttrValue::Int),
            other => self.attributes.get(other).cloned(),
        }
    }
}

/// Summary of a collection, as listed by `LibraryClient::collections`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub title: String,
    pub item_count: usize,
}

/// A collection and its items in source order.
#[derive(Debug, Clone)]
pub struct Collection {
    pub title: String,
    pub items: Vec<AssetDescriptor>,
}
