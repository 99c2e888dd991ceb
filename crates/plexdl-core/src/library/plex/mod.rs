//! Plex Media Server implementation of [`LibraryClient`].
//!
//! Talks JSON to the server (`Accept: application/json`) and to plex.tv for
//! managed-account switching. Playlists are the collections; the first media
//! part of each item is what gets downloaded.

mod home;
mod http;
mod parse;

use std::path::{Path, PathBuf};
use url::Url;

use crate::error::LibraryError;
use crate::library::{AssetDescriptor, AssetLocator, Collection, CollectionInfo, LibraryClient};
use crate::naming::sanitize_component;

use http::Method;
use parse::{Envelope, ItemList, PlaylistList, ServerIdentity};

/// Default plex.tv endpoint for account operations.
pub const PLEX_TV_URL: &str = "https://plex.tv";

const PRODUCT: &str = "plexdl";

/// Client-side settings that are not credentials.
#[derive(Debug, Clone)]
pub struct PlexOptions {
    /// Sent as `X-Plex-Client-Identifier`.
    pub client_identifier: String,
    /// Base URL of plex.tv (overridable for tests).
    pub plex_tv_url: String,
}

impl Default for PlexOptions {
    fn default() -> Self {
        Self {
            client_identifier: PRODUCT.to_string(),
            plex_tv_url: PLEX_TV_URL.to_string(),
        }
    }
}

/// A connected Plex session.
#[derive(Debug, Clone)]
pub struct PlexClient {
    base: Url,
    token: String,
    options: PlexOptions,
    machine_identifier: String,
    server_name: Option<String>,
}

impl PlexClient {
    /// Connects with default options.
    pub fn connect(host: &str, token: &str) -> Result<Self, LibraryError> {
        Self::connect_with_options(host, token, PlexOptions::default())
    }

    /// Probes the server root with `token`. A rejected token is `Auth`,
    /// an unreachable host is `Connection`.
    pub fn connect_with_options(
        host: &str,
        token: &str,
        options: PlexOptions,
    ) -> Result<Self, LibraryError> {
        let base = Url::parse(host)
            .map_err(|e| LibraryError::Connection(format!("invalid host URL {:?}: {}", host, e)))?;
        let mut client = PlexClient {
            base,
            token: token.to_string(),
            options,
            machine_identifier: String::new(),
            server_name: None,
        };
        let identity: Envelope<ServerIdentity> = client.get_json("/", &[], "server root")?;
        client.machine_identifier = identity.media_container.machine_identifier;
        client.server_name = identity.media_container.friendly_name;
        tracing::debug!(
            server = client.server_name.as_deref().unwrap_or("?"),
            machine = %client.machine_identifier,
            "connected to plex"
        );
        Ok(client)
    }

    pub fn machine_identifier(&self) -> &str {
        &self.machine_identifier
    }

    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// Server URL for `path` (which starts with `/`), keeping any path prefix of the host.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, LibraryError> {
        let raw = format!("{}{}", self.base.as_str().trim_end_matches('/'), path);
        let mut url = Url::parse(&raw)
            .map_err(|e| LibraryError::Protocol(format!("bad endpoint {:?}: {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn headers<'a>(&'a self, token: &'a str) -> [(&'a str, &'a str); 4] {
        [
            ("Accept", "application/json"),
            ("X-Plex-Token", token),
            ("X-Plex-Client-Identifier", self.options.client_identifier.as_str()),
            ("X-Plex-Product", PRODUCT),
        ]
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T, LibraryError> {
        let url = self.endpoint(path, query)?;
        let resp = http::request(Method::Get, &url, &self.headers(&self.token))?;
        if !resp.is_success() {
            return Err(http::status_error(resp.code, what));
        }
        parse::decode(&resp.body, what)
    }

    fn playlists(&self) -> Result<Vec<parse::PlaylistEntry>, LibraryError> {
        let list: Envelope<PlaylistList> = self.get_json("/playlists", &[], "playlists")?;
        Ok(list.media_container.metadata)
    }
}

impl LibraryClient for PlexClient {
    fn switch_account(&self, account: &str) -> Result<Self, LibraryError> {
        home::switch_account(self, account)
    }

    fn collections(&self) -> Result<Vec<CollectionInfo>, LibraryError> {
        Ok(self.playlists()?.iter().map(CollectionInfo::from).collect())
    }

    fn collection(&self, name: &str) -> Result<Collection, LibraryError> {
        let playlists = self.playlists()?;
        let entry = playlists
            .iter()
            .find(|p| p.title == name)
            .ok_or_else(|| LibraryError::NotFound(format!("playlist {:?}", name)))?;

        let path = format!("/playlists/{}/items", entry.rating_key);
        let list: Envelope<ItemList> = self.get_json(&path, &[], "playlist items")?;
        let items = list
            .media_container
            .metadata
            .iter()
            .enumerate()
            .map(|(i, item)| parse::asset_from_item(i, item))
            .collect::<Vec<_>>();
        tracing::debug!(playlist = %entry.title, items = items.len(), "loaded playlist");

        Ok(Collection {
            title: entry.title.clone(),
            items,
        })
    }

    fn fetch_asset(
        &self,
        asset: &AssetDescriptor,
        temp_dir: &Path,
    ) -> Result<PathBuf, LibraryError> {
        let locator = asset
            .locator
            .as_ref()
            .ok_or_else(|| LibraryError::Fetch("no downloadable media part".to_string()))?;

        let dest = temp_dir.join(staged_file_name(asset.ordinal, locator));

        let url = self.endpoint(&locator.key, &[("download", "1")])?;
        let bytes = http::download_to_file(&url, &self.headers(&self.token), &dest)?;
        tracing::debug!(title = %asset.title, bytes, path = %dest.display(), "fetched asset");
        Ok(dest)
    }
}

/// Name of the fetched file inside the staging dir: the server file name, else
/// the last segment of the part key, else `asset-<ordinal>`. Never empty.
fn staged_file_name(ordinal: usize, locator: &AssetLocator) -> String {
    locator
        .file_name
        .as_deref()
        .map(sanitize_component)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            locator
                .key
                .rsplit('/')
                .next()
                .map(sanitize_component)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| format!("asset-{}", ordinal))
}
