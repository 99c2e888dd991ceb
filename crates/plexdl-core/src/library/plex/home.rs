//! Managed (home) account switching through plex.tv.
//!
//! Finds the home user by title or username, switches to obtain that user's
//! token, then looks up the access token the user has for this server.

use url::Url;

use crate::error::LibraryError;

use super::http::{self, Method};
use super::parse::{self, HomeUsers, Resource, SwitchedUser};
use super::PlexClient;

fn plex_tv(client: &PlexClient, path: &str) -> Result<Url, LibraryError> {
    let raw = format!(
        "{}{}",
        client.options.plex_tv_url.trim_end_matches('/'),
        path
    );
    Url::parse(&raw).map_err(|e| LibraryError::Protocol(format!("bad plex.tv URL: {}", e)))
}

fn call<T: serde::de::DeserializeOwned>(
    client: &PlexClient,
    method: Method,
    url: &Url,
    token: &str,
    what: &str,
) -> Result<T, LibraryError> {
    let resp = http::request(method, url, &client.headers(token))?;
    if !resp.is_success() {
        return Err(http::status_error(resp.code, what));
    }
    parse::decode(&resp.body, what)
}

pub(super) fn switch_account(client: &PlexClient, account: &str) -> Result<PlexClient, LibraryError> {
    let users: HomeUsers = call(
        client,
        Method::Get,
        &plex_tv(client, "/api/v2/home/users")?,
        &client.token,
        "home users",
    )?;
    let user = users
        .users
        .iter()
        .find(|u| u.matches(account))
        .ok_or_else(|| LibraryError::NotFound(format!("managed account {:?}", account)))?;

    let switch_path = format!("/api/v2/home/users/{}/switch", user.uuid);
    let switched: SwitchedUser = call(
        client,
        Method::Post,
        &plex_tv(client, &switch_path)?,
        &client.token,
        "switch account",
    )?;

    let mut resources_url = plex_tv(client, "/api/v2/resources")?;
    resources_url
        .query_pairs_mut()
        .append_pair("includeHttps", "1");
    let resources: Vec<Resource> = call(
        client,
        Method::Get,
        &resources_url,
        &switched.auth_token,
        "resources",
    )?;
    let access_token = resources
        .into_iter()
        .find(|r| r.client_identifier == client.machine_identifier)
        .and_then(|r| r.access_token)
        .ok_or_else(|| {
            LibraryError::Auth(format!("account {:?} has no access to this server", account))
        })?;

    tracing::info!(account, "switched plex account");
    PlexClient::connect_with_options(client.base.as_str(), &access_token, client.options.clone())
}
