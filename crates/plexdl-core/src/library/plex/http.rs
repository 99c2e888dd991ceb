//! Blocking HTTP over libcurl for the Plex client.
//!
//! Runs in the current thread; callers in async code go through `spawn_blocking`.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::LibraryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Method {
    Get,
    Post,
}

pub(super) struct HttpResponse {
    pub code: u32,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Map a non-2xx status to the library error taxonomy.
pub(super) fn status_error(code: u32, what: &str) -> LibraryError {
    match code {
        401 | 403 => LibraryError::Auth(format!("{} returned HTTP {}", what, code)),
        404 => LibraryError::NotFound(what.to_string()),
        _ => LibraryError::Connection(format!("{} returned HTTP {}", what, code)),
    }
}

fn curl_err(e: curl::Error) -> LibraryError {
    LibraryError::Connection(e.to_string())
}

const MAX_REDIRECTS: usize = 10;

/// Header that carries credentials; only ever sent to the origin first asked.
const TOKEN_HEADER: &str = "X-Plex-Token";

/// Headers for one hop of a redirect chain that started at `origin`.
fn hop_headers<'a>(origin: &Url, hop: &Url, headers: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    if origin.origin() == hop.origin() {
        headers.to_vec()
    } else {
        headers
            .iter()
            .copied()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(TOKEN_HEADER))
            .collect()
    }
}

/// Target of a 3xx response, resolved against the URL that was requested.
fn redirect_target(
    easy: &mut curl::easy::Easy,
    code: u32,
    current: &Url,
) -> Result<Option<Url>, curl::Error> {
    if !(300..400).contains(&code) {
        return Ok(None);
    }
    Ok(easy
        .redirect_url()?
        .and_then(|location| current.join(location).ok()))
}

fn prepare(url: &Url, headers: &[(&str, &str)]) -> Result<curl::easy::Easy, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url.as_str())?;
    // Redirects are followed by hand so the token never leaves its origin.
    easy.follow_location(false)?;
    easy.connect_timeout(Duration::from_secs(15))?;

    let mut list = curl::easy::List::new();
    for (k, v) in headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !headers.is_empty() {
        easy.http_headers(list)?;
    }
    Ok(easy)
}

/// Performs a small API request and buffers the body in memory.
pub(super) fn request(
    method: Method,
    url: &Url,
    headers: &[(&str, &str)],
) -> Result<HttpResponse, LibraryError> {
    let mut current = url.clone();
    for _ in 0..=MAX_REDIRECTS {
        let (resp, next) = request_once(method, &current, &hop_headers(url, &current, headers))?;
        match next {
            Some(next) => current = next,
            None => return Ok(resp),
        }
    }
    Err(LibraryError::Connection(format!("too many redirects from {}", url.path())))
}

fn request_once(
    method: Method,
    url: &Url,
    headers: &[(&str, &str)],
) -> Result<(HttpResponse, Option<Url>), LibraryError> {
    let mut body = Vec::new();
    let mut easy = prepare(url, headers).map_err(curl_err)?;
    easy.timeout(Duration::from_secs(60)).map_err(curl_err)?;
    if method == Method::Post {
        easy.post(true).map_err(curl_err)?;
        easy.post_fields_copy(b"").map_err(curl_err)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(curl_err)?;
        transfer.perform().map_err(curl_err)?;
    }

    let code = easy.response_code().map_err(curl_err)?;
    let next = redirect_target(&mut easy, code, url).map_err(curl_err)?;
    Ok((HttpResponse { code, body }, next))
}

enum Hop {
    Done(u64),
    Redirect(Url),
}

/// Streams the body of `url` into a new file at `dest`. Returns bytes written.
pub(super) fn download_to_file(
    url: &Url,
    headers: &[(&str, &str)],
    dest: &Path,
) -> Result<u64, LibraryError> {
    let mut current = url.clone();
    for _ in 0..=MAX_REDIRECTS {
        match download_once(&current, &hop_headers(url, &current, headers), dest)? {
            Hop::Done(written) => return Ok(written),
            Hop::Redirect(next) => current = next,
        }
    }
    Err(LibraryError::Fetch(format!("too many redirects from {}", url.path())))
}

/// One request of a download; `dest` is truncated on every hop.
fn download_once(url: &Url, headers: &[(&str, &str)], dest: &Path) -> Result<Hop, LibraryError> {
    let fetch_err = |e: curl::Error| LibraryError::Fetch(e.to_string());

    let file = File::create(dest)
        .map_err(|e| LibraryError::Fetch(format!("create {}: {}", dest.display(), e)))?;
    let mut writer = BufWriter::new(file);
    let mut written = 0u64;
    let mut write_error: Option<io::Error> = None;

    let mut easy = prepare(url, headers).map_err(fetch_err)?;
    easy.low_speed_limit(1024).map_err(fetch_err)?;
    easy.low_speed_time(Duration::from_secs(60)).map_err(fetch_err)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| match writer.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_error = Some(e);
                    Ok(0) // abort transfer
                }
            })
            .map_err(fetch_err)?;
        let performed = transfer.perform();
        drop(transfer);
        if let Some(e) = write_error.take() {
            return Err(LibraryError::Fetch(format!("write {}: {}", dest.display(), e)));
        }
        performed.map_err(fetch_err)?;
    }

    let code = easy.response_code().map_err(fetch_err)?;
    if let Some(next) = redirect_target(&mut easy, code, url).map_err(fetch_err)? {
        return Ok(Hop::Redirect(next));
    }
    if !(200..300).contains(&code) {
        return Err(LibraryError::Fetch(format!("GET {} returned HTTP {}", url.path(), code)));
    }

    writer
        .flush()
        .map_err(|e| LibraryError::Fetch(format!("flush {}: {}", dest.display(), e)))?;
    Ok(Hop::Done(written))
}
