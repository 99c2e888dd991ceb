//! Minimal HTTP/1.1 server emulating the Plex endpoints the client uses.
//!
//! Serves one playlist ("Road Trip", two tracks; the second track's media
//! part is missing) and the plex.tv home-user endpoints for account switching.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const SERVER_TOKEN: &str = "good-token";
pub const KIDS_USER_TOKEN: &str = "kids-user-token";
pub const KIDS_SERVER_TOKEN: &str = "kids-server-token";
pub const MACHINE_ID: &str = "machine-1";
pub const TRACK_A_BODY: &[u8] = b"ID3-track-a-bytes";
pub const FOREIGN_BODY: &[u8] = b"bytes-from-another-host";

/// Part that redirects to track A on the same server.
pub const LOCAL_REDIRECT_PART: &str = "/library/parts/4/1700000000/file.mp3";
/// Part that redirects to the host given to [`start_redirecting_to`].
pub const FOREIGN_REDIRECT_PART: &str = "/library/parts/3/1700000000/file.mp3";

/// Starts the server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345"). The server runs until the process exits.
pub fn start() -> String {
    start_with(None)
}

/// Like [`start`], with [`FOREIGN_REDIRECT_PART`] redirecting to `foreign`.
pub fn start_redirecting_to(foreign: &str) -> String {
    start_with(Some(foreign.to_string()))
}

fn start_with(foreign: Option<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let foreign = Arc::new(foreign);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let foreign = Arc::clone(&foreign);
            thread::spawn(move || handle(stream, foreign.as_deref()));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

/// Tokens (`None` when the header was absent) seen by a recorder server.
pub type SeenTokens = Arc<Mutex<Vec<Option<String>>>>;

/// Server that answers every request with [`FOREIGN_BODY`] and records the
/// `X-Plex-Token` it received.
pub fn start_token_recorder() -> (String, SeenTokens) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let seen: SeenTokens = Arc::default();
    let recorded = Arc::clone(&seen);
    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            if let Some(req) = read_request(&mut stream) {
                recorded.lock().unwrap().push(req.token);
                respond(&mut stream, 200, "audio/mpeg", FOREIGN_BODY);
            }
        }
    });
    (format!("http://127.0.0.1:{}", port), seen)
}

struct Request {
    method: String,
    path: String,
    query: String,
    token: Option<String>,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
    let text = String::from_utf8_lossy(&data);
    let mut lines = text.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?;
    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (target.to_string(), String::new()),
    };
    let token = lines.find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case("x-plex-token")
            .then(|| value.trim().to_string())
    });
    Some(Request {
        method,
        path,
        query,
        token,
    })
}

fn redirect(stream: &mut TcpStream, location: &str) {
    let head = format!(
        "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        location
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.flush();
}

fn respond(stream: &mut TcpStream, code: u32, content_type: &str, body: &[u8]) {
    let reason = match code {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        _ => "Error",
    };
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        code,
        reason,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn json(stream: &mut TcpStream, body: &str) {
    respond(stream, 200, "application/json", body.as_bytes());
}

const PLAYLISTS: &str = r#"{"MediaContainer": {"size": 1, "Metadata": [
    {"ratingKey": "7", "title": "Road Trip", "leafCount": 2, "playlistType": "audio"}
]}}"#;

const ITEMS: &str = r#"{"MediaContainer": {"size": 2, "Metadata": [
    {"ratingKey": "101", "title": "Song A", "index": 2, "addedAt": 1700000200,
     "Media": [{"container": "mp3", "Part": [
        {"key": "/library/parts/1/1700000000/file.mp3", "file": "/music/Band/01 Song A.mp3"}
     ]}]},
    {"ratingKey": "102", "title": "Song B", "index": 1, "addedAt": 1700000100,
     "Media": [{"container": "flac", "Part": [
        {"key": "/library/parts/2/1700000000/file.flac", "file": "/music/Band/02 Song B.flac"}
     ]}]}
]}}"#;

fn handle(mut stream: TcpStream, foreign: Option<&str>) {
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    let token = req.token.as_deref().unwrap_or("");

    // plex.tv account endpoints
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/api/v2/home/users") if token == SERVER_TOKEN => {
            return json(
                &mut stream,
                r#"{"id": 1, "users": [
                    {"uuid": "u-admin", "title": "Admin", "username": "admin"},
                    {"uuid": "u-kids", "title": "Kids"}
                ]}"#,
            );
        }
        ("POST", "/api/v2/home/users/u-kids/switch") if token == SERVER_TOKEN => {
            return json(&mut stream, &format!(r#"{{"authToken": "{}"}}"#, KIDS_USER_TOKEN));
        }
        ("GET", "/api/v2/resources")
            if token == KIDS_USER_TOKEN && req.query.contains("includeHttps=1") =>
        {
            return json(
                &mut stream,
                &format!(
                    r#"[{{"clientIdentifier": "other"}},
                        {{"clientIdentifier": "{}", "accessToken": "{}"}}]"#,
                    MACHINE_ID, KIDS_SERVER_TOKEN
                ),
            );
        }
        _ => {}
    }

    if token != SERVER_TOKEN && token != KIDS_SERVER_TOKEN {
        return respond(&mut stream, 401, "text/html", b"<html>Unauthorized</html>");
    }

    match req.path.as_str() {
        "/" => json(
            &mut stream,
            &format!(
                r#"{{"MediaContainer": {{"machineIdentifier": "{}", "friendlyName": "Test Server"}}}}"#,
                MACHINE_ID
            ),
        ),
        "/playlists" => json(&mut stream, PLAYLISTS),
        "/playlists/7/items" => json(&mut stream, ITEMS),
        "/library/parts/1/1700000000/file.mp3" if req.query.contains("download=1") => {
            respond(&mut stream, 200, "audio/mpeg", TRACK_A_BODY)
        }
        LOCAL_REDIRECT_PART => redirect(
            &mut stream,
            "/library/parts/1/1700000000/file.mp3?download=1",
        ),
        FOREIGN_REDIRECT_PART if foreign.is_some() => redirect(
            &mut stream,
            &format!("{}/cdn/file.mp3", foreign.unwrap_or_default()),
        ),
        _ => respond(&mut stream, 404, "text/html", b"<html>Not Found</html>"),
    }
}
