//! CLI command handlers, one file per subcommand.

mod completions;
mod download;
mod list;

use anyhow::{Context, Result};
use plexdl_core::library::plex::{PlexClient, PlexOptions};
use plexdl_core::run_log::RunLog;
use std::io::Write;

use crate::cli::console::outcome_suffix;

pub use completions::run_completions;
pub use download::{run_download, DownloadOptions};
pub use list::run_list;

/// Connection settings after merging CLI flags over config.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub token: String,
    pub switch_user: Option<String>,
    pub options: PlexOptions,
}

/// Connects to the server off the async runtime, printing progress the way
/// the interactive flow expects ("Connecting to plex... done"). Both outcomes
/// go to `log` when one is given.
pub(crate) async fn connect(server: &ServerSettings, log: Option<&RunLog>) -> Result<PlexClient> {
    print!("Connecting to plex...");
    let _ = std::io::stdout().flush();

    let (host, token, options) = (
        server.host.clone(),
        server.token.clone(),
        server.options.clone(),
    );
    let result = tokio::task::spawn_blocking(move || {
        PlexClient::connect_with_options(&host, &token, options)
    })
    .await
    .context("connect task panicked")?;

    println!("{}", outcome_suffix(result.is_ok()));
    match result {
        Ok(client) => {
            tracing::info!(host = %server.host, "connected to Plex server");
            if let Some(log) = log {
                log.info(format!("Connected to Plex server {}", server.host));
            }
            Ok(client)
        }
        Err(e) => {
            tracing::error!(host = %server.host, "failed to connect to Plex server: {}", e);
            if let Some(log) = log {
                log.error(format!("Failed to connect to Plex server {}: {}", server.host, e));
            }
            Err(e).with_context(|| format!("could not connect to {}", server.host))
        }
    }
}
