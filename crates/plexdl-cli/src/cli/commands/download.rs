//! `plexdl download` – fetch every item of a playlist into a local directory.

use anyhow::{Context, Result};
use plexdl_core::config::PlexdlConfig;
use plexdl_core::coordinator::{BatchCoordinator, RunRequest};
use plexdl_core::naming::{CollisionPolicy, NamingMode};
use plexdl_core::run_log::RunLog;
use std::path::PathBuf;
use std::sync::Arc;

use super::{connect, ServerSettings};
use crate::cli::console;

/// `download` flags; `None` means "use the config value".
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub playlist: Option<String>,
    pub order_by: Option<String>,
    pub save_to: Option<PathBuf>,
    pub original_filenames: bool,
    pub max_threads: Option<usize>,
    pub collisions: Option<CollisionPolicy>,
    pub yes: bool,
}

impl DownloadOptions {
    /// Builds the run request: config first, then flags on top.
    pub fn to_request(&self, server: &ServerSettings, cfg: &PlexdlConfig) -> Result<RunRequest> {
        let playlist = self
            .playlist
            .clone()
            .or_else(|| cfg.plex.playlist.clone())
            .context("no playlist given: pass --playlist or set plex.playlist in config")?;

        let mut req = RunRequest::from_config(playlist, cfg);
        req.base_dir = std::env::current_dir().context("failed to read current directory")?;
        req.switch_account = server.switch_user.clone();
        if let Some(dir) = &self.save_to {
            req.save_to = Some(dir.clone());
        }
        req.order_by = self.order_by.clone();
        if self.original_filenames {
            req.naming = NamingMode::Original;
        }
        if let Some(n) = self.max_threads {
            req.max_concurrency = n;
        }
        if let Some(policy) = self.collisions {
            req.collisions = policy;
        }
        req.confirmed = self.yes;
        Ok(req)
    }
}

pub async fn run_download(
    server: &ServerSettings,
    cfg: &PlexdlConfig,
    opts: DownloadOptions,
) -> Result<()> {
    let request = opts.to_request(server, cfg)?;
    let log = RunLog::open(&cfg.download.run_log).with_context(|| {
        format!("failed to open run log {}", cfg.download.run_log.display())
    })?;
    let log = Arc::new(log);

    let client = connect(server, Some(log.as_ref())).await?;

    let mut coordinator = BatchCoordinator::new(Arc::new(client), Arc::clone(&log))
        .with_progress(Arc::new(console::ConsoleProgress));
    let summary = coordinator
        .run(&request, &console::ConsoleConfirm)
        .await
        .with_context(|| format!("download of playlist {:?} failed", request.collection))?;

    let Some(summary) = summary else {
        println!("Download cancelled.");
        return Ok(());
    };

    console::print_summary(&summary);

    if !opts.yes && console::ask_yes_no("Would you like to review the log file?") {
        let text = log
            .read_to_string()
            .with_context(|| format!("failed to read {}", log.path().display()))?;
        println!("{}", text);
    }
    Ok(())
}
