//! CLI for plexdl.

mod commands;
mod console;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use plexdl_core::config::{self, PlexdlConfig};
use plexdl_core::library::plex::PlexOptions;
use plexdl_core::naming::CollisionPolicy;
use std::path::PathBuf;

use commands::{run_completions, run_download, run_list, DownloadOptions, ServerSettings};

/// Top-level CLI for plexdl.
#[derive(Debug, Parser)]
#[command(name = "plexdl")]
#[command(about = "plexdl: download Plex playlists into local files", long_about = None)]
pub struct Cli {
    /// URL of the Plex server, e.g. http://192.168.0.100:32400.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Token used to authenticate with the Plex server.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Managed account to switch to upon connect.
    #[arg(short = 'u', long, global = true, value_name = "USER")]
    pub switch_user: Option<String>,

    /// Read configuration from this file instead of ~/.config/plexdl/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every item of a playlist.
    Download {
        /// Playlist name (defaults to `playlist` in config).
        #[arg(short, long)]
        playlist: Option<String>,

        /// Property to sort the playlist by (e.g. addedAt, year, title). Default: playlist order.
        #[arg(long, value_name = "PROPERTY")]
        order_by: Option<String>,

        /// Directory to save the files to (default: the playlist title).
        #[arg(long, value_name = "DIR")]
        save_to: Option<PathBuf>,

        /// Keep the original server-side filenames.
        #[arg(long)]
        original_filenames: bool,

        /// Maximum number of concurrent downloads.
        #[arg(long, value_name = "N")]
        max_threads: Option<usize>,

        /// What to do when items share a filename: overwrite, strict or suffix.
        #[arg(long, value_name = "POLICY")]
        collisions: Option<CollisionPolicy>,

        /// Do not prompt: start downloading right away and skip the log review.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List the playlists available on the server.
    List,

    /// Print shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

impl Cli {
    fn server_settings(&self, cfg: &PlexdlConfig, config_hint: &str) -> Result<ServerSettings> {
        let host = self
            .host
            .clone()
            .or_else(|| cfg.plex.host.clone())
            .with_context(|| format!("no Plex host: pass --host or set plex.host in {}", config_hint))?;
        let token = self
            .token
            .clone()
            .or_else(|| cfg.plex.token.clone())
            .with_context(|| format!("no Plex token: pass --token or set plex.token in {}", config_hint))?;
        Ok(ServerSettings {
            host,
            token,
            switch_user: self.switch_user.clone().or_else(|| cfg.plex.switch_user.clone()),
            options: PlexOptions {
                client_identifier: cfg.plex.client_identifier.clone(),
                ..PlexOptions::default()
            },
        })
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if let CliCommand::Completions { shell } = cli.command {
            return run_completions(shell);
        }

        let (cfg, config_hint) = match &cli.config {
            Some(path) => (config::load_from_path(path)?, path.display().to_string()),
            None => (
                config::load_or_init()?,
                config::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.toml".to_string()),
            ),
        };
        tracing::debug!(config = %config_hint, "loaded config");
        let server = cli.server_settings(&cfg, &config_hint)?;

        match cli.command {
            CliCommand::Download {
                playlist,
                order_by,
                save_to,
                original_filenames,
                max_threads,
                collisions,
                yes,
            } => {
                let opts = DownloadOptions {
                    playlist,
                    order_by,
                    save_to,
                    original_filenames,
                    max_threads,
                    collisions,
                    yes,
                };
                run_download(&server, &cfg, opts).await?;
            }
            CliCommand::List => run_list(&server).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
