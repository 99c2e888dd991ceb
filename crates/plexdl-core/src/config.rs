use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::naming::CollisionPolicy;

/// Worker pool size when neither config nor CLI set one.
pub const DEFAULT_MAX_THREADS: usize = 4;

/// Connection and playlist defaults (`[plex]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlexConfig {
    /// Server base URL, e.g. `http://192.168.0.100:32400`.
    #[serde(default)]
    pub host: Option<String>,
    /// `X-Plex-Token` used to authenticate with the server.
    #[serde(default)]
    pub token: Option<String>,
    /// Playlist to download when none is given on the command line.
    #[serde(default)]
    pub playlist: Option<String>,
    /// Destination directory; defaults to the playlist title under the working directory.
    #[serde(default)]
    pub save_to: Option<PathBuf>,
    /// Maximum number of concurrent downloads.
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,
    /// Managed (home) user to switch to after connecting.
    #[serde(default)]
    pub switch_user: Option<String>,
    /// `X-Plex-Client-Identifier` sent to plex.tv.
    #[serde(default = "default_client_identifier")]
    pub client_identifier: String,
}

fn default_max_threads() -> usize {
    DEFAULT_MAX_THREADS
}

fn default_client_identifier() -> String {
    "plexdl".to_string()
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            host: None,
            token: None,
            playlist: None,
            save_to: None,
            max_threads: DEFAULT_MAX_THREADS,
            switch_user: None,
            client_identifier: default_client_identifier(),
        }
    }
}

/// Download behavior (`[download]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// What to do when two items resolve to the same filename.
    #[serde(default)]
    pub collisions: CollisionPolicy,
    /// Append-only audit log for each run (relative paths resolve against the working directory).
    #[serde(default = "default_run_log")]
    pub run_log: PathBuf,
}

fn default_run_log() -> PathBuf {
    PathBuf::from("plexdl.log")
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            collisions: CollisionPolicy::default(),
            run_log: default_run_log(),
        }
    }
}

/// Global configuration loaded from `~/.config/plexdl/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlexdlConfig {
    #[serde(default)]
    pub plex: PlexConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("plexdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PlexdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PlexdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit path (no file is created).
pub fn load_from_path(path: &Path) -> Result<PlexdlConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: PlexdlConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
