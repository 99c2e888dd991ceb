//! `plexdl list` – show the playlists on the server.

use anyhow::{Context, Result};
use plexdl_core::library::LibraryClient;
use std::io::Write;

use super::{connect, ServerSettings};
use crate::cli::console::outcome_suffix;

pub async fn run_list(server: &ServerSettings) -> Result<()> {
    let mut client = connect(server, None).await?;
    if let Some(user) = &server.switch_user {
        print!("Switching to managed account {}...", user);
        let _ = std::io::stdout().flush();
        let target = user.clone();
        let base = client.clone();
        let switched = tokio::task::spawn_blocking(move || base.switch_account(&target))
            .await
            .context("switch task panicked")?;
        println!("{}", outcome_suffix(switched.is_ok()));
        client = switched
            .with_context(|| format!("could not switch to managed account {:?}", user))?;
    }

    let playlists = tokio::task::spawn_blocking(move || client.collections())
        .await
        .context("list task panicked")?
        .context("failed to list playlists")?;

    if playlists.is_empty() {
        println!("No playlists on server.");
    } else {
        println!("{:<8} {}", "ITEMS", "TITLE");
        for p in playlists {
            println!("{:<8} {}", p.item_count, p.title);
        }
    }
    Ok(())
}
