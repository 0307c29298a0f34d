//! CLI command implementations.

use chrono::{DateTime, Utc};
use colored::Colorize;
use quill_core::versions_newest_first;
use quill_server::{
    CursorTracker, ServerEvent, SyncClient, SyncServer, SyncServerConfig, SWEEP_INTERVAL,
};
use quill_store::{NoteService, NoteStore};
use std::path::Path;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn open_store(data_dir: Option<&Path>) -> Result<NoteStore> {
    let dir = match data_dir {
        Some(d) => d.to_path_buf(),
        None => dirs::data_dir()
            .ok_or("could not determine a data directory; pass --data-dir")?
            .join("quill"),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(NoteStore::open(dir.join("notes"))?)
}

/// Start the sync server.
pub async fn serve(port: u16, headless: bool, data_dir: Option<&Path>) -> Result<()> {
    let bind_addr = if headless { "0.0.0.0" } else { "127.0.0.1" };

    if headless {
        println!("{}", "Starting Quill server in headless mode...".cyan());
    } else {
        println!("{}", "Starting Quill server...".cyan());
    }

    let store = open_store(data_dir)?;
    let config = SyncServerConfig {
        addr: format!("{bind_addr}:{port}").parse()?,
    };

    println!(
        "{} Listening on {}",
        "✓".green(),
        format!("ws://{}", config.addr).cyan()
    );

    let server = SyncServer::new(NoteService::new(store), config);
    server.run().await.map_err(|e| -> Box<dyn std::error::Error> { e })?;
    Ok(())
}

/// Create a note.
pub fn create(title: Option<&str>, data_dir: Option<&Path>) -> Result<()> {
    let store = open_store(data_dir)?;
    let note = store.create(title)?;

    println!("{} Created \"{}\"", "✓".green(), note.title.cyan());
    println!("  id: {}", note.id.dimmed());
    Ok(())
}

/// List notes, most recently updated first.
pub fn list(json: bool, data_dir: Option<&Path>) -> Result<()> {
    let store = open_store(data_dir)?;
    let notes = store.list()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes yet. Run {} to start one.", "quill create".cyan());
        return Ok(());
    }

    for note in notes {
        println!(
            "  {} {} {}",
            note.title.cyan(),
            note.id.dimmed(),
            format!("(updated {})", note.updated_at.to_rfc3339()).dimmed()
        );
    }
    Ok(())
}

/// Show a note's current content.
pub fn show(id: &str, json: bool, data_dir: Option<&Path>) -> Result<()> {
    let store = open_store(data_dir)?;
    let note = store.get(id)?.ok_or_else(|| format!("Note not found: {id}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    println!("{}", note.title.cyan().bold());
    println!(
        "{}",
        format!(
            "updated {} · {} versions",
            note.updated_at.to_rfc3339(),
            note.versions.len()
        )
        .dimmed()
    );
    println!();
    println!("{}", note.content);
    Ok(())
}

/// List a note's versions, newest first.
pub fn versions(id: &str, data_dir: Option<&Path>) -> Result<()> {
    let store = open_store(data_dir)?;
    let note = store.get(id)?.ok_or_else(|| format!("Note not found: {id}"))?;

    let versions = versions_newest_first(&note);
    if versions.is_empty() {
        println!("No versions saved yet.");
        return Ok(());
    }

    for version in versions {
        let preview: String = version.content.chars().take(48).collect();
        let preview = preview.replace('\n', " ");
        println!(
            "  {} {}",
            version.timestamp.to_rfc3339().cyan(),
            preview.dimmed()
        );
    }
    Ok(())
}

/// Restore a note to the version saved at the given timestamp.
pub async fn restore(id: &str, timestamp: &str, data_dir: Option<&Path>) -> Result<()> {
    let target: DateTime<Utc> = DateTime::parse_from_rfc3339(timestamp)?.with_timezone(&Utc);

    let store = open_store(data_dir)?;
    let service = NoteService::new(store);
    let note = service.restore(id, target).await?;

    println!(
        "{} Restored \"{}\" to {}",
        "✓".green(),
        note.title.cyan(),
        timestamp
    );
    Ok(())
}

/// Follow a note's live edits from a running server.
pub async fn watch(id: &str, url: &str) -> Result<()> {
    let mut client = SyncClient::connect(url).await?;
    client.join(id).await?;

    println!("{} Watching note {}", "✓".green(), id.cyan());

    let mut cursors = CursorTracker::new();
    let mut sweep = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            event = client.next_event() => {
                match event? {
                    Some(ServerEvent::ActiveUsers(count)) => {
                        println!("{} {} active", "●".green(), count);
                    }
                    Some(ServerEvent::NoteUpdate(content)) => {
                        println!("{}", "── update ──".dimmed());
                        println!("{content}");
                    }
                    Some(ServerEvent::CursorPosition { user_id, cursor }) => {
                        cursors.record(user_id, cursor);
                        let short: String = user_id.to_string().chars().take(8).collect();
                        println!("{}", format!("  {short} @ {cursor}").dimmed());
                    }
                    Some(_) => {}
                    None => {
                        println!("Server closed the connection");
                        break;
                    }
                }
            }
            _ = sweep.tick() => {
                // peers that went quiet fall off the list
                if cursors.sweep() > 0 {
                    println!("{}", format!("  {} cursors visible", cursors.len()).dimmed());
                }
            }
        }
    }
    Ok(())
}
