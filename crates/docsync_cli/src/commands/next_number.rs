//! Next-number command implementation.

use super::{open_local, CommandResult};
use crate::config::Settings;
use docsync_core::{allocate, parse_document_date};
use docsync_sync::SyncCoordinator;

/// Runs the next-number command against the local store.
pub async fn run(settings: &Settings, series: &str, date: &str, dry_run: bool) -> CommandResult {
    let date = parse_document_date(date)?;
    let mut coordinator = SyncCoordinator::new(settings.sync.clone(), open_local(settings)?);
    coordinator.hydrate().await?;

    let allocation = if dry_run {
        allocate(coordinator.counters(), series, date)?
    } else {
        coordinator.next_number(series, date).await?
    };

    println!("{} #{}", allocation.key, allocation.number);
    if dry_run {
        println!("(dry run - nothing was persisted)");
    }
    Ok(())
}
