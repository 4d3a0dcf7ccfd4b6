//! Remote store commands: status, pull and compaction.

use super::{open_local, remote_backend, CommandResult};
use crate::config::Settings;
use docsync_core::{merge_counter_maps, CollectionName, COUNTERS_FILE, SELLER_FILE};
use docsync_storage::{CompactTarget, CompactionReport, LocalBackend, RemoteBackend, StoreBackend};
use docsync_sync::{SyncConfig, SyncCoordinator, SyncResult};
use serde_json::Value;
use tracing::info;

/// Replica count for one storage name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaStatus {
    /// Storage name.
    pub name: String,
    /// Number of live replicas.
    pub replicas: usize,
}

/// Counts the replicas of every storage name.
pub async fn replica_status(backend: &mut RemoteBackend) -> SyncResult<Vec<ReplicaStatus>> {
    backend.init().await?;
    let names = CollectionName::ALL
        .into_iter()
        .map(|name| name.file_name())
        .chain([COUNTERS_FILE, SELLER_FILE]);

    let mut status = Vec::new();
    for name in names {
        let replicas = backend.list_replicas(name).await?.len();
        status.push(ReplicaStatus {
            name: name.to_string(),
            replicas,
        });
    }
    Ok(status)
}

/// Runs `remote status`.
pub async fn status(settings: &Settings) -> CommandResult {
    let mut backend = remote_backend(settings);
    let status = replica_status(&mut backend).await?;

    println!("Remote folder {}/data", settings.sync.app_folder_name);
    println!();
    for entry in &status {
        let note = if entry.replicas > 1 {
            format!("  ({} duplicates)", entry.replicas - 1)
        } else {
            String::new()
        };
        println!("  {:<18} {:>3} replicas{note}", entry.name, entry.replicas);
    }
    if status.iter().any(|entry| entry.replicas > 1) {
        println!();
        println!("Duplicates are merged on every read. Run `remote compact` to remove them.");
    }
    Ok(())
}

/// What a pull copied into the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullSummary {
    /// Records copied per collection.
    pub records: Vec<(CollectionName, usize)>,
    /// Keys in the stored numbering table.
    pub counter_keys: usize,
}

/// Hydrates from `remote` and writes the merged snapshot into `local`.
///
/// Collections and the seller profile are replaced; the numbering table is
/// max-merged with the local one so no local counter goes backwards.
pub async fn pull_into(
    config: &SyncConfig,
    remote: RemoteBackend,
    local: LocalBackend,
) -> SyncResult<PullSummary> {
    let mut source = SyncCoordinator::new(config.clone(), remote);
    source.hydrate().await?;

    let mut target = SyncCoordinator::new(config.clone(), local);
    target.hydrate().await?;

    let mut records = Vec::new();
    for name in CollectionName::ALL {
        let items = source.collection(name).to_vec();
        records.push((name, items.len()));
        target.replace_collection(name, items).await?;
    }

    let counters = merge_counter_maps([source.counters(), target.counters()]);
    let counter_keys = counters.len();
    target.replace_counters(counters).await?;

    let profile = serde_json::to_value(source.seller()).map_err(docsync_core::CoreError::from)?;
    if let Value::Object(profile) = profile {
        target.update_seller(&profile).await?;
    }

    info!(counter_keys, "pulled remote snapshot into local store");
    Ok(PullSummary {
        records,
        counter_keys,
    })
}

/// Runs `remote pull`.
pub async fn pull(settings: &Settings) -> CommandResult {
    let local = open_local(settings)?;
    let summary = pull_into(&settings.sync, remote_backend(settings), local).await?;

    println!("Pulled into {}:", settings.data_dir.display());
    for (name, count) in &summary.records {
        println!("  {:<16} {count:>6} records", name.to_string());
    }
    println!("  {:<16} {:>6} keys", "counters", summary.counter_keys);
    Ok(())
}

/// Plans or performs a compaction.
pub async fn compact_target(
    backend: &mut RemoteBackend,
    target: CompactTarget,
    dry_run: bool,
) -> SyncResult<CompactionReport> {
    backend.init().await?;
    let report = if dry_run {
        backend.plan_compaction(target).await?
    } else {
        backend.compact(target).await?
    };
    Ok(report)
}

/// Runs `remote compact`.
pub async fn compact(settings: &Settings, name: &str, dry_run: bool) -> CommandResult {
    let target: CompactTarget = name.parse()?;
    let mut backend = remote_backend(settings);
    let report = compact_target(&mut backend, target, dry_run).await?;

    println!("Compacting {} ({})", report.name, target);
    if report.dry_run {
        println!("(dry run - no changes will be made)");
    }
    match &report.primary {
        Some(primary) => println!("  Primary replica: {primary}"),
        None => println!("  No replicas found"),
    }
    println!("  Merged entries:  {}", report.entries);
    println!(
        "  Replicas {}: {}",
        if report.dry_run { "to trash" } else { "trashed" },
        report.trashed.len()
    );
    for id in &report.trashed {
        println!("    {id}");
    }
    if !report.skipped.is_empty() {
        println!("  Malformed replicas left in place: {}", report.skipped.len());
        for id in &report.skipped {
            println!("    {id}");
        }
    }
    Ok(())
}
