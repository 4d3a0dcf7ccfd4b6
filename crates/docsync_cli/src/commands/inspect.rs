//! Inspect command implementation.

use super::{open_local, CommandResult};
use crate::config::Settings;
use docsync_core::CollectionName;
use docsync_sync::SyncCoordinator;
use serde::Serialize;
use std::collections::BTreeMap;

/// Local store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data directory.
    pub path: String,
    /// Namespace key inside the store.
    pub namespace: String,
    /// Storage names present in the namespace.
    pub stored_names: Vec<String>,
    /// Record count per collection.
    pub collections: BTreeMap<String, usize>,
    /// Last issued number per sequence key.
    pub counters: BTreeMap<String, u64>,
    /// Seller name.
    pub seller: String,
}

/// Runs the inspect command.
pub async fn run(settings: &Settings, format: &str) -> CommandResult {
    let backend = open_local(settings)?;
    let namespace = backend.namespace().to_string();
    let stored_names = backend.names();

    let mut coordinator = SyncCoordinator::new(settings.sync.clone(), backend);
    coordinator.hydrate().await?;

    let result = InspectResult {
        path: settings.data_dir.display().to_string(),
        namespace,
        stored_names,
        collections: CollectionName::ALL
            .into_iter()
            .map(|name| (name.to_string(), coordinator.collection(name).len()))
            .collect(),
        counters: coordinator
            .counters()
            .iter()
            .map(|(key, last)| (key.to_string(), last))
            .collect(),
        seller: coordinator.seller().name.clone(),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Local store at {} (namespace {})", result.path, result.namespace);
    println!();
    println!("Collections:");
    for (name, count) in &result.collections {
        println!("  {name:<16} {count:>6} records");
    }
    println!();
    println!("Counters:");
    for (key, last) in &result.counters {
        println!("  {key:<16} {last:>6}");
    }
    println!();
    println!("Seller: {}", result.seller);
}
