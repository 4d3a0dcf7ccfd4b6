//! Merge engine for replicated collections and counter maps.
//!
//! Both merges are pure. Record merge is keyed by `id` with the last
//! occurrence winning; counter merge takes the maximum per key.

use crate::counter::CounterMap;
use crate::record::Record;
use serde_json::Value;
use std::collections::HashMap;

/// Merges record lists by id.
///
/// Lists are flattened in the given order. A later occurrence of an id
/// replaces the earlier one in place, so the output keeps first-seen
/// order. The id set of the result does not depend on argument order;
/// which record wins on a collision does (last list wins).
pub fn merge_records_by_id<I, L>(lists: I) -> Vec<Record>
where
    I: IntoIterator<Item = L>,
    L: IntoIterator<Item = Record>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<Record> = Vec::new();

    for record in lists.into_iter().flatten() {
        match index.get(record.id()) {
            Some(&position) => merged[position] = record,
            None => {
                index.insert(record.id().to_owned(), merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

/// Merges lists of raw JSON values by id, dropping values that are not records.
pub fn merge_values_by_id<I, L>(lists: I) -> Vec<Record>
where
    I: IntoIterator<Item = L>,
    L: IntoIterator<Item = Value>,
{
    merge_records_by_id(
        lists
            .into_iter()
            .map(|list| list.into_iter().filter_map(Record::from_value)),
    )
}

/// Deduplicates a single list of raw JSON values by id.
pub fn dedupe_by_id(values: impl IntoIterator<Item = Value>) -> Vec<Record> {
    merge_values_by_id([values])
}

/// Max-merges counter maps.
///
/// For every key present in any input, the result holds the largest
/// `last` seen. Commutative and idempotent. Returns an empty map when no
/// input has keys; callers supply their own default.
pub fn merge_counter_maps<'a, I>(maps: I) -> CounterMap
where
    I: IntoIterator<Item = &'a CounterMap>,
{
    let mut merged = CounterMap::new();
    for map in maps {
        for (key, last) in map.iter() {
            match merged.last(key) {
                Some(current) if current >= last => {}
                _ => merged.set(key, last),
            }
        }
    }
    merged
}

/// Overlays `incoming` onto `base`: incoming keys overwrite, others are kept.
#[must_use]
pub fn overlay_counter_map(base: &CounterMap, incoming: &CounterMap) -> CounterMap {
    let mut out = base.clone();
    for (key, last) in incoming.iter() {
        out.set(key, last);
    }
    out
}
