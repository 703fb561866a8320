use anyhow::{Context, Result};
use factgraph_core::{Fact, FactBatch, ObjectKind, Process, ProcessMeta, Uid, ROOT_PID};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Reads a sandbox export: a JSON array of facts.
pub fn read_facts(path: &Path) -> Result<Vec<Fact>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading export {}", path.display()))?;
    let facts: Vec<Fact> =
        serde_json::from_str(&raw).with_context(|| format!("parsing export {}", path.display()))?;
    Ok(facts)
}

/// Sorts a flat fact list into the per-category shape the model consumes.
pub fn batch_facts(facts: Vec<Fact>) -> FactBatch {
    let mut batch = FactBatch::default();
    for fact in facts {
        batch.push(fact.kind, fact);
    }
    batch
}

/// Derives process records from the facts themselves. The root is whichever
/// process endpoint carries the sentinel pid; every process named as a
/// destination becomes a child of the fact's source. Repeat sightings merge
/// metadata without overwriting, and first-sighting order is kept.
pub fn processes_from_facts(facts: &[Fact]) -> Vec<Process> {
    let mut records: HashMap<Uid, Process> = HashMap::new();
    let mut order: Vec<Uid> = Vec::new();

    for fact in facts {
        if fact.source_object_type == Some(ObjectKind::Process) {
            if let (Some(uid), Some(value)) = (
                fact.source_object_uid.as_deref(),
                fact.source_object_value.as_deref(),
            ) {
                if value == ROOT_PID {
                    let record = Process {
                        uid: Uid::new(uid),
                        parent_uid: None,
                        pid: Some(value.to_string()),
                        parent_pid: None,
                        metadata: ProcessMeta::default(),
                    };
                    upsert(&mut records, &mut order, record);
                }
            }
        }

        if fact.destination_object_type == Some(ObjectKind::Process) {
            let Some(uid) = fact.destination_object_uid.as_deref() else {
                tracing::warn!("process fact missing destination uid, skipping");
                continue;
            };
            let record = Process {
                uid: Uid::new(uid),
                parent_uid: fact.source_object_uid.as_deref().map(Uid::new),
                pid: fact.destination_object_value.clone(),
                parent_pid: fact.source_object_value.clone(),
                metadata: ProcessMeta {
                    process_name: fact.meta.process_name.clone(),
                    timestamp: fact.meta.timestamp,
                    extra: Default::default(),
                },
            };
            upsert(&mut records, &mut order, record);
        }
    }

    order
        .into_iter()
        .filter_map(|uid| records.remove(&uid))
        .collect()
}

fn upsert(records: &mut HashMap<Uid, Process>, order: &mut Vec<Uid>, record: Process) {
    match records.entry(record.uid.clone()) {
        Entry::Occupied(mut entry) => {
            let existing = entry.get_mut();
            existing.metadata.merge(&record.metadata);
            if existing.parent_uid.is_none() {
                existing.parent_uid = record.parent_uid;
            }
            if existing.parent_pid.is_none() {
                existing.parent_pid = record.parent_pid;
            }
            if existing.pid.is_none() {
                existing.pid = record.pid;
            }
        }
        Entry::Vacant(entry) => {
            order.push(record.uid.clone());
            entry.insert(record);
        }
    }
}
