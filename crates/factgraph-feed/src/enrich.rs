use anyhow::Result;
use chrono::{DateTime, Utc};
use factgraph_core::{FactBatch, InteractionCounts, Uid};
use factgraph_model::Session;
use futures_util::future;
use std::time::Duration;

/// Backend pacing: how many per-process fact fetches fly at once, and how
/// long to wait between waves.
#[derive(Debug, Clone, Copy)]
pub struct EnrichConfig {
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        EnrichConfig {
            batch_size: 5,
            inter_batch_delay: Duration::from_millis(50),
        }
    }
}

/// Whatever serves per-process fact batches, typically a sandbox backend.
pub trait FactSource {
    async fn facts_for(&self, uid: &Uid) -> Result<FactBatch>;
}

/// Interaction summary for one process, ready to merge into a hierarchy.
#[derive(Debug, Clone)]
pub struct Augmented {
    pub uid: Uid,
    pub counts: InteractionCounts,
    pub event_times: Vec<DateTime<Utc>>,
}

/// Fetches interaction counts for every listed process, `batch_size` at a
/// time. A failed fetch degrades that process to zero counts instead of
/// failing the whole augmentation.
pub async fn augment_counts<S: FactSource>(
    source: &S,
    uids: &[Uid],
    cfg: &EnrichConfig,
) -> Vec<Augmented> {
    let mut out = Vec::with_capacity(uids.len());
    for (i, chunk) in uids.chunks(cfg.batch_size.max(1)).enumerate() {
        if i > 0 && !cfg.inter_batch_delay.is_zero() {
            tokio::time::sleep(cfg.inter_batch_delay).await;
        }
        let results = future::join_all(chunk.iter().map(|uid| source.facts_for(uid))).await;
        for (uid, result) in chunk.iter().zip(results) {
            match result {
                Ok(batch) => out.push(Augmented {
                    uid: uid.clone(),
                    counts: batch.counts(),
                    event_times: batch.all_event_times(),
                }),
                Err(err) => {
                    tracing::warn!(uid = %uid, error = %err, "fact fetch failed, counting zero");
                    out.push(Augmented {
                        uid: uid.clone(),
                        counts: InteractionCounts::default(),
                        event_times: Vec::new(),
                    });
                }
            }
        }
    }
    out
}

pub fn merge_into(session: &mut Session, results: &[Augmented]) {
    for augmented in results {
        session.merge_interactions(&augmented.uid, augmented.counts, augmented.event_times.clone());
    }
}
