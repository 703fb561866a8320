use chrono::{DateTime, Utc};
use factgraph_core::{InteractionCounts, Link, Uid};
use std::collections::{HashMap, HashSet};

/// Total-interaction-count threshold. `None` keeps only nodes with zero
/// interactions; `Unrestricted` is the fail-open default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountThreshold {
    #[default]
    Unrestricted,
    None,
    OnePlus,
    FivePlus,
    TenPlus,
}

impl CountThreshold {
    /// Unknown values fall open to no restriction, never an error.
    pub fn parse(value: &str) -> CountThreshold {
        match value {
            "none" => CountThreshold::None,
            "one-plus" => CountThreshold::OnePlus,
            "five-plus" => CountThreshold::FivePlus,
            "ten-plus" => CountThreshold::TenPlus,
            other => {
                tracing::warn!(value = other, "unknown interaction-count threshold, ignoring");
                CountThreshold::Unrestricted
            }
        }
    }
}

/// Independently enabled interaction categories. When several are on, a
/// node must have interactions in every one of them (AND, not OR).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeToggles {
    pub network_connections: bool,
    pub file_reads: bool,
    pub file_writes: bool,
    pub file_deletes: bool,
    pub registry_reads: bool,
    pub registry_writes: bool,
}

impl TypeToggles {
    pub fn any_active(&self) -> bool {
        self.network_connections
            || self.file_reads
            || self.file_writes
            || self.file_deletes
            || self.registry_reads
            || self.registry_writes
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Non-empty set: everything outside it is filtered, nothing else runs.
    pub search_uids: HashSet<Uid>,
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub count_threshold: CountThreshold,
    pub toggles: TypeToggles,
}

/// Everything the engine needs to know about one node.
#[derive(Debug, Clone, Default)]
pub struct FilterSubject {
    pub uid: Uid,
    pub timestamp: Option<DateTime<Utc>>,
    pub event_times: Vec<DateTime<Utc>>,
    pub counts: InteractionCounts,
}

/// Per-node filtered-out flags. Pure function of its inputs: deterministic,
/// order-independent, idempotent.
pub fn evaluate<'a, I>(subjects: I, cfg: &FilterConfig) -> HashMap<Uid, bool>
where
    I: IntoIterator<Item = &'a FilterSubject>,
{
    subjects
        .into_iter()
        .map(|s| (s.uid.clone(), is_filtered(s, cfg)))
        .collect()
}

fn is_filtered(subject: &FilterSubject, cfg: &FilterConfig) -> bool {
    // 1. Search highlight short-circuits everything else.
    if !cfg.search_uids.is_empty() && !cfg.search_uids.contains(&subject.uid) {
        return true;
    }

    // 2. Time range. Only nodes that carry their own timestamp can be
    // filtered out; an in-range interaction event rescues them.
    if let Some((start, end)) = cfg.time_range {
        let own_in_range = subject
            .timestamp
            .map(|t| t >= start && t <= end)
            .unwrap_or(false);
        let event_in_range = subject
            .event_times
            .iter()
            .any(|t| *t >= start && *t <= end);
        if subject.timestamp.is_some() && !own_in_range && !event_in_range {
            return true;
        }
    }

    // 3. Interaction-count threshold.
    match cfg.count_threshold {
        CountThreshold::Unrestricted => {}
        CountThreshold::None => {
            if subject.counts.has_action_interactions() {
                return true;
            }
        }
        CountThreshold::OnePlus => {
            if !subject.counts.has_action_interactions() {
                return true;
            }
        }
        CountThreshold::FivePlus => {
            if subject.counts.total() < 5 {
                return true;
            }
        }
        CountThreshold::TenPlus => {
            if subject.counts.total() < 10 {
                return true;
            }
        }
    }

    // 4. Type toggles: every active category must have fired.
    let toggles = cfg.toggles;
    if toggles.any_active() {
        let counts = subject.counts;
        if toggles.network_connections && counts.network_connections == 0 {
            return true;
        }
        if toggles.file_reads && counts.file_reads == 0 {
            return true;
        }
        if toggles.file_writes && counts.file_writes == 0 {
            return true;
        }
        if toggles.file_deletes && counts.file_deletes == 0 {
            return true;
        }
        if toggles.registry_reads && counts.registry_reads == 0 {
            return true;
        }
        if toggles.registry_writes && counts.registry_writes == 0 {
            return true;
        }
    }

    false
}

/// A link is filtered out iff either endpoint is; endpoints the node pass
/// never saw count as filtered.
pub fn link_flags<'a, I>(links: I, node_flags: &HashMap<Uid, bool>) -> HashMap<String, bool>
where
    I: IntoIterator<Item = &'a Link>,
{
    links
        .into_iter()
        .map(|link| {
            let source = node_flags.get(&link.source).copied().unwrap_or(true);
            let target = node_flags.get(&link.target).copied().unwrap_or(true);
            (link.uid.clone(), source || target)
        })
        .collect()
}

/// Same endpoint rule for the hierarchy's parent→child links.
pub fn tree_link_flags(
    links: &[(Uid, Uid)],
    node_flags: &HashMap<Uid, bool>,
) -> Vec<((Uid, Uid), bool)> {
    links
        .iter()
        .map(|(parent, child)| {
            let p = node_flags.get(parent).copied().unwrap_or(true);
            let c = node_flags.get(child).copied().unwrap_or(true);
            ((parent.clone(), child.clone()), p || c)
        })
        .collect()
}
