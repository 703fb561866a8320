use factgraph_core::{link_uid, Fact, FactBatch, FactKind, Link, Node, SizeClass, Uid};
use std::collections::HashMap;

use crate::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Fresh graph rooted at the focal process; discards any snapshot.
    Initial,
    /// Pull the clicked neighbor's own facts into the live graph, retaining
    /// a snapshot of the pre-expansion state.
    ExpandNeighbor,
    /// Re-root the graph on a different focal process; discards any snapshot.
    SwitchFocal,
}

#[derive(Debug, Clone, Default)]
struct GraphMaps {
    nodes: HashMap<Uid, Node>,
    links: HashMap<String, Link>,
}

/// Nodes and links produced by one `build` call, i.e. what the renderer has
/// to draw on top of what it already shows.
#[derive(Debug, Clone, Default)]
pub struct GraphView {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

/// Owns the live graph map and the pre-expansion snapshot. One session per
/// analyst view; sessions never share state.
#[derive(Debug, Default)]
pub struct GraphSession {
    live: GraphMaps,
    snapshot: Option<GraphMaps>,
}

impl GraphSession {
    pub fn build(&mut self, center: &Node, batch: &FactBatch, mode: BuildMode) -> GraphView {
        let expanding = mode == BuildMode::ExpandNeighbor;
        match mode {
            BuildMode::Initial | BuildMode::SwitchFocal => {
                self.live = GraphMaps::default();
                self.snapshot = None;
            }
            BuildMode::ExpandNeighbor => {
                self.snapshot = Some(self.live.clone());
            }
        }

        let mut added_nodes: Vec<Uid> = Vec::new();
        let mut added_links: Vec<String> = Vec::new();

        if !expanding {
            // Switch-focal promotes the clicked node to the center tier.
            let mut focal = center.clone();
            focal.size_class = SizeClass::Focal;
            added_nodes.push(focal.uid.clone());
            self.live.nodes.insert(focal.uid.clone(), focal);
        }

        for (kind, fact) in batch.iter_with_kind() {
            self.add_fact(center, fact, kind, expanding, &mut added_nodes, &mut added_links);
        }

        GraphView {
            nodes: added_nodes
                .iter()
                .filter_map(|uid| self.live.nodes.get(uid).cloned())
                .collect(),
            links: added_links
                .iter()
                .filter_map(|uid| self.live.links.get(uid).cloned())
                .collect(),
        }
    }

    fn add_fact(
        &mut self,
        center: &Node,
        fact: &Fact,
        kind: FactKind,
        expanding: bool,
        added_nodes: &mut Vec<Uid>,
        added_links: &mut Vec<String>,
    ) {
        let candidate = if expanding {
            normalize::expanded_node(fact, kind)
        } else {
            normalize::neighbor_node(fact, kind)
        };
        let Some(candidate) = candidate else {
            return;
        };

        // A process creating itself would draw a self-loop on the center.
        if kind == FactKind::CreatedProcess && candidate.uid == center.uid {
            return;
        }

        // Dedup: the snapshot is consulted first (reuse the pre-expansion
        // node), then the live map (already added this build).
        let in_snapshot = expanding
            && self
                .snapshot
                .as_ref()
                .is_some_and(|snap| snap.nodes.contains_key(&candidate.uid));
        if !in_snapshot && !self.live.nodes.contains_key(&candidate.uid) {
            added_nodes.push(candidate.uid.clone());
            self.live.nodes.insert(candidate.uid.clone(), candidate.clone());
        }

        // Expansion links run from the expanded neighbor (the fact's
        // destination) to the new node; otherwise from the center outward.
        let source = if expanding {
            fact.destination_object_uid
                .as_deref()
                .map(Uid::new)
                .unwrap_or_else(|| center.uid.clone())
        } else {
            center.uid.clone()
        };
        let target = candidate.uid;

        let uid = link_uid(&source, &target);
        match self.live.links.get_mut(&uid) {
            Some(existing) => existing.value += 1,
            None => {
                added_links.push(uid.clone());
                self.live.links.insert(
                    uid.clone(),
                    Link {
                        uid,
                        source,
                        target,
                        fact_kind: kind,
                        value: 1,
                    },
                );
            }
        }
    }

    /// Inverse of an expansion: drops the listed elements by restoring the
    /// retained snapshot wholesale, then discards it. Idempotent.
    pub fn collapse(&mut self, node_ids: &[Uid], link_uids: &[String], central: &Uid) -> bool {
        match self.snapshot.take() {
            Some(snapshot) if self.live.nodes.contains_key(central) => {
                for uid in node_ids {
                    if !self.live.nodes.contains_key(uid) {
                        tracing::warn!(uid = %uid, "collapse listed an unknown node");
                    }
                }
                for uid in link_uids {
                    if !self.live.links.contains_key(uid) {
                        tracing::warn!(uid = %uid, "collapse listed an unknown link");
                    }
                }
                self.live = snapshot;
                true
            }
            Some(snapshot) => {
                tracing::warn!(central = %central, "collapse on unknown central node, ignoring");
                self.snapshot = Some(snapshot);
                false
            }
            None => {
                tracing::warn!(central = %central, "collapse without a retained expansion, ignoring");
                false
            }
        }
    }

    pub fn has_expansion(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Full live graph in renderer shape.
    pub fn view(&self) -> GraphView {
        GraphView {
            nodes: self.live.nodes.values().cloned().collect(),
            links: self.live.links.values().cloned().collect(),
        }
    }

    pub fn node(&self, uid: &Uid) -> Option<&Node> {
        self.live.nodes.get(uid)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.live.nodes.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.live.links.values()
    }

    pub fn contains_node(&self, uid: &Uid) -> bool {
        self.live.nodes.contains_key(uid)
    }

    pub fn node_count(&self) -> usize {
        self.live.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.live.links.len()
    }
}
