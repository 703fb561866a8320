use chrono::{DateTime, Utc};
use factgraph_core::{FactBatch, InteractionCounts, Node, Process, Uid};
use std::collections::HashMap;

use crate::cluster::ClusterAnchors;
use crate::filter::{self, CountThreshold, FilterConfig, FilterSubject, TypeToggles};
use crate::graph::{BuildMode, GraphSession, GraphView};
use crate::normalize;
use crate::tree::{Hierarchy, TreeView};

/// Filtered-out flags for the live graph.
#[derive(Debug, Clone, Default)]
pub struct GraphVisibility {
    pub nodes: HashMap<Uid, bool>,
    pub links: HashMap<String, bool>,
}

/// Filtered-out flags for the currently visible part of the tree.
#[derive(Debug, Clone, Default)]
pub struct TreeVisibility {
    pub nodes: HashMap<Uid, bool>,
    pub links: Vec<((Uid, Uid), bool)>,
}

/// Single owner of all mutable graph/tree/filter state for one analyst
/// view. Sessions are independent; tests can run several side by side.
#[derive(Debug, Default)]
pub struct Session {
    graph: GraphSession,
    hierarchy: Hierarchy,
    pub filters: FilterConfig,
    anchors: ClusterAnchors,
}

impl Session {
    pub fn new(width: f32, height: f32) -> Session {
        Session {
            anchors: ClusterAnchors::compute(width, height),
            ..Default::default()
        }
    }

    // ----- dataset -----

    pub fn load_processes(&mut self, records: &[Process]) {
        self.hierarchy = Hierarchy::build(records);
    }

    /// Late-arriving augmentation results merge idempotently by uid.
    pub fn merge_interactions(
        &mut self,
        uid: &Uid,
        counts: InteractionCounts,
        event_times: Vec<DateTime<Utc>>,
    ) {
        self.hierarchy.set_interactions(uid, counts, event_times);
    }

    // ----- graph -----

    pub fn build_graph(&mut self, focal: &Process, batch: &FactBatch) -> GraphView {
        let node = normalize::focal_node(focal);
        self.graph.build(&node, batch, BuildMode::Initial)
    }

    pub fn expand_neighbor(&mut self, node: &Node, batch: &FactBatch) -> GraphView {
        if !self.graph.contains_node(&node.uid) {
            tracing::warn!(uid = %node.uid, "expand on unknown node, ignoring");
            return GraphView::default();
        }
        self.graph.build(node, batch, BuildMode::ExpandNeighbor)
    }

    pub fn switch_focal(&mut self, node: &Node, batch: &FactBatch) -> GraphView {
        self.graph.build(node, batch, BuildMode::SwitchFocal)
    }

    pub fn collapse_expansion(
        &mut self,
        node_ids: &[Uid],
        link_uids: &[String],
        central: &Uid,
    ) -> bool {
        self.graph.collapse(node_ids, link_uids, central)
    }

    pub fn graph(&self) -> &GraphSession {
        &self.graph
    }

    // ----- tree -----

    pub fn toggle(&mut self, uid: &Uid) {
        self.hierarchy.toggle(uid);
    }

    pub fn expand_all(&mut self) {
        self.hierarchy.expand_all();
    }

    pub fn collapse_all(&mut self) {
        self.hierarchy.collapse_all();
    }

    pub fn tree_view(&self) -> TreeView {
        self.hierarchy.visible_view()
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    // ----- filters -----

    pub fn set_search_uids(&mut self, uids: impl IntoIterator<Item = Uid>) {
        self.filters.search_uids = uids.into_iter().collect();
    }

    pub fn set_time_range(&mut self, range: Option<(DateTime<Utc>, DateTime<Utc>)>) {
        self.filters.time_range = range;
    }

    pub fn set_count_threshold(&mut self, threshold: CountThreshold) {
        self.filters.count_threshold = threshold;
    }

    pub fn set_toggles(&mut self, toggles: TypeToggles) {
        self.filters.toggles = toggles;
    }

    /// Flags for every hierarchy node plus the visible tree links.
    pub fn apply_tree_filters(&self) -> TreeVisibility {
        let subjects: Vec<FilterSubject> = self
            .hierarchy
            .nodes()
            .map(|node| FilterSubject {
                uid: node.uid.clone(),
                timestamp: node.process.metadata.timestamp,
                event_times: node.event_times.clone(),
                counts: node.counts,
            })
            .collect();
        let nodes = filter::evaluate(subjects.iter(), &self.filters);
        let view = self.hierarchy.visible_view();
        let links = filter::tree_link_flags(&view.visible_links, &nodes);
        TreeVisibility { nodes, links }
    }

    /// Flags for the live graph. A graph node's interaction counts are the
    /// summed multiplicities of its links, bucketed by category.
    pub fn apply_graph_filters(&self) -> GraphVisibility {
        let mut counts: HashMap<Uid, InteractionCounts> = HashMap::new();
        for link in self.graph.links() {
            for uid in [&link.source, &link.target] {
                let entry = counts.entry(uid.clone()).or_default();
                match link.fact_kind {
                    factgraph_core::FactKind::ReadFile => entry.file_reads += link.value,
                    factgraph_core::FactKind::WroteFile => entry.file_writes += link.value,
                    factgraph_core::FactKind::DeletedFile => entry.file_deletes += link.value,
                    factgraph_core::FactKind::ReadRegistry => entry.registry_reads += link.value,
                    factgraph_core::FactKind::WroteRegistry => entry.registry_writes += link.value,
                    factgraph_core::FactKind::ConnectedTo => entry.network_connections += link.value,
                    factgraph_core::FactKind::CreatedProcess => entry.process_creations += link.value,
                }
            }
        }

        let subjects: Vec<FilterSubject> = self
            .graph
            .nodes()
            .map(|node| FilterSubject {
                uid: node.uid.clone(),
                timestamp: node_timestamp(node),
                event_times: Vec::new(),
                counts: counts.get(&node.uid).copied().unwrap_or_default(),
            })
            .collect();
        let nodes = filter::evaluate(subjects.iter(), &self.filters);
        let links = filter::link_flags(self.graph.links(), &nodes);
        GraphVisibility { nodes, links }
    }

    // ----- layout -----

    pub fn resize(&mut self, width: f32, height: f32) {
        self.anchors = ClusterAnchors::compute(width, height);
    }

    pub fn anchors(&self) -> &ClusterAnchors {
        &self.anchors
    }
}

fn node_timestamp(node: &Node) -> Option<DateTime<Utc>> {
    node.data
        .get("timestamp")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
}
