use chrono::{DateTime, Utc};
use factgraph_core::{InteractionCounts, Process, Uid};
use std::collections::{HashMap, HashSet};

/// One entry per process record for the lifetime of the loaded dataset;
/// only `collapsed` (and late-arriving interaction data) mutate afterwards.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub uid: Uid,
    pub name: String,
    pub process: Process,
    pub children: Vec<Uid>,
    pub collapsed: bool,
    pub counts: InteractionCounts,
    pub event_times: Vec<DateTime<Utc>>,
}

/// Visible nodes and parent→child links given the current collapse flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeView {
    pub visible_nodes: Vec<Uid>,
    pub visible_links: Vec<(Uid, Uid)>,
}

/// Process tree keyed by uid. Single-rooted; orphans and anything
/// unreachable from the designated root are pruned at build time.
#[derive(Debug, Default)]
pub struct Hierarchy {
    nodes: HashMap<Uid, HierarchyNode>,
    root: Option<Uid>,
}

impl Hierarchy {
    pub fn build(records: &[Process]) -> Hierarchy {
        let mut nodes: HashMap<Uid, HierarchyNode> = HashMap::new();
        let mut order: Vec<Uid> = Vec::new();
        let mut root: Option<Uid> = None;

        // Pass 1: one node per uid.
        for record in records {
            if nodes.contains_key(&record.uid) {
                tracing::warn!(uid = %record.uid, "duplicate process record, keeping first");
                continue;
            }
            let name = if record.is_root() {
                "root".to_string()
            } else {
                record.display_name()
            };
            if record.is_root() {
                root = Some(record.uid.clone());
            }
            nodes.insert(
                record.uid.clone(),
                HierarchyNode {
                    uid: record.uid.clone(),
                    name,
                    process: record.clone(),
                    children: Vec::new(),
                    collapsed: false,
                    counts: InteractionCounts::default(),
                    event_times: Vec::new(),
                },
            );
            order.push(record.uid.clone());
        }

        let Some(root_uid) = root else {
            tracing::warn!("no designated root record, hierarchy is empty");
            return Hierarchy::default();
        };

        // Pass 2: attach children in input order. The root never attaches to
        // anything, whatever its own parent linkage claims.
        for uid in &order {
            if *uid == root_uid {
                continue;
            }
            let parent = nodes
                .get(uid)
                .and_then(|n| n.process.parent_uid.clone())
                .filter(|p| p != uid);
            match parent {
                Some(ref parent_uid) if nodes.contains_key(parent_uid) => {
                    if let Some(parent_node) = nodes.get_mut(parent_uid) {
                        parent_node.children.push(uid.clone());
                    }
                }
                _ => {
                    tracing::warn!(uid = %uid, "no parent found for process, pruning");
                }
            }
        }

        // Drop everything not reachable from the root (unattached orphans
        // and subtrees hanging off them).
        let mut reachable: HashSet<Uid> = HashSet::new();
        let mut stack = vec![root_uid.clone()];
        while let Some(uid) = stack.pop() {
            if !reachable.insert(uid.clone()) {
                continue;
            }
            if let Some(node) = nodes.get(&uid) {
                stack.extend(node.children.iter().cloned());
            }
        }
        nodes.retain(|uid, _| reachable.contains(uid));

        Hierarchy {
            nodes,
            root: Some(root_uid),
        }
    }

    pub fn root(&self) -> Option<&Uid> {
        self.root.as_ref()
    }

    pub fn get(&self, uid: &Uid) -> Option<&HierarchyNode> {
        self.nodes.get(uid)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &HierarchyNode> {
        self.nodes.values()
    }

    pub fn toggle(&mut self, uid: &Uid) {
        match self.nodes.get_mut(uid) {
            Some(node) => node.collapsed = !node.collapsed,
            None => tracing::warn!(uid = %uid, "toggle on unknown node, ignoring"),
        }
    }

    pub fn expand_all(&mut self) {
        for node in self.nodes.values_mut() {
            node.collapsed = false;
        }
    }

    /// Collapsing the direct children of the root is enough to hide the
    /// whole tree; deeper flags are kept as they are.
    pub fn collapse_all(&mut self) {
        let Some(root) = self.root.clone() else {
            return;
        };
        let children = self
            .nodes
            .get(&root)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.collapsed = true;
            }
        }
    }

    /// Read-only view: a collapsed node is a leaf, nothing below it shows.
    /// The tree itself is never mutated.
    pub fn visible_view(&self) -> TreeView {
        let Some(root) = self.root.as_ref() else {
            return TreeView::default();
        };
        let mut view = TreeView::default();
        let mut stack = vec![root.clone()];
        while let Some(uid) = stack.pop() {
            let Some(node) = self.nodes.get(&uid) else {
                continue;
            };
            view.visible_nodes.push(uid.clone());
            if node.collapsed {
                continue;
            }
            for child in &node.children {
                view.visible_links.push((uid.clone(), child.clone()));
            }
            // stack is LIFO; reversed push keeps preorder in input order
            for child in node.children.iter().rev() {
                stack.push(child.clone());
            }
        }
        view
    }

    /// Idempotent merge point for late-arriving augmentation results.
    pub fn set_interactions(&mut self, uid: &Uid, counts: InteractionCounts, event_times: Vec<DateTime<Utc>>) {
        match self.nodes.get_mut(uid) {
            Some(node) => {
                node.counts = counts;
                node.event_times = event_times;
            }
            None => tracing::warn!(uid = %uid, "interaction data for unknown node, ignoring"),
        }
    }

    /// Number of nodes below `uid`, ignoring collapse flags.
    pub fn descendant_count(&self, uid: &Uid) -> usize {
        let mut count = 0;
        let mut stack: Vec<&Uid> = self
            .nodes
            .get(uid)
            .map(|n| n.children.iter().collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            count += 1;
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter());
            }
        }
        count
    }

    /// Uid chain from `uid` (exclusive) up to the root, following the
    /// attached parent linkage.
    pub fn ancestors(&self, uid: &Uid) -> Vec<Uid> {
        let mut chain = Vec::new();
        let mut current = self
            .nodes
            .get(uid)
            .and_then(|n| n.process.parent_uid.clone());
        while let Some(parent) = current {
            if !self.nodes.contains_key(&parent) || chain.contains(&parent) {
                break;
            }
            chain.push(parent.clone());
            if Some(&parent) == self.root.as_ref() {
                break;
            }
            current = self
                .nodes
                .get(&parent)
                .and_then(|n| n.process.parent_uid.clone());
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(uid: &str, pid: &str, parent: Option<&str>) -> Process {
        Process {
            uid: Uid::new(uid),
            parent_uid: parent.map(Uid::new),
            pid: Some(pid.into()),
            parent_pid: None,
            metadata: Default::default(),
        }
    }

    fn sample() -> Vec<Process> {
        vec![
            process("root", "root", None),
            process("a", "1", Some("root")),
            process("b", "2", Some("a")),
            process("c", "3", Some("a")),
            process("d", "4", Some("b")),
        ]
    }

    #[test]
    fn orphan_records_are_pruned() {
        let records = vec![
            process("root", "root", None),
            process("a", "1", Some("root")),
            process("b", "2", Some("missing")),
        ];
        let tree = Hierarchy::build(&records);

        assert_eq!(tree.len(), 2);
        let root = tree.get(&Uid::new("root")).expect("root");
        assert_eq!(root.children, vec![Uid::new("a")]);
        assert!(tree.get(&Uid::new("b")).is_none());
    }

    #[test]
    fn every_node_chains_to_the_root() {
        let tree = Hierarchy::build(&sample());
        assert_eq!(tree.len(), 5);
        for node in tree.nodes() {
            if Some(&node.uid) == tree.root() {
                continue;
            }
            let chain = tree.ancestors(&node.uid);
            assert_eq!(chain.last(), Some(&Uid::new("root")), "node {}", node.uid);
        }
    }

    #[test]
    fn missing_root_yields_empty_hierarchy() {
        let records = vec![process("a", "1", None)];
        let tree = Hierarchy::build(&records);
        assert!(tree.is_empty());
        assert_eq!(tree.visible_view(), TreeView::default());
    }

    #[test]
    fn collapsed_node_is_a_leaf_in_the_view() {
        let mut tree = Hierarchy::build(&sample());
        tree.toggle(&Uid::new("b"));

        let view = tree.visible_view();
        let visible: HashSet<&Uid> = view.visible_nodes.iter().collect();
        assert!(visible.contains(&Uid::new("b")));
        assert!(!visible.contains(&Uid::new("d")));
        assert!(!view
            .visible_links
            .iter()
            .any(|(p, _)| *p == Uid::new("b")));

        // children stay attached internally
        assert_eq!(
            tree.get(&Uid::new("b")).expect("b").children,
            vec![Uid::new("d")]
        );
    }

    #[test]
    fn view_is_referentially_consistent() {
        let mut tree = Hierarchy::build(&sample());
        tree.toggle(&Uid::new("a"));
        let first = tree.visible_view();
        let second = tree.visible_view();
        assert_eq!(first, second);
    }

    #[test]
    fn view_preserves_input_child_order() {
        let tree = Hierarchy::build(&sample());
        let view = tree.visible_view();
        let a_children: Vec<&Uid> = view
            .visible_links
            .iter()
            .filter(|(p, _)| *p == Uid::new("a"))
            .map(|(_, c)| c)
            .collect();
        assert_eq!(a_children, vec![&Uid::new("b"), &Uid::new("c")]);
    }

    #[test]
    fn collapse_all_then_expand_all_restores_everything() {
        let mut tree = Hierarchy::build(&sample());
        let full: HashSet<Uid> = tree.visible_view().visible_nodes.into_iter().collect();

        tree.collapse_all();
        let collapsed = tree.visible_view();
        // root + its direct children only
        assert_eq!(collapsed.visible_nodes.len(), 2);

        tree.expand_all();
        let restored: HashSet<Uid> = tree.visible_view().visible_nodes.into_iter().collect();
        assert_eq!(restored, full);
    }

    #[test]
    fn collapse_all_touches_only_direct_children() {
        let mut tree = Hierarchy::build(&sample());
        tree.toggle(&Uid::new("b"));
        tree.collapse_all();
        assert!(tree.get(&Uid::new("a")).expect("a").collapsed);
        // deeper flag kept as-is
        assert!(tree.get(&Uid::new("b")).expect("b").collapsed);
        assert!(!tree.get(&Uid::new("c")).expect("c").collapsed);
    }

    #[test]
    fn descendant_counts_ignore_collapse_flags() {
        let mut tree = Hierarchy::build(&sample());
        tree.toggle(&Uid::new("b"));
        assert_eq!(tree.descendant_count(&Uid::new("root")), 4);
        assert_eq!(tree.descendant_count(&Uid::new("b")), 1);
        assert_eq!(tree.descendant_count(&Uid::new("d")), 0);
        assert_eq!(tree.descendant_count(&Uid::new("nope")), 0);
    }

    #[test]
    fn toggle_unknown_uid_is_a_noop() {
        let mut tree = Hierarchy::build(&sample());
        tree.toggle(&Uid::new("nope"));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn root_wins_even_with_bogus_parent_linkage() {
        let records = vec![
            process("root", "root", Some("elsewhere")),
            process("a", "1", Some("root")),
        ];
        let tree = Hierarchy::build(&records);
        assert_eq!(tree.root(), Some(&Uid::new("root")));
        assert_eq!(tree.len(), 2);
    }
}
