use factgraph_core::{truncate_label, Fact, FactKind, Node, ObjectKind, Process, SizeClass, Uid};
use serde_json::Value;

/// The central process node a graph is rooted at.
pub fn focal_node(process: &Process) -> Node {
    let name = process.display_name();
    Node {
        uid: process.uid.clone(),
        label: truncate_label(&name),
        name,
        obj_kind: ObjectKind::Process,
        fact_kind: FactKind::CreatedProcess,
        size_class: SizeClass::Focal,
        data: serde_json::to_value(process).unwrap_or(Value::Null),
    }
}

/// Node for a fact's destination endpoint, the "other side" when building
/// outward from the focal process. Returns `None` for malformed facts.
pub fn neighbor_node(fact: &Fact, kind: FactKind) -> Option<Node> {
    let Some(uid) = fact.destination_object_uid.as_deref() else {
        tracing::warn!(kind = kind.as_str(), "fact missing destination uid, skipping");
        return None;
    };

    let obj_kind = fact
        .destination_object_type
        .unwrap_or_else(|| ObjectKind::for_fact(kind));

    // Processes are labeled by name from the metadata, everything else by
    // the endpoint value (path, key, address).
    let name = if obj_kind == ObjectKind::Process {
        fact.meta
            .process_name
            .clone()
            .or_else(|| fact.destination_object_value.clone())
    } else {
        fact.destination_object_value.clone()
    };
    let Some(name) = name else {
        tracing::warn!(kind = kind.as_str(), uid, "fact missing destination value, skipping");
        return None;
    };

    Some(Node {
        uid: Uid::new(uid),
        label: truncate_label(&name),
        name,
        obj_kind,
        fact_kind: kind,
        size_class: SizeClass::Neighbor,
        data: serde_json::to_value(&fact.meta).unwrap_or(Value::Null),
    })
}

/// Node for a fact's source endpoint, used when expanding a neighbor: the
/// facts of the expanded object name other processes as sources.
pub fn expanded_node(fact: &Fact, kind: FactKind) -> Option<Node> {
    let Some(uid) = fact.source_object_uid.as_deref() else {
        tracing::warn!(kind = kind.as_str(), "fact missing source uid, skipping");
        return None;
    };
    let name = fact
        .meta
        .process_name
        .clone()
        .or_else(|| fact.source_object_value.clone());
    let Some(name) = name else {
        tracing::warn!(kind = kind.as_str(), uid, "fact missing source value, skipping");
        return None;
    };

    Some(Node {
        uid: Uid::new(uid),
        label: truncate_label(&name),
        name,
        obj_kind: ObjectKind::Process,
        fact_kind: kind,
        size_class: SizeClass::Expanded,
        data: serde_json::to_value(&fact.meta).unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use factgraph_core::{FactMeta, ProcessMeta};

    fn fact(kind: FactKind) -> Fact {
        Fact {
            kind,
            source_object_uid: Some("p-1".into()),
            source_object_type: Some(ObjectKind::Process),
            source_object_value: Some("1234".into()),
            destination_object_uid: Some("f-1".into()),
            destination_object_type: Some(ObjectKind::File),
            destination_object_value: Some("C:\\temp\\a.txt".into()),
            meta: FactMeta::default(),
        }
    }

    #[test]
    fn focal_node_is_process_sized() {
        let process = Process {
            uid: Uid::new("p-1"),
            parent_uid: None,
            pid: Some("1234".into()),
            parent_pid: None,
            metadata: ProcessMeta {
                process_name: Some("cmd.exe".into()),
                ..Default::default()
            },
        };
        let node = focal_node(&process);
        assert_eq!(node.uid, Uid::new("p-1"));
        assert_eq!(node.name, "cmd.exe");
        assert_eq!(node.size_class, SizeClass::Focal);
    }

    #[test]
    fn neighbor_node_uses_destination_endpoint() {
        let node = neighbor_node(&fact(FactKind::ReadFile), FactKind::ReadFile).expect("node");
        assert_eq!(node.uid, Uid::new("f-1"));
        assert_eq!(node.obj_kind, ObjectKind::File);
        assert_eq!(node.size_class, SizeClass::Neighbor);
        assert_eq!(node.name, "C:\\temp\\a.txt");
    }

    #[test]
    fn expanded_node_uses_source_endpoint() {
        let node = expanded_node(&fact(FactKind::ReadFile), FactKind::ReadFile).expect("node");
        assert_eq!(node.uid, Uid::new("p-1"));
        assert_eq!(node.obj_kind, ObjectKind::Process);
        assert_eq!(node.size_class, SizeClass::Expanded);
    }

    #[test]
    fn malformed_fact_is_skipped() {
        let mut f = fact(FactKind::WroteFile);
        f.destination_object_uid = None;
        assert!(neighbor_node(&f, FactKind::WroteFile).is_none());

        let mut f = fact(FactKind::WroteFile);
        f.destination_object_value = None;
        assert!(neighbor_node(&f, FactKind::WroteFile).is_none());
    }

    #[test]
    fn process_destination_prefers_meta_name() {
        let mut f = fact(FactKind::CreatedProcess);
        f.destination_object_type = Some(ObjectKind::Process);
        f.meta.process_name = Some("child.exe".into());
        let node = neighbor_node(&f, FactKind::CreatedProcess).expect("node");
        assert_eq!(node.name, "child.exe");
    }
}
