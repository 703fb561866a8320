use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const LABEL_LENGTH_LIMIT: usize = 30;

/// Sentinel pid carried by the record designated as the process-tree root.
pub const ROOT_PID: &str = "root";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(pub String);

impl Uid {
    pub fn new(s: impl Into<String>) -> Self {
        Uid(s.into())
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum FactKind {
    ReadFile,
    WroteFile,
    DeletedFile,
    ReadRegistry,
    WroteRegistry,
    ConnectedTo,
    CreatedProcess,
}

impl FactKind {
    /// The interaction categories that get their own cluster ring slot;
    /// process creation stays pinned at the center.
    pub const ACTION_KINDS: [FactKind; 6] = [
        FactKind::ReadFile,
        FactKind::WroteFile,
        FactKind::DeletedFile,
        FactKind::ReadRegistry,
        FactKind::WroteRegistry,
        FactKind::ConnectedTo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FactKind::ReadFile => "readFile",
            FactKind::WroteFile => "wroteFile",
            FactKind::DeletedFile => "deletedFile",
            FactKind::ReadRegistry => "readRegistry",
            FactKind::WroteRegistry => "wroteRegistry",
            FactKind::ConnectedTo => "connectedTo",
            FactKind::CreatedProcess => "createdProcess",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Process,
    File,
    Registry,
    Network,
}

impl ObjectKind {
    /// Kind of the non-process endpoint a fact of this category touches.
    pub fn for_fact(kind: FactKind) -> ObjectKind {
        match kind {
            FactKind::ReadFile | FactKind::WroteFile | FactKind::DeletedFile => ObjectKind::File,
            FactKind::ReadRegistry | FactKind::WroteRegistry => ObjectKind::Registry,
            FactKind::ConnectedTo => ObjectKind::Network,
            FactKind::CreatedProcess => ObjectKind::Process,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FactMeta {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A single recorded interaction event with source and destination endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    #[serde(rename = "type")]
    pub kind: FactKind,
    #[serde(default)]
    pub source_object_uid: Option<String>,
    #[serde(default)]
    pub source_object_type: Option<ObjectKind>,
    #[serde(default)]
    pub source_object_value: Option<String>,
    #[serde(default)]
    pub destination_object_uid: Option<String>,
    #[serde(default)]
    pub destination_object_type: Option<ObjectKind>,
    #[serde(default)]
    pub destination_object_value: Option<String>,
    #[serde(default)]
    pub meta: FactMeta,
}

/// Per-category fact arrays, the shape the fetch collaborator delivers for
/// one focal object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FactBatch {
    pub file_reads: Vec<Fact>,
    pub file_writes: Vec<Fact>,
    pub file_deletes: Vec<Fact>,
    pub registry_reads: Vec<Fact>,
    pub registry_writes: Vec<Fact>,
    pub network_connections: Vec<Fact>,
    pub process_creations: Vec<Fact>,
}

impl FactBatch {
    pub fn push(&mut self, kind: FactKind, fact: Fact) {
        match kind {
            FactKind::ReadFile => self.file_reads.push(fact),
            FactKind::WroteFile => self.file_writes.push(fact),
            FactKind::DeletedFile => self.file_deletes.push(fact),
            FactKind::ReadRegistry => self.registry_reads.push(fact),
            FactKind::WroteRegistry => self.registry_writes.push(fact),
            FactKind::ConnectedTo => self.network_connections.push(fact),
            FactKind::CreatedProcess => self.process_creations.push(fact),
        }
    }

    pub fn iter_with_kind(&self) -> impl Iterator<Item = (FactKind, &Fact)> {
        self.file_reads
            .iter()
            .map(|f| (FactKind::ReadFile, f))
            .chain(self.file_writes.iter().map(|f| (FactKind::WroteFile, f)))
            .chain(self.file_deletes.iter().map(|f| (FactKind::DeletedFile, f)))
            .chain(self.registry_reads.iter().map(|f| (FactKind::ReadRegistry, f)))
            .chain(
                self.registry_writes
                    .iter()
                    .map(|f| (FactKind::WroteRegistry, f)),
            )
            .chain(
                self.network_connections
                    .iter()
                    .map(|f| (FactKind::ConnectedTo, f)),
            )
            .chain(
                self.process_creations
                    .iter()
                    .map(|f| (FactKind::CreatedProcess, f)),
            )
    }

    pub fn len(&self) -> usize {
        self.iter_with_kind().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> InteractionCounts {
        InteractionCounts {
            file_reads: self.file_reads.len() as u32,
            file_writes: self.file_writes.len() as u32,
            file_deletes: self.file_deletes.len() as u32,
            registry_reads: self.registry_reads.len() as u32,
            registry_writes: self.registry_writes.len() as u32,
            network_connections: self.network_connections.len() as u32,
            process_creations: self.process_creations.len() as u32,
        }
    }

    pub fn all_event_times(&self) -> Vec<DateTime<Utc>> {
        self.iter_with_kind()
            .filter_map(|(_, f)| f.meta.timestamp)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionCounts {
    pub file_reads: u32,
    pub file_writes: u32,
    pub file_deletes: u32,
    pub registry_reads: u32,
    pub registry_writes: u32,
    pub network_connections: u32,
    pub process_creations: u32,
}

impl InteractionCounts {
    pub fn total(&self) -> u32 {
        self.file_reads
            + self.file_writes
            + self.file_deletes
            + self.registry_reads
            + self.registry_writes
            + self.network_connections
            + self.process_creations
    }

    /// Whether any of the six action categories fired (process creations
    /// don't count as interactions for the none/one-plus thresholds).
    pub fn has_action_interactions(&self) -> bool {
        self.file_reads > 0
            || self.file_writes > 0
            || self.file_deletes > 0
            || self.registry_reads > 0
            || self.registry_writes > 0
            || self.network_connections > 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMeta {
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ProcessMeta {
    /// Fills unset fields from `other`; later sightings never overwrite
    /// values already present.
    pub fn merge(&mut self, other: &ProcessMeta) {
        if self.process_name.is_none() {
            self.process_name = other.process_name.clone();
        }
        if self.timestamp.is_none() {
            self.timestamp = other.timestamp;
        }
        for (k, v) in &other.extra {
            self.extra.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub uid: Uid,
    #[serde(default)]
    pub parent_uid: Option<Uid>,
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(default)]
    pub parent_pid: Option<String>,
    #[serde(default)]
    pub metadata: ProcessMeta,
}

impl Process {
    pub fn is_root(&self) -> bool {
        self.pid.as_deref() == Some(ROOT_PID)
    }

    pub fn display_name(&self) -> String {
        self.metadata
            .process_name
            .clone()
            .or_else(|| self.pid.clone())
            .unwrap_or_else(|| self.uid.0.clone())
    }
}

/// Display-size tier; the renderer maps these to radii.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SizeClass {
    Focal,
    Neighbor,
    Expanded,
}

impl SizeClass {
    pub fn display_size(self) -> f32 {
        match self {
            SizeClass::Focal => 20.0,
            SizeClass::Neighbor => 10.0,
            SizeClass::Expanded => 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub uid: Uid,
    pub label: String,
    pub name: String,
    #[serde(rename = "objType")]
    pub obj_kind: ObjectKind,
    #[serde(rename = "factType")]
    pub fact_kind: FactKind,
    #[serde(rename = "sizeClass")]
    pub size_class: SizeClass,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub uid: String,
    pub source: Uid,
    pub target: Uid,
    #[serde(rename = "factType")]
    pub fact_kind: FactKind,
    pub value: u32,
}

/// Link identity is the ordered (source, target) pair.
pub fn link_uid(source: &Uid, target: &Uid) -> String {
    format!("{}-{}", source.0, target.0)
}

pub fn truncate_label(name: &str) -> String {
    if name.chars().count() > LABEL_LENGTH_LIMIT {
        let short: String = name.chars().take(LABEL_LENGTH_LIMIT).collect();
        format!("{short}...")
    } else {
        name.to_string()
    }
}
