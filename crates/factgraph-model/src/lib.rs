pub mod cluster;
pub mod filter;
pub mod graph;
pub mod normalize;
pub mod session;
pub mod tree;

pub use cluster::ClusterAnchors;
pub use filter::{CountThreshold, FilterConfig, FilterSubject, TypeToggles};
pub use graph::{BuildMode, GraphSession, GraphView};
pub use session::{GraphVisibility, Session, TreeVisibility};
pub use tree::{Hierarchy, HierarchyNode, TreeView};
