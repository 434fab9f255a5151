//! The diagram model: nodes, routable edges, routing handles, and
//! dangling anchors, all owned by a [`Diagram`] root and addressed by id.
//!
//! Cross-references between elements (handle ↔ anchor ↔ original node)
//! are stored as ids and resolved through the root on demand, so the
//! root stays the single owner of every element.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

// ────────────────────────────────────────────────────────────────────────────
// DiagramDoc – persistence wrapper
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramDoc {
    pub diagram: Diagram,
}

impl DiagramDoc {
    /// Save the DiagramDoc to a binary file with magic bytes and versioning.
    pub fn save_to_binary<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        std::io::Write::write_all(&mut writer, b"BENDPOINT")?;
        std::io::Write::write_all(&mut writer, &1u32.to_le_bytes())?;
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())?;
        Ok(())
    }

    /// Load a DiagramDoc from a binary file, checking magic bytes and version.
    pub fn load_from_binary<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        let mut magic = [0u8; 9];
        std::io::Read::read_exact(&mut reader, &mut magic)?;
        if &magic != b"BENDPOINT" {
            anyhow::bail!("Invalid magic bytes: expected 'BENDPOINT'");
        }
        let mut version_bytes = [0u8; 4];
        std::io::Read::read_exact(&mut reader, &mut version_bytes)?;
        let version = u32::from_le_bytes(version_bytes);
        if version != 1 {
            anyhow::bail!("Unsupported version: {}", version);
        }
        let doc: DiagramDoc =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())?;
        Ok(doc)
    }

    /// Save the DiagramDoc as pretty-printed JSON.
    pub fn save_to_json<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a DiagramDoc from a JSON file.
    pub fn load_from_json<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        let doc = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(doc)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Elements
// ────────────────────────────────────────────────────────────────────────────

/// A diagram node an edge endpoint can attach to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub position: Point,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            position: Point::new(x, y),
        }
    }
}

/// Which part of an edge a routing handle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Source,
    Target,
    Junction,
}

/// A draggable control point on a routable edge.
///
/// `point_index` is the handle's slot in the parent edge's routing-point
/// sequence and is `Some` only for junction handles; source and target
/// handles reference the edge endpoint instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingHandle {
    pub id: String,
    pub kind: HandleKind,
    #[serde(default)]
    pub point_index: Option<usize>,
    #[serde(default)]
    pub edit_mode: bool,
    /// Id of the dangling anchor this handle owns while its endpoint is
    /// detached. `None` means the endpoint is still bound to its node.
    #[serde(default)]
    pub dangling_anchor_id: Option<String>,
}

/// A routable edge: an ordered routing-point sequence plus two endpoint
/// references resolving to either a node or a dangling anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    /// Selects which router services this edge.
    pub router_kind: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub routing_points: Vec<Point>,
    /// Routing handles owned by this edge (children in the model tree).
    #[serde(default)]
    pub handles: Vec<RoutingHandle>,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        router_kind: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            router_kind: router_kind.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            routing_points: Vec::new(),
            handles: Vec::new(),
        }
    }

    /// Find a handle on this edge by kind and point index.
    pub fn handle_at(
        &self,
        kind: HandleKind,
        point_index: Option<usize>,
    ) -> Option<&RoutingHandle> {
        self.handles
            .iter()
            .find(|h| h.kind == kind && h.point_index == point_index)
    }
}

/// An ephemeral node representing a detached edge endpoint's free position.
///
/// `original_id` points back at the node the endpoint detached from; it is
/// a reference only and never affects the original node's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DanglingAnchor {
    pub id: String,
    pub position: Point,
    pub original_id: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Diagram – model root and id index
// ────────────────────────────────────────────────────────────────────────────

/// What an id resolved to, for callers that only need the element class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementRef {
    Node,
    Edge,
    /// A routing handle, together with the id of its parent edge.
    Handle { edge_id: String },
    Anchor,
}

/// The model root. Owns every element; all cross-references are by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagram {
    pub nodes: IndexMap<String, Node>,
    pub edges: IndexMap<String, Edge>,
    /// Dangling anchors are attached directly to the root.
    #[serde(default)]
    pub anchors: IndexMap<String, DanglingAnchor>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id.clone(), edge);
    }

    /// Resolve an id to its element class. Handles are found by scanning
    /// their parent edges.
    pub fn element_ref(&self, id: &str) -> Option<ElementRef> {
        if self.nodes.contains_key(id) {
            return Some(ElementRef::Node);
        }
        if self.edges.contains_key(id) {
            return Some(ElementRef::Edge);
        }
        if self.anchors.contains_key(id) {
            return Some(ElementRef::Anchor);
        }
        self.find_handle(id).map(|(edge_id, _)| ElementRef::Handle {
            edge_id: edge_id.to_string(),
        })
    }

    pub fn contains_element(&self, id: &str) -> bool {
        self.element_ref(id).is_some()
    }

    /// Look up a routing handle by id, returning its parent edge id too.
    pub fn find_handle(&self, id: &str) -> Option<(&str, &RoutingHandle)> {
        for (edge_id, edge) in &self.edges {
            if let Some(handle) = edge.handles.iter().find(|h| h.id == id) {
                return Some((edge_id.as_str(), handle));
            }
        }
        None
    }

    /// Locate a handle as `(edge_id, index into Edge::handles)`.
    ///
    /// Returned by value so callers can re-borrow the diagram mutably.
    pub fn locate_handle(&self, id: &str) -> Option<(String, usize)> {
        for (edge_id, edge) in &self.edges {
            if let Some(idx) = edge.handles.iter().position(|h| h.id == id) {
                return Some((edge_id.clone(), idx));
            }
        }
        None
    }

    /// Position of an edge endpoint: a node's position or a dangling
    /// anchor's free position.
    pub fn endpoint_position(&self, id: &str) -> Option<Point> {
        if let Some(node) = self.nodes.get(id) {
            return Some(node.position);
        }
        self.anchors.get(id).map(|a| a.position)
    }
}
