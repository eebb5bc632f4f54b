use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{EditorError, EditorResult};

/// Reserved node kind for editor-created pass-through relays.
pub const JUNCTION: &str = "JUNCTION";

// ────────────────────────────────────────────────────────────────────────────
// DiagramDoc – persisted representation
// ────────────────────────────────────────────────────────────────────────────

/// The persisted shape of a diagram: plain nodes and edges, no derived geometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramDoc {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

const BINARY_MAGIC: &[u8; 8] = b"WIRELINK";
const BINARY_VERSION: u32 = 1;

impl DiagramDoc {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Save the document to a binary file with magic bytes and versioning.
    pub fn save_to_binary<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        std::io::Write::write_all(&mut writer, BINARY_MAGIC)?;
        std::io::Write::write_all(&mut writer, &BINARY_VERSION.to_le_bytes())?;
        bincode::serde::encode_into_std_write(self, &mut writer, bincode::config::standard())?;
        Ok(())
    }

    /// Load a document from a binary file, checking magic bytes and version.
    pub fn load_from_binary<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        let mut magic = [0u8; 8];
        std::io::Read::read_exact(&mut reader, &mut magic)?;
        if &magic != BINARY_MAGIC {
            anyhow::bail!("Invalid magic bytes: expected 'WIRELINK'");
        }
        let mut version_bytes = [0u8; 4];
        std::io::Read::read_exact(&mut reader, &mut version_bytes)?;
        let version = u32::from_le_bytes(version_bytes);
        if version != BINARY_VERSION {
            anyhow::bail!("Unsupported version: {}", version);
        }
        let doc: DiagramDoc =
            bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard())?;
        Ok(doc)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Identifiers and geometry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        EdgeId(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Point) -> Point {
        Point::new(self.x + by.x, self.y + by.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("in"),
            Direction::Out => f.write_str("out"),
        }
    }
}

/// One end of an edge: a node and a port index on the side implied by
/// context (`Edge::source` is always an output, `Edge::target` an input).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub node: NodeId,
    pub port: u32,
}

impl PortRef {
    pub fn new(node: impl Into<NodeId>, port: u32) -> Self {
        Self {
            node: node.into(),
            port,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Node
// ────────────────────────────────────────────────────────────────────────────

/// Scalar parameter value. The editor never interprets these.
///
/// Persisted externally tagged (`{"int": 1000}`, `{"text": "%IX0.0"}`)
/// rather than as a bare scalar: the binary document format cannot decode
/// self-describing untagged values, and the tag keeps `Int(1)` and
/// `Float(1.0)` apart in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Either a catalog block type or the reserved junction kind.
///
/// Persisted as a plain string; `"JUNCTION"` maps to [`NodeKind::Junction`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Block(String),
    Junction,
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        if s == JUNCTION {
            NodeKind::Junction
        } else {
            NodeKind::Block(s)
        }
    }
}

impl From<NodeKind> for String {
    fn from(k: NodeKind) -> Self {
        match k {
            NodeKind::Block(name) => name,
            NodeKind::Junction => JUNCTION.to_string(),
        }
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        NodeKind::from(s.to_string())
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Block(name) => f.write_str(name),
            NodeKind::Junction => f.write_str(JUNCTION),
        }
    }
}

/// A diagram node.
///
/// Port counts are resolved from the catalog once, at creation, and never
/// change afterwards. `position` is the top-left corner for blocks and the
/// center for junctions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    /// Explicit size; `None` means "derive from port counts".
    #[serde(default)]
    pub size: Option<Size>,
    pub input_count: u32,
    pub output_count: u32,
    #[serde(default)]
    pub parameters: IndexMap<String, ParamValue>,
}

impl Node {
    pub fn is_junction(&self) -> bool {
        self.kind == NodeKind::Junction
    }

    pub fn port_count(&self, direction: Direction) -> u32 {
        match direction {
            Direction::In => self.input_count,
            Direction::Out => self.output_count,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Edge
// ────────────────────────────────────────────────────────────────────────────

/// A directed wire from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: PortRef,
    pub target: PortRef,
    /// Bend points in routing order, source to target.
    #[serde(default)]
    pub waypoints: Vec<Point>,
}

impl Edge {
    /// Build an edge whose id is derived from its endpoints.
    pub fn new(source: PortRef, target: PortRef, waypoints: Vec<Point>) -> Self {
        Self {
            id: Edge::derive_id(&source, &target),
            source,
            target,
            waypoints,
        }
    }

    /// `"{src}#out:{p}->{dst}#in:{q}"`
    pub fn derive_id(source: &PortRef, target: &PortRef) -> EdgeId {
        EdgeId(format!(
            "{}#out:{}->{}#in:{}",
            source.node, source.port, target.node, target.port
        ))
    }

    pub fn touches(&self, node: &NodeId) -> bool {
        self.source.node == *node || self.target.node == *node
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Diagram – the authoritative graph
// ────────────────────────────────────────────────────────────────────────────

/// The authoritative set of nodes and edges.
///
/// Collections keep insertion order. Mutation goes through
/// [`crate::editor::operations`]; everything here is read-only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    pub(crate) nodes: IndexMap<NodeId, Node>,
    pub(crate) edges: IndexMap<EdgeId, Edge>,
}

/// A structural problem reported by [`Diagram::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramIssue {
    DanglingEndpoint { edge: EdgeId, node: NodeId },
    PortOutOfRange { edge: EdgeId, node: NodeId, direction: Direction, port: u32 },
    DuplicateInput { target: PortRef, edges: Vec<EdgeId> },
    UnconnectedJunction { node: NodeId, direction: Direction },
    MalformedJunction { node: NodeId, input_count: u32, output_count: u32 },
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a diagram from a persisted document.
    ///
    /// Rejects duplicate ids, junctions without exactly one port per side,
    /// edges naming unknown nodes or out-of-range ports, and edge ids that
    /// differ from the id derived from their endpoints.
    pub fn from_doc(doc: DiagramDoc) -> EditorResult<Self> {
        let mut diagram = Diagram::new();
        for node in doc.nodes {
            if diagram.nodes.contains_key(&node.id) {
                return Err(EditorError::InvalidReference(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
            if node.is_junction() && (node.input_count, node.output_count) != (1, 1) {
                return Err(EditorError::InvalidReference(format!(
                    "junction '{}' has {} input(s) and {} output(s), expected 1 and 1",
                    node.id, node.input_count, node.output_count
                )));
            }
            diagram.nodes.insert(node.id.clone(), node);
        }
        for edge in doc.edges {
            if diagram.edges.contains_key(&edge.id) {
                return Err(EditorError::InvalidReference(format!(
                    "duplicate edge id '{}'",
                    edge.id
                )));
            }
            let derived = Edge::derive_id(&edge.source, &edge.target);
            if edge.id != derived {
                return Err(EditorError::InvalidReference(format!(
                    "edge id '{}' does not match its endpoints ('{}')",
                    edge.id, derived
                )));
            }
            diagram.check_port(&edge.source.node, Direction::Out, edge.source.port)?;
            diagram.check_port(&edge.target.node, Direction::In, edge.target.port)?;
            diagram.edges.insert(edge.id.clone(), edge);
        }
        Ok(diagram)
    }

    pub fn to_doc(&self) -> DiagramDoc {
        DiagramDoc {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: &NodeId) -> EditorResult<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| EditorError::UnknownNode(id.clone()))
    }

    pub fn edge(&self, id: &EdgeId) -> EditorResult<&Edge> {
        self.edges
            .get(id)
            .ok_or_else(|| EditorError::UnknownEdge(id.clone()))
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    /// Resolve a node and check `index` against its port count.
    pub fn check_port(&self, id: &NodeId, direction: Direction, index: u32) -> EditorResult<&Node> {
        let node = self.node(id)?;
        let count = node.port_count(direction);
        if index >= count {
            return Err(EditorError::PortOutOfRange {
                node: id.clone(),
                direction,
                index,
                count,
            });
        }
        Ok(node)
    }

    /// The edge currently feeding the given input port, if any.
    pub fn incoming_edge(&self, target: &PortRef) -> Option<&Edge> {
        self.edges.values().find(|e| e.target == *target)
    }

    /// Every edge leaving the given output port, oldest first.
    pub fn outgoing_edges<'a>(&'a self, source: &'a PortRef) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.source == *source)
    }

    pub fn edges_touching<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.touches(node))
    }

    /// Next free node id: one past the largest numeric id in use, or the
    /// smallest free positive number once that would overflow.
    pub fn next_node_id(&self) -> NodeId {
        let max = self
            .nodes
            .keys()
            .filter_map(|id| id.0.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        if let Some(next) = max.checked_add(1) {
            return NodeId(next.to_string());
        }
        let mut n: u64 = 1;
        loop {
            let id = NodeId(n.to_string());
            if !self.nodes.contains_key(&id) {
                return id;
            }
            n += 1;
        }
    }

    /// Report structural problems without changing anything.
    pub fn validate(&self) -> Vec<DiagramIssue> {
        let mut issues = Vec::new();
        let mut by_target: BTreeMap<(NodeId, u32), Vec<EdgeId>> = BTreeMap::new();

        for edge in self.edges.values() {
            for (end, direction) in [(&edge.source, Direction::Out), (&edge.target, Direction::In)] {
                match self.nodes.get(&end.node) {
                    None => issues.push(DiagramIssue::DanglingEndpoint {
                        edge: edge.id.clone(),
                        node: end.node.clone(),
                    }),
                    Some(node) if end.port >= node.port_count(direction) => {
                        issues.push(DiagramIssue::PortOutOfRange {
                            edge: edge.id.clone(),
                            node: end.node.clone(),
                            direction,
                            port: end.port,
                        })
                    }
                    Some(_) => {}
                }
            }
            by_target
                .entry((edge.target.node.clone(), edge.target.port))
                .or_default()
                .push(edge.id.clone());
        }

        for ((node, port), edges) in by_target {
            if edges.len() > 1 {
                issues.push(DiagramIssue::DuplicateInput {
                    target: PortRef { node, port },
                    edges,
                });
            }
        }

        let fed: HashSet<&NodeId> = self.edges.values().map(|e| &e.target.node).collect();
        let feeding: HashSet<&NodeId> = self.edges.values().map(|e| &e.source.node).collect();
        for node in self.nodes.values().filter(|n| n.is_junction()) {
            if (node.input_count, node.output_count) != (1, 1) {
                issues.push(DiagramIssue::MalformedJunction {
                    node: node.id.clone(),
                    input_count: node.input_count,
                    output_count: node.output_count,
                });
            }
            if !fed.contains(&node.id) {
                issues.push(DiagramIssue::UnconnectedJunction {
                    node: node.id.clone(),
                    direction: Direction::In,
                });
            }
            if !feeding.contains(&node.id) {
                issues.push(DiagramIssue::UnconnectedJunction {
                    node: node.id.clone(),
                    direction: Direction::Out,
                });
            }
        }
        issues
    }
}
