//! Tree nodes and the arena that owns them

use std::fmt;

use super::volume::BoundingVolume;

/// Handle to a node inside a [`NodeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in its arena
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of a bounding volume tree.
///
/// Internal nodes own children and no elements; leaves own element
/// indices and no children.
#[derive(Debug, Clone)]
pub struct BvNode {
    volume: BoundingVolume,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    elements: Vec<usize>,
    number: usize,
}

impl BvNode {
    fn new(volume: BoundingVolume) -> Self {
        Self {
            volume,
            parent: None,
            children: Vec::new(),
            elements: Vec::new(),
            number: 0,
        }
    }

    /// Bounding volume of this node
    pub const fn volume(&self) -> &BoundingVolume {
        &self.volume
    }

    /// Mutable bounding volume of this node
    pub fn volume_mut(&mut self) -> &mut BoundingVolume {
        &mut self.volume
    }

    /// Parent node; `None` for the root
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Number of children
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// Indices of the elements stored in this node
    pub fn elements(&self) -> &[usize] {
        &self.elements
    }

    /// Replace the stored element indices
    pub fn set_elements(&mut self, elements: Vec<usize>) {
        self.elements = elements;
    }

    /// Whether the node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first number assigned by the owning tree
    pub const fn number(&self) -> usize {
        self.number
    }

    /// Set the depth-first number
    pub fn set_number(&mut self, number: usize) {
        self.number = number;
    }
}

/// Flat storage for tree nodes.
///
/// Nodes are addressed by [`NodeId`] and link to each other by id, so
/// parent links carry no ownership.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    nodes: Vec<BvNode>,
}

impl NodeArena {
    /// Creates an empty arena
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a detached node
    pub fn push(&mut self, volume: BoundingVolume) -> NodeId {
        self.nodes.push(BvNode::new(volume));
        NodeId(self.nodes.len() - 1)
    }

    /// Append `child` to the children of `parent` and link it back.
    ///
    /// Both ids must come from this arena.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Node by id, if it belongs to this arena
    pub fn get(&self, id: NodeId) -> Option<&BvNode> {
        self.nodes.get(id.0)
    }

    /// Mutable node by id, if it belongs to this arena
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut BvNode> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove every node
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Ids of all nodes in creation order
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + ExactSizeIterator {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Number of edges from `id` up to the root
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id).and_then(BvNode::parent);
        while let Some(p) = current {
            depth += 1;
            current = self.nodes[p.0].parent;
        }
        depth
    }
}

impl std::ops::Index<NodeId> for NodeArena {
    type Output = BvNode;

    fn index(&self, id: NodeId) -> &BvNode {
        &self.nodes[id.0]
    }
}

impl std::ops::IndexMut<NodeId> for NodeArena {
    fn index_mut(&mut self, id: NodeId) -> &mut BvNode {
        &mut self.nodes[id.0]
    }
}
