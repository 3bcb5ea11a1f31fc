//! Bounding volume tree
//!
//! A hierarchy of axis-aligned or oriented boxes over a caller-owned slice
//! of elements. Leaves store element indices; every node's volume encloses
//! all elements below it, and every parent volume encloses its children's
//! volumes, so a query can prune any subtree whose volume it misses.
//!
//! The tree has its own base frame placed in the world by
//! [`BoundingVolumeTree::bvh_to_world`]. Query inputs are world
//! coordinates and are moved into the base frame before descending.

use std::fmt;

use crate::bounding::{
    AxisAlignedBox, BoundingShape, BoundingVolume, BvNode, NodeArena, NodeId, OrientedBox, VolumeKind,
};
use crate::collision::BoxDisjointTester;
use crate::config::TreeConfig;
use crate::error::BvhError;
use crate::foundation::math::{is_identity, longest_axis, relative_transform, Point3, RigidTransform, Vec3};
use crate::geometry::Boundable;

/// Hierarchy of bounding boxes over a set of elements
#[derive(Debug, Clone)]
pub struct BoundingVolumeTree {
    config: TreeConfig,
    nodes: NodeArena,
    root: NodeId,
    leaves: Vec<NodeId>,
    num_elements: usize,
    bvh_to_world: RigidTransform,
    world_is_identity: bool,
}

impl BoundingVolumeTree {
    /// Empty tree with the given configuration.
    ///
    /// A negative or non-finite margin is replaced by zero.
    pub fn new(config: TreeConfig) -> Self {
        let mut config = config;
        config.margin = sanitize_margin(config.margin);
        let mut nodes = NodeArena::new();
        let root = nodes.push(BoundingVolume::empty(config.kind));
        Self {
            config,
            nodes,
            root,
            leaves: Vec::new(),
            num_elements: 0,
            bvh_to_world: RigidTransform::identity(),
            world_is_identity: true,
        }
    }

    /// Empty tree of the given box type with default settings
    pub fn with_kind(kind: VolumeKind) -> Self {
        Self::new(TreeConfig::new(kind))
    }

    /// Build a tree over `elements` using `config.max_leaf_elements`
    pub fn from_elements<B: Boundable>(elements: &[B], config: TreeConfig) -> Result<Self, BvhError> {
        let mut tree = Self::new(config);
        tree.build(elements, config.max_leaf_elements)?;
        Ok(tree)
    }

    /// Current configuration
    pub const fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Box type used by every node
    pub const fn kind(&self) -> VolumeKind {
        self.config.kind
    }

    /// Padding around each node's elements
    pub const fn margin(&self) -> f64 {
        self.config.margin
    }

    /// Set the padding used by the next build or update; negative values
    /// are clamped to zero
    pub fn set_margin(&mut self, margin: f64) {
        self.config.margin = sanitize_margin(margin);
    }

    /// Maximum number of elements per leaf
    pub const fn max_leaf_elements(&self) -> usize {
        self.config.max_leaf_elements
    }

    /// Reset to a tree holding nothing; the root becomes an empty box
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.push(BoundingVolume::empty(self.config.kind));
        self.leaves.clear();
        self.num_elements = 0;
    }

    /// Whether the tree holds no elements
    pub const fn is_empty(&self) -> bool {
        self.num_elements == 0
    }

    /// Number of elements the tree was built over
    pub const fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Number of nodes, including the root
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Root node id
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> Option<&BvNode> {
        self.nodes.get(id)
    }

    /// Node by id, failing for ids from another tree
    pub fn try_node(&self, id: NodeId) -> Result<&BvNode, BvhError> {
        self.nodes.get(id).ok_or(BvhError::InvalidNode(id))
    }

    /// All leaves in depth-first order
    pub fn leaf_nodes(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Element indices stored in leaf `id`; empty for internal nodes
    pub fn leaf_elements(&self, id: NodeId) -> &[usize] {
        self.nodes.get(id).map(BvNode::elements).unwrap_or(&[])
    }

    /// Distance of `id` from the root
    pub fn depth(&self, id: NodeId) -> Result<usize, BvhError> {
        self.try_node(id)?;
        Ok(self.nodes.depth(id))
    }

    /// Largest leaf depth; zero for a single-leaf or empty tree
    pub fn max_depth(&self) -> usize {
        self.leaves.iter().map(|&id| self.nodes.depth(id)).max().unwrap_or(0)
    }

    /// Pose of the tree's base frame in world coordinates
    pub const fn bvh_to_world(&self) -> &RigidTransform {
        &self.bvh_to_world
    }

    /// Place the tree's base frame in the world
    pub fn set_bvh_to_world(&mut self, x: RigidTransform) {
        self.world_is_identity = is_identity(&x);
        self.bvh_to_world = x;
    }

    /// Radius of the root volume; zero when empty
    pub fn radius(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.nodes[self.root].volume().radius()
        }
    }

    /// Center of the root volume in world coordinates; the world origin of
    /// the base frame when empty
    pub fn center(&self) -> Point3 {
        let local = if self.is_empty() {
            Point3::origin()
        } else {
            self.nodes[self.root].volume().center()
        };
        self.bvh_to_world.transform_point(&local)
    }

    /// Build the hierarchy over `elements`.
    ///
    /// Splits at the center of each node's longest box axis by element
    /// centroid, falling back to a median split when every centroid lands
    /// on one side. On error the tree is left empty.
    pub fn build<B: Boundable>(&mut self, elements: &[B], max_leaf_elements: usize) -> Result<(), BvhError> {
        self.clear();
        if max_leaf_elements == 0 {
            log::warn!("Refusing to build tree with max leaf size 0");
            return Err(BvhError::InvalidLeafSize(max_leaf_elements));
        }
        if elements.is_empty() {
            log::warn!("Refusing to build tree from zero elements");
            return Err(BvhError::NoElements);
        }
        self.config.max_leaf_elements = max_leaf_elements;

        if let Err(e) = self.build_nodes(elements) {
            log::warn!("Tree build failed: {e}");
            self.clear();
            return Err(e);
        }
        if self.config.kind == VolumeKind::Obb {
            self.nest_volumes();
        }
        self.num_elements = elements.len();
        self.leaves = self.collect_leaf_nodes();
        self.number_nodes();

        log::debug!(
            "Built {:?} tree: {} elements, {} nodes, {} leaves, depth {}",
            self.config.kind,
            self.num_elements,
            self.nodes.len(),
            self.leaves.len(),
            self.max_depth()
        );
        Ok(())
    }

    fn build_nodes<B: Boundable>(&mut self, elements: &[B]) -> Result<(), BvhError> {
        let centroids: Vec<Point3> = elements.iter().map(Boundable::centroid).collect();
        let mut indices: Vec<usize> = (0..elements.len()).collect();
        self.nodes.clear();

        // (parent, start, end) ranges into `indices`
        let mut stack: Vec<(Option<NodeId>, usize, usize)> = vec![(None, 0, elements.len())];
        while let Some((parent, start, end)) = stack.pop() {
            let subset = &mut indices[start..end];
            let volume = self.fit_volume(elements, subset)?;
            let id = self.nodes.push(volume);
            match parent {
                Some(p) => self.nodes.add_child(p, id),
                None => self.root = id,
            }

            if subset.len() <= self.config.max_leaf_elements {
                self.nodes[id].set_elements(subset.to_vec());
                continue;
            }
            let mid = split_elements(&volume, subset, &centroids);
            // right range first so the left child is created first
            stack.push((Some(id), start + mid, end));
            stack.push((Some(id), start, start + mid));
        }
        Ok(())
    }

    fn fit_volume<B: Boundable>(&self, elements: &[B], subset: &[usize]) -> Result<BoundingVolume, BvhError> {
        let members = subset.iter().map(|&i| &elements[i]);
        Ok(match self.config.kind {
            VolumeKind::Aabb => AxisAlignedBox::from_elements(members, self.config.margin).into(),
            VolumeKind::Obb => OrientedBox::fit(members, self.config.margin, self.config.fit_method)?.into(),
        })
    }

    /// Grow every parent volume around its children's volumes.
    ///
    /// Node ids are assigned in pre-order, so walking them backwards visits
    /// children before their parents.
    fn nest_volumes(&mut self) {
        for id in self.nodes.ids().rev() {
            if let Some(parent) = self.nodes[id].parent() {
                let child = *self.nodes[id].volume();
                self.nodes[parent].volume_mut().update_for_volume(&child, 0.0);
            }
        }
    }

    /// Refit the volumes to moved elements without changing the topology.
    ///
    /// Axis-aligned trees are recomputed tightly from the leaves upward.
    /// Oriented boxes keep their poses and only grow, so an oriented tree
    /// stays valid but loosens under large deformation.
    pub fn update<B: Boundable>(&mut self, elements: &[B]) -> Result<(), BvhError> {
        if elements.len() != self.num_elements {
            log::warn!(
                "Tree update with {} elements, built with {}",
                elements.len(),
                self.num_elements
            );
            return Err(BvhError::ElementCountMismatch {
                expected: self.num_elements,
                actual: elements.len(),
            });
        }
        if self.is_empty() {
            return Ok(());
        }

        let margin = self.config.margin;
        match self.config.kind {
            VolumeKind::Aabb => {
                for id in self.nodes.ids().rev() {
                    let node = &self.nodes[id];
                    let volume = if node.is_leaf() {
                        AxisAlignedBox::from_elements(node.elements().iter().map(|&i| &elements[i]), margin)
                    } else {
                        let mut b = AxisAlignedBox::empty();
                        for &c in node.children() {
                            if let Some(child) = self.nodes[c].volume().as_aabb() {
                                b.update_for_aabb(child, 0.0);
                            }
                        }
                        b
                    };
                    *self.nodes[id].volume_mut() = volume.into();
                }
            }
            VolumeKind::Obb => {
                for &leaf in &self.leaves {
                    let node = &mut self.nodes[leaf];
                    let members = node.elements().to_vec();
                    for i in members {
                        node.volume_mut().update_for(&elements[i], margin);
                    }
                }
                self.nest_volumes();
            }
        }
        log::trace!("Updated {} tree nodes", self.nodes.len());
        Ok(())
    }

    /// Assign depth-first numbers starting at zero for the root; returns
    /// the node count
    pub fn number_nodes(&mut self) -> usize {
        let mut count = 0;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            self.nodes[id].set_number(count);
            count += 1;
            stack.extend(self.nodes[id].children().iter().rev());
        }
        count
    }

    fn collect_leaf_nodes(&self) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.is_leaf() {
                leaves.push(id);
            } else {
                stack.extend(node.children().iter().rev());
            }
        }
        leaves
    }

    /// Check that every node's volume encloses all elements below it
    pub fn validate<B: Boundable>(&self, elements: &[B]) -> Result<(), BvhError> {
        if elements.len() != self.num_elements {
            return Err(BvhError::ElementCountMismatch {
                expected: self.num_elements,
                actual: elements.len(),
            });
        }
        if self.is_empty() {
            return Ok(());
        }
        for id in self.nodes.ids() {
            let below = self.subtree_elements(id);
            let members = below.iter().map(|&i| &elements[i]);
            if !self.nodes[id].volume().is_contained(members, 0.0) {
                return Err(BvhError::NotContained { node: id });
            }
        }
        Ok(())
    }

    fn subtree_elements(&self, id: NodeId) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            out.extend_from_slice(node.elements());
            stack.extend_from_slice(node.children());
        }
        out
    }

    fn point_to_base(&self, p: &Point3) -> Point3 {
        if self.world_is_identity {
            *p
        } else {
            self.bvh_to_world.inverse_transform_point(p)
        }
    }

    fn vector_to_base(&self, v: &Vec3) -> Vec3 {
        if self.world_is_identity {
            *v
        } else {
            self.bvh_to_world.inverse_transform_vector(v)
        }
    }

    /// Leaves whose volume contains the world point `p`
    pub fn intersect_point(&self, p: &Point3) -> Vec<NodeId> {
        let local = self.point_to_base(p);
        let mut leaves = Vec::new();
        self.collect_leaves(self.root, &|v: &BoundingVolume| v.contains_point(&local), &mut leaves);
        leaves
    }

    /// Same result and order as [`intersect_point`](Self::intersect_point)
    /// using an explicit stack
    pub fn intersect_point_iterative(&self, p: &Point3) -> Vec<NodeId> {
        let local = self.point_to_base(p);
        self.collect_leaves_iterative(|v| v.contains_point(&local))
    }

    /// Leaves whose volume intersects the sphere at `center`.
    ///
    /// Every node is tested as its box grown by `radius` along its own axes.
    /// For axis-aligned trees the result is exactly the leaves passing that
    /// test. Oriented trees may prune a leaf that passes it through a parent
    /// grown along different axes, so their result is conservative: it holds
    /// every leaf the sphere touches, and may hold leaves it misses.
    pub fn intersect_sphere(&self, center: &Point3, radius: f64) -> Vec<NodeId> {
        let local = self.point_to_base(center);
        let mut leaves = Vec::new();
        self.collect_leaves(self.root, &|v: &BoundingVolume| v.intersects_sphere(&local, radius), &mut leaves);
        leaves
    }

    /// Leaves whose volume touches the plane `normal . x = offset`
    pub fn intersect_plane(&self, normal: &Vec3, offset: f64) -> Vec<NodeId> {
        let n = self.vector_to_base(normal);
        let d = if self.world_is_identity {
            offset
        } else {
            offset - normal.dot(&self.bvh_to_world.translation.vector)
        };
        let mut leaves = Vec::new();
        self.collect_leaves(self.root, &|v: &BoundingVolume| v.intersects_plane(&n, d), &mut leaves);
        leaves
    }

    /// Leaves whose volume is crossed by `origin + t * dir` for some `t`
    /// in `[min, max]`
    pub fn intersect_line(&self, origin: &Point3, dir: &Vec3, min: f64, max: f64) -> Vec<NodeId> {
        let o = self.point_to_base(origin);
        let d = self.vector_to_base(dir);
        let mut leaves = Vec::new();
        self.collect_leaves(
            self.root,
            &|v: &BoundingVolume| v.intersects_line(&o, &d, min, max).is_some(),
            &mut leaves,
        );
        leaves
    }

    /// Leaves whose volume touches the segment `[p1, p2]`
    pub fn intersect_line_segment(&self, p1: &Point3, p2: &Point3) -> Vec<NodeId> {
        let a = self.point_to_base(p1);
        let b = self.point_to_base(p2);
        let mut leaves = Vec::new();
        self.collect_leaves(self.root, &|v: &BoundingVolume| v.intersects_line_segment(&a, &b), &mut leaves);
        leaves
    }

    fn collect_leaves<F>(&self, id: NodeId, test: &F, out: &mut Vec<NodeId>)
    where
        F: Fn(&BoundingVolume) -> bool,
    {
        let node = &self.nodes[id];
        if !test(node.volume()) {
            return;
        }
        if node.is_leaf() {
            if !node.elements().is_empty() {
                out.push(id);
            }
        } else {
            for &child in node.children() {
                self.collect_leaves(child, test, out);
            }
        }
    }

    fn collect_leaves_iterative<F>(&self, test: F) -> Vec<NodeId>
    where
        F: Fn(&BoundingVolume) -> bool,
    {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !test(node.volume()) {
                continue;
            }
            if node.is_leaf() {
                if !node.elements().is_empty() {
                    out.push(id);
                }
            } else {
                stack.extend(node.children().iter().rev());
            }
        }
        out
    }

    /// Pairs of leaves `(mine, other's)` whose volumes are not disjoint.
    ///
    /// `x21` maps the other tree's base frame into this tree's base frame.
    pub fn intersect_tree(&self, other: &Self, x21: &RigidTransform) -> Vec<(NodeId, NodeId)> {
        let mut pairs = Vec::new();
        if self.is_empty() || other.is_empty() {
            return pairs;
        }
        let tester = BoxDisjointTester::new(x21);
        self.intersect_nodes(self.root, other, other.root, &tester, &mut pairs);
        log::trace!("Tree intersection found {} leaf pairs", pairs.len());
        pairs
    }

    /// [`intersect_tree`](Self::intersect_tree) with the relative transform
    /// taken from both trees' world poses
    pub fn intersect_tree_world(&self, other: &Self) -> Vec<(NodeId, NodeId)> {
        let x21 = relative_transform(&self.bvh_to_world, &other.bvh_to_world);
        self.intersect_tree(other, &x21)
    }

    fn intersect_nodes(
        &self,
        id1: NodeId,
        other: &Self,
        id2: NodeId,
        tester: &BoxDisjointTester,
        out: &mut Vec<(NodeId, NodeId)>,
    ) {
        let n1 = &self.nodes[id1];
        let n2 = &other.nodes[id2];
        if tester.is_disjoint(n1.volume(), n2.volume()) {
            return;
        }
        match (n1.is_leaf(), n2.is_leaf()) {
            (true, true) => out.push((id1, id2)),
            (true, false) => {
                for &c2 in n2.children() {
                    self.intersect_nodes(id1, other, c2, tester, out);
                }
            }
            (false, true) => {
                for &c1 in n1.children() {
                    self.intersect_nodes(c1, other, id2, tester, out);
                }
            }
            (false, false) => {
                for &c1 in n1.children() {
                    for &c2 in n2.children() {
                        self.intersect_nodes(c1, other, c2, tester, out);
                    }
                }
            }
        }
    }

    /// Same result and order as [`intersect_tree`](Self::intersect_tree)
    /// using an explicit stack
    pub fn intersect_tree_iterative(&self, other: &Self, x21: &RigidTransform) -> Vec<(NodeId, NodeId)> {
        let mut pairs = Vec::new();
        if self.is_empty() || other.is_empty() {
            return pairs;
        }
        let tester = BoxDisjointTester::new(x21);
        let mut stack = vec![(self.root, other.root)];
        let mut next = Vec::new();
        while let Some((id1, id2)) = stack.pop() {
            let n1 = &self.nodes[id1];
            let n2 = &other.nodes[id2];
            if tester.is_disjoint(n1.volume(), n2.volume()) {
                continue;
            }
            next.clear();
            match (n1.is_leaf(), n2.is_leaf()) {
                (true, true) => pairs.push((id1, id2)),
                (true, false) => next.extend(n2.children().iter().map(|&c2| (id1, c2))),
                (false, true) => next.extend(n1.children().iter().map(|&c1| (c1, id2))),
                (false, false) => {
                    for &c1 in n1.children() {
                        next.extend(n2.children().iter().map(|&c2| (c1, c2)));
                    }
                }
            }
            stack.extend(next.iter().rev());
        }
        pairs
    }
}

impl Default for BoundingVolumeTree {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl fmt::Display for BoundingVolumeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id];
            write!(f, "{:indent$}Node {}", "", node.number(), indent = depth * 2)?;
            if node.is_leaf() {
                write!(f, " elements {:?}", node.elements())?;
            }
            writeln!(f)?;
            stack.extend(node.children().iter().rev().map(|&c| (c, depth + 1)));
        }
        Ok(())
    }
}

fn sanitize_margin(margin: f64) -> f64 {
    if margin >= 0.0 && margin.is_finite() {
        margin
    } else {
        log::warn!("Invalid tree margin {margin}, using 0");
        0.0
    }
}

/// Partition `subset` about the center of the volume's longest axis.
///
/// Returns the size of the first half, which is never zero nor the whole
/// subset.
fn split_elements(volume: &BoundingVolume, subset: &mut [usize], centroids: &[Point3]) -> usize {
    let axis = longest_axis(&volume.half_widths());
    let dir = match volume {
        BoundingVolume::Aabb(_) => Vec3::ith(axis, 1.0),
        BoundingVolume::Obb(b) => b.axis(axis),
    };
    let split = dir.dot(&volume.center().coords);
    let key = |i: usize| dir.dot(&centroids[i].coords);

    let mut mid = 0;
    for k in 0..subset.len() {
        if key(subset[k]) < split {
            subset.swap(mid, k);
            mid += 1;
        }
    }
    if mid == 0 || mid == subset.len() {
        subset.sort_by(|&a, &b| key(a).total_cmp(&key(b)));
        mid = subset.len() / 2;
    }
    mid
}
