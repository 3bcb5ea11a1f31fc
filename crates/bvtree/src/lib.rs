//! # BV Tree
//!
//! Bounding volume hierarchies over axis-aligned or oriented boxes, for
//! broad-phase collision detection and spatial queries on deforming meshes.
//!
//! ## Features
//!
//! - **Two box types**: axis-aligned boxes and oriented boxes fitted by
//!   convex hull, element covariance or point covariance
//! - **Refit without rebuild**: `update` tracks moving elements while the
//!   topology stays fixed
//! - **Queries**: point, sphere, plane, line and segment queries, plus
//!   tree-against-tree intersection through a separating axis test
//! - **Placement**: each tree has a base-to-world pose
//!
//! ## Quick Start
//!
//! ```rust
//! use bvtree::prelude::*;
//!
//! let tris = vec![
//!     Triangle::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)),
//!     Triangle::new(Point3::new(2.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0), Point3::new(2.0, 1.0, 0.0)),
//! ];
//! let tree = BoundingVolumeTree::from_elements(&tris, TreeConfig::new(VolumeKind::Aabb).with_max_leaf_elements(1))?;
//! let hits = tree.intersect_point(&Point3::new(0.25, 0.25, 0.0));
//! assert_eq!(hits.len(), 1);
//! assert_eq!(tree.leaf_elements(hits[0]), &[0]);
//! # Ok::<(), BvhError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::many_single_char_names)]

pub mod bounding;
pub mod collision;
pub mod config;
pub mod error;
pub mod foundation;
pub mod geometry;
pub mod spatial;

pub use error::BvhError;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        bounding::{AxisAlignedBox, BoundingShape, BoundingVolume, BvNode, FitMethod, NodeId, OrientedBox, VolumeKind},
        collision::BoxDisjointTester,
        config::{Config, ConfigError, TreeConfig},
        error::BvhError,
        foundation::math::{Point3, RigidTransform, Rotation, Vec3},
        geometry::{Boundable, LineSegment, MeshFace, Triangle},
        spatial::BoundingVolumeTree,
    };
}
