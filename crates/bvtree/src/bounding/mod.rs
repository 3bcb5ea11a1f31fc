//! Bounding volumes and tree nodes
//!
//! - [`aabb`]: axis-aligned boxes
//! - [`obb`]: oriented boxes and their fitting ([`fit`])
//! - [`volume`]: the shared [`BoundingShape`] contract and node volume enum
//! - [`node`]: tree nodes stored in an index arena

pub mod aabb;
pub mod fit;
pub mod node;
pub mod obb;
pub mod volume;

mod slab;

pub use aabb::AxisAlignedBox;
pub use fit::FitMethod;
pub use node::{BvNode, NodeArena, NodeId};
pub use obb::OrientedBox;
pub use volume::{BoundingShape, BoundingVolume, VolumeKind};
