//! Spatial partitioning data structures
//!
//! Provides bounding volume hierarchies for collision detection,
//! ray casting, and proximity queries over deforming geometry.

pub mod tree;

pub use tree::BoundingVolumeTree;
