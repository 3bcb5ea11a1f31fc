//! Geometric elements stored in bounding volume trees

pub mod boundable;
pub mod hull;
pub mod primitives;

pub use boundable::Boundable;
pub use primitives::{LineSegment, MeshFace, Triangle};
