//! Collision detection between bounding volumes

pub mod disjoint;

pub use disjoint::{boxes_disjoint, is_disjoint, BoxDisjointTester};
