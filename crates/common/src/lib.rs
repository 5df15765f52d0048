//! Shared value types for the meshview workspace.
//!
//! # Invariants
//! - Euler rotations always compose X, then Y, then Z.
//! - Angles are radians everywhere except where a name says `_degrees`.

mod types;

pub use types::{DrawMode, NodeId, Transform, compose_placement};
