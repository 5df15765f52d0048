//! Input mapping: pointer events drive the view controller, key presses
//! become viewer actions.
//!
//! # Invariants
//! - The accumulated view matrix is the only camera state.
//! - Drag rotations pre-multiply (world space); wheel translations
//!   post-multiply.
//! - Window-system types never cross into this crate; hosts translate
//!   their events into [`PointerEvent`] and key characters.

pub mod action;
pub mod view;

pub use action::{Action, action_for_key};
pub use view::{DragState, PointerEvent, ViewController, ViewSettings};
