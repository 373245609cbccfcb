//! Pointer input mapped to orbit-camera actions.
//!
//! # Invariants
//! - The camera consumes [`CameraAction`]s, never raw window events.
//! - Pointer input captured by the debug panel produces no camera action.

pub mod action;

pub use action::{CameraAction, PointerButton, PointerState};
