//! Shared value types for the pondlight workspace.
//!
//! # Invariants
//! - Colours are stored as sRGB components in `[0, 1]`; conversion to linear
//!   happens only at the GPU boundary.

mod types;

pub use types::{Color, ColorError, Transform};
