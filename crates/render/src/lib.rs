//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the [`pondlight_scene::Stage`]; they never mutate it.
//! - Render output derives only from the stage and the view.

mod renderer;

pub use renderer::{DebugTextRenderer, RenderView, Renderer};
