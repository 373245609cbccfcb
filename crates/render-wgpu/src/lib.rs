//! wgpu render backend for the pond scene.
//!
//! Draws the baked school model, the window lights, the animated pond and
//! the fireflies as additive camera-facing quads. The camera orbits a target
//! with damped pointer controls.
//!
//! # Invariants
//! - Renderer never mutates the stage.
//! - Scene vertices are baked to world space once, at upload.
//! - Fireflies are depth-tested but never write depth.

mod camera;
mod gpu;
mod shaders;

pub use camera::OrbitCamera;
pub use gpu::WgpuRenderer;
