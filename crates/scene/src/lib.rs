//! Scene state for the pond, the fireflies and the school model.
//!
//! Everything here is renderer-agnostic: the GPU backend reads a [`Stage`]
//! each frame and never writes to it.
//!
//! # Invariants
//! - Debug parameters change only through [`DebugParams::apply`], which
//!   notifies every observer it is given.
//! - Both time uniforms always carry the same elapsed value.
//! - The frame loop stops once its [`CancelToken`] is set.

mod debug_params;
mod fireflies;
mod frame;
mod materials;
mod stage;
mod uniforms;
mod viewport;

pub use debug_params::{DebugParams, FIREFLIES_SIZE_RANGE, ParamChange, ParamObserver, ParamsError};
pub use fireflies::{FIREFLY_COUNT, Firefly, FireflySet};
pub use frame::{CancelToken, FrameLoop, FrameTick, SteppedClock, SystemClock, TimeSource};
pub use materials::{
    AssignError, MaterialBindings, MaterialKind, MissingNodePolicy, NAMED_MATERIALS, bind_materials,
};
pub use stage::{BoundScene, LoadStatus, Stage};
pub use uniforms::{FirefliesUniforms, PondUniforms, RenderSettings, SceneUniforms};
pub use viewport::{MAX_PIXEL_RATIO, Viewport, clamp_pixel_ratio};
