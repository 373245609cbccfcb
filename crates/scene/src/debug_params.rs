use pondlight_common::Color;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

/// Allowed firefly point sizes, in pixels before perspective.
pub const FIREFLIES_SIZE_RANGE: RangeInclusive<f32> = 0.0..=500.0;

/// Errors from reading a debug parameter file.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("fireflies_size {0} outside 0..=500")]
    SizeOutOfRange(f32),
}

/// The values exposed on the debug panel.
///
/// Missing fields in a parameter file fall back to the defaults below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugParams {
    pub pond_color_start: Color,
    pub pond_color_end: Color,
    pub background_color: Color,
    pub fireflies_size: f32,
}

impl Default for DebugParams {
    fn default() -> Self {
        Self {
            pond_color_start: Color::from_rgb8([0x1a, 0xf0, 0xff]),
            pond_color_end: Color::from_rgb8([0x16, 0xdb, 0xe9]),
            background_color: Color::from_rgb8([0x9a, 0xe4, 0xd5]),
            fireflies_size: 30.0,
        }
    }
}

/// A single edit made on the debug panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamChange {
    PondColorStart(Color),
    PondColorEnd(Color),
    BackgroundColor(Color),
    FirefliesSize(f32),
}

/// Anything that mirrors a debug parameter: uniforms, renderer settings.
pub trait ParamObserver {
    fn param_changed(&mut self, change: &ParamChange);
}

impl DebugParams {
    pub fn from_json_str(s: &str) -> Result<Self, ParamsError> {
        let params: Self = serde_json::from_str(s)?;
        if !FIREFLIES_SIZE_RANGE.contains(&params.fireflies_size) {
            return Err(ParamsError::SizeOutOfRange(params.fireflies_size));
        }
        Ok(params)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Store `change` and forward it to `observers`.
    ///
    /// Sizes are clamped to [`FIREFLIES_SIZE_RANGE`] and rounded to whole
    /// pixels. Returns `false` without notifying when nothing changed.
    pub fn apply(&mut self, change: ParamChange, observers: &mut [&mut dyn ParamObserver]) -> bool {
        let change = match change {
            ParamChange::FirefliesSize(size) => ParamChange::FirefliesSize(
                size.clamp(*FIREFLIES_SIZE_RANGE.start(), *FIREFLIES_SIZE_RANGE.end())
                    .round(),
            ),
            other => other,
        };

        let slot_changed = match change {
            ParamChange::PondColorStart(c) => replace(&mut self.pond_color_start, c),
            ParamChange::PondColorEnd(c) => replace(&mut self.pond_color_end, c),
            ParamChange::BackgroundColor(c) => replace(&mut self.background_color, c),
            ParamChange::FirefliesSize(s) => replace(&mut self.fireflies_size, s),
        };
        if !slot_changed {
            return false;
        }

        tracing::debug!(?change, "debug parameter changed");
        for observer in observers.iter_mut() {
            observer.param_changed(&change);
        }
        true
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
