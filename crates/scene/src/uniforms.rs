use crate::debug_params::{DebugParams, ParamChange, ParamObserver};
use pondlight_common::Color;

/// Inputs of the pond surface shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PondUniforms {
    pub time: f32,
    pub color_start: Color,
    pub color_end: Color,
}

/// Inputs of the firefly shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirefliesUniforms {
    pub time: f32,
    pub size: f32,
    pub pixel_ratio: f32,
}

/// All time- and panel-driven shader inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneUniforms {
    pub pond: PondUniforms,
    pub fireflies: FirefliesUniforms,
}

impl SceneUniforms {
    pub fn new(params: &DebugParams, pixel_ratio: f32) -> Self {
        Self {
            pond: PondUniforms {
                time: 0.0,
                color_start: params.pond_color_start,
                color_end: params.pond_color_end,
            },
            fireflies: FirefliesUniforms {
                time: 0.0,
                size: params.fireflies_size,
                pixel_ratio,
            },
        }
    }

    /// Set both time uniforms to the elapsed seconds since start.
    pub fn advance(&mut self, elapsed: f32) {
        self.pond.time = elapsed;
        self.fireflies.time = elapsed;
    }

    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.fireflies.pixel_ratio = pixel_ratio;
    }
}

impl ParamObserver for SceneUniforms {
    fn param_changed(&mut self, change: &ParamChange) {
        match *change {
            ParamChange::PondColorStart(c) => self.pond.color_start = c,
            ParamChange::PondColorEnd(c) => self.pond.color_end = c,
            ParamChange::FirefliesSize(s) => self.fireflies.size = s,
            ParamChange::BackgroundColor(_) => {}
        }
    }
}

/// Renderer-level settings driven by the panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub clear_color: Color,
}

impl RenderSettings {
    pub fn new(params: &DebugParams) -> Self {
        Self {
            clear_color: params.background_color,
        }
    }
}

impl ParamObserver for RenderSettings {
    fn param_changed(&mut self, change: &ParamChange) {
        if let ParamChange::BackgroundColor(c) = *change {
            self.clear_color = c;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pond_start_change_touches_only_pond_start() {
        let mut params = DebugParams::default();
        let mut uniforms = SceneUniforms::new(&params, 1.0);
        let mut settings = RenderSettings::new(&params);
        let before_uniforms = uniforms;
        let before_settings = settings;

        let picked = Color::from_rgb8([0x12, 0x34, 0x56]);
        assert!(params.apply(
            ParamChange::PondColorStart(picked),
            &mut [&mut uniforms, &mut settings]
        ));

        assert_eq!(uniforms.pond.color_start, picked);
        assert_eq!(uniforms.pond.color_end, before_uniforms.pond.color_end);
        assert_eq!(uniforms.fireflies, before_uniforms.fireflies);
        assert_eq!(settings, before_settings);
    }

    #[test]
    fn background_change_reaches_settings_only() {
        let mut params = DebugParams::default();
        let mut uniforms = SceneUniforms::new(&params, 2.0);
        let mut settings = RenderSettings::new(&params);
        let before = uniforms;

        params.apply(
            ParamChange::BackgroundColor(Color::BLACK),
            &mut [&mut uniforms, &mut settings],
        );
        assert_eq!(settings.clear_color, Color::BLACK);
        assert_eq!(uniforms, before);
    }

    #[test]
    fn advance_sets_both_times() {
        let mut uniforms = SceneUniforms::new(&DebugParams::default(), 1.0);
        uniforms.advance(3.25);
        assert_eq!(uniforms.pond.time, 3.25);
        assert_eq!(uniforms.fireflies.time, 3.25);
    }
}
