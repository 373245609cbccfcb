/// Upper bound on the pixel ratio used for rendering.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Pixel ratio used for rendering: the device ratio, capped at
/// [`MAX_PIXEL_RATIO`]. Non-finite or negative inputs fall back to 1.
pub fn clamp_pixel_ratio(scale_factor: f64) -> f32 {
    if scale_factor.is_finite() && scale_factor >= 0.0 {
        scale_factor.min(MAX_PIXEL_RATIO) as f32
    } else {
        1.0
    }
}

/// Output surface dimensions and derived projection inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Surface width in physical pixels, never zero.
    pub width: u32,
    /// Surface height in physical pixels, never zero.
    pub height: u32,
    pub scale_factor: f64,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            scale_factor,
            pixel_ratio: clamp_pixel_ratio(scale_factor),
        }
    }

    /// Apply a window resize. Zero-sized windows (minimised) are ignored and
    /// leave the viewport untouched; returns whether anything was applied.
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) -> bool {
        if width == 0 || height == 0 {
            tracing::debug!(width, height, "ignoring zero-sized viewport");
            return false;
        }
        *self = Self::new(width, height, scale_factor);
        tracing::debug!(
            width,
            height,
            pixel_ratio = self.pixel_ratio,
            "viewport resized"
        );
        true
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Size of the 3D render target: the logical window size times
    /// `pixel_ratio`. Below a scale factor of 2 this is the physical size;
    /// above it the scene renders at twice the logical size and is
    /// stretched to the window.
    pub fn render_size(&self) -> (u32, u32) {
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return (self.width, self.height);
        }
        let scale = self.pixel_ratio as f64 / self.scale_factor;
        let side = |physical: u32| ((physical as f64 * scale).round() as u32).clamp(1, physical);
        (side(self.width), side(self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pixel_ratio_is_min_of_input_and_two(dpr in 0.0f64..16.0) {
            prop_assert_eq!(clamp_pixel_ratio(dpr), dpr.min(2.0) as f32);
        }

        #[test]
        fn resize_is_idempotent(w in 1u32..8000, h in 1u32..8000, dpr in 0.5f64..4.0) {
            let mut once = Viewport::new(800, 600, 1.0);
            once.resize(w, h, dpr);
            let mut twice = once;
            twice.resize(w, h, dpr);
            prop_assert_eq!(once, twice);
            prop_assert_eq!(once.aspect(), twice.aspect());
            prop_assert_eq!(once.render_size(), twice.render_size());
        }

        #[test]
        fn render_size_is_logical_times_pixel_ratio(w in 1u32..8000, h in 1u32..8000, dpr in 0.5f64..4.0) {
            let vp = Viewport::new(w, h, dpr);
            let (rw, rh) = vp.render_size();
            prop_assert!(rw >= 1 && rw <= w);
            prop_assert!(rh >= 1 && rh <= h);
            if dpr <= 2.0 {
                prop_assert_eq!((rw, rh), (w, h));
            } else {
                let expected = ((w as f64 * (2.0 / dpr)).round() as u32).max(1);
                prop_assert_eq!(rw, expected.min(w));
            }
        }
    }

    #[test]
    fn pixel_ratio_edge_cases() {
        assert_eq!(clamp_pixel_ratio(1.0), 1.0);
        assert_eq!(clamp_pixel_ratio(2.0), 2.0);
        assert_eq!(clamp_pixel_ratio(3.0), 2.0);
        assert_eq!(clamp_pixel_ratio(0.0), 0.0);
        assert_eq!(clamp_pixel_ratio(f64::NAN), 1.0);
        assert_eq!(clamp_pixel_ratio(-1.0), 1.0);
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let mut vp = Viewport::new(1280, 720, 1.5);
        let before = vp;
        assert!(!vp.resize(0, 720, 1.5));
        assert!(!vp.resize(1280, 0, 1.5));
        assert_eq!(vp, before);
    }

    #[test]
    fn aspect_follows_size() {
        let mut vp = Viewport::new(1280, 720, 1.0);
        assert!(vp.resize(1000, 500, 3.0));
        assert_eq!(vp.aspect(), 2.0);
        assert_eq!(vp.pixel_ratio, 2.0);
    }

    #[test]
    fn dense_display_renders_at_capped_ratio() {
        let vp = Viewport::new(3000, 1500, 3.0);
        assert_eq!(vp.pixel_ratio, 2.0);
        assert_eq!(vp.render_size(), (2000, 1000));

        let retina = Viewport::new(2560, 1440, 2.0);
        assert_eq!(retina.render_size(), (2560, 1440));
    }
}
