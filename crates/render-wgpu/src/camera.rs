use glam::{Mat4, Vec3};
use pondlight_input::CameraAction;
use pondlight_render::RenderView;
use pondlight_scene::Viewport;
use std::f32::consts::{PI, TAU};

/// Keeps the polar angle off the poles so `look_at` stays defined.
const POLAR_EPSILON: f32 = 1e-3;
/// Pending motion below this is dropped.
const SETTLE_EPSILON: f32 = 1e-5;

/// Perspective camera orbiting a target, with damped pointer controls.
///
/// Pointer actions accumulate as pending motion; each [`OrbitCamera::update`]
/// applies a `damping_factor` share of it and decays the rest.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub radius: f32,
    /// Angle around +Y, measured from +Z towards +X.
    pub azimuth: f32,
    /// Angle from +Y.
    pub polar: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    viewport_height: f32,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_pan: Vec3,
    pending_scale: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_at(Vec3::new(4.0, 2.0, 4.0), Vec3::ZERO)
    }
}

impl OrbitCamera {
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let radius = offset.length().max(f32::EPSILON);
        Self {
            target,
            radius,
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            fov: 45.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_radius: 0.5,
            max_radius: 50.0,
            viewport_height: 720.0,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_pan: Vec3::ZERO,
            pending_scale: 1.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + self.radius * Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a)
    }

    /// Match the projection to the output surface.
    pub fn resize(&mut self, viewport: &Viewport) {
        self.aspect = viewport.aspect();
        self.viewport_height = viewport.height as f32;
    }

    /// Queue pointer motion; it takes effect over the next updates.
    pub fn apply(&mut self, action: CameraAction) {
        match action {
            CameraAction::Orbit { dx, dy } => {
                let per_pixel = TAU / self.viewport_height * self.rotate_speed;
                self.pending_azimuth -= dx * per_pixel;
                self.pending_polar -= dy * per_pixel;
            }
            CameraAction::Pan { dx, dy } => {
                // One viewport height of drag moves the target one visible
                // frustum height at the target distance.
                let visible = 2.0 * self.radius * (self.fov * 0.5).tan();
                let per_pixel = visible / self.viewport_height;
                let view = self.view_matrix();
                let right = view.row(0).truncate();
                let up = view.row(1).truncate();
                self.pending_pan += (-dx * right + dy * up) * per_pixel;
            }
            CameraAction::Zoom { steps } => {
                self.pending_scale *= 0.95_f32.powf(self.zoom_speed * steps);
            }
        }
    }

    /// Advance damping by one step. Returns whether the camera moved.
    pub fn update(&mut self) -> bool {
        let before = (self.target, self.radius, self.azimuth, self.polar);
        let d = self.damping_factor;

        self.azimuth = (self.azimuth + self.pending_azimuth * d).rem_euclid(TAU);
        self.polar = (self.polar + self.pending_polar * d).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        self.radius = (self.radius * self.pending_scale).clamp(self.min_radius, self.max_radius);
        self.target += self.pending_pan * d;

        self.pending_azimuth *= 1.0 - d;
        self.pending_polar *= 1.0 - d;
        self.pending_pan *= 1.0 - d;
        self.pending_scale = 1.0;
        if self.pending_azimuth.abs() < SETTLE_EPSILON {
            self.pending_azimuth = 0.0;
        }
        if self.pending_polar.abs() < SETTLE_EPSILON {
            self.pending_polar = 0.0;
        }
        if self.pending_pan.length_squared() < SETTLE_EPSILON * SETTLE_EPSILON {
            self.pending_pan = Vec3::ZERO;
        }

        before != (self.target, self.radius, self.azimuth, self.polar)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn view(&self) -> RenderView {
        RenderView {
            eye: self.position(),
            target: self.target,
            fov_degrees: self.fov.to_degrees(),
            aspect: self.aspect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_sits_at_initial_position() {
        let cam = OrbitCamera::default();
        assert!((cam.position() - Vec3::new(4.0, 2.0, 4.0)).length() < 1e-4);
        assert!((cam.radius - 6.0).abs() < 1e-5);
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn resize_sets_aspect_idempotently() {
        let mut cam = OrbitCamera::default();
        let viewport = Viewport::new(1920, 1080, 1.0);
        cam.resize(&viewport);
        let once = (cam.aspect, cam.projection_matrix());
        cam.resize(&viewport);
        assert_eq!(once, (cam.aspect, cam.projection_matrix()));
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn orbit_is_damped() {
        let mut cam = OrbitCamera::default();
        let start = cam.azimuth;
        cam.apply(CameraAction::Orbit { dx: 100.0, dy: 0.0 });
        assert!(cam.update());
        let first_step = (cam.azimuth - start).abs();
        assert!(cam.update());
        let second_step = (cam.azimuth - start).abs() - first_step;
        assert!(second_step > 0.0 && second_step < first_step);
        // Orbiting keeps the distance to the target.
        assert!((cam.position().distance(cam.target) - 6.0).abs() < 1e-4);
    }

    #[test]
    fn motion_settles() {
        let mut cam = OrbitCamera::default();
        cam.apply(CameraAction::Orbit { dx: 10.0, dy: 10.0 });
        let mut steps = 0;
        while cam.update() {
            steps += 1;
            assert!(steps < 2000, "camera never settled");
        }
        assert!(!cam.update());
    }

    #[test]
    fn polar_is_clamped() {
        let mut cam = OrbitCamera::default();
        cam.damping_factor = 1.0;
        cam.apply(CameraAction::Orbit { dx: 0.0, dy: 100_000.0 });
        cam.update();
        assert!(cam.polar >= POLAR_EPSILON);
        assert!(!cam.view_matrix().col(0).x.is_nan());
    }

    #[test]
    fn zoom_changes_radius_within_bounds() {
        let mut cam = OrbitCamera::default();
        cam.apply(CameraAction::Zoom { steps: 1.0 });
        cam.update();
        assert!(cam.radius < 6.0);
        cam.apply(CameraAction::Zoom { steps: -10_000.0 });
        cam.update();
        assert_eq!(cam.radius, cam.max_radius);
    }

    #[test]
    fn pan_moves_target() {
        let mut cam = OrbitCamera::default();
        cam.apply(CameraAction::Pan { dx: 50.0, dy: 0.0 });
        cam.update();
        assert_ne!(cam.target, Vec3::ZERO);
    }

    #[test]
    fn view_reports_degrees() {
        let view = OrbitCamera::default().view();
        assert!((view.fov_degrees - 45.0).abs() < 1e-4);
    }
}
