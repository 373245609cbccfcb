use glam::Vec3;
use pondlight_scene::{LoadStatus, Stage};
use std::fmt::Write;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera orbits and looks at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Width over height.
    pub aspect: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(4.0, 2.0, 4.0),
            target: Vec3::ZERO,
            fov_degrees: 45.0,
            aspect: 16.0 / 9.0,
        }
    }
}

/// Renderer-agnostic interface.
///
/// The renderer reads the stage and a view, then produces output.
pub trait Renderer {
    type Output;

    /// Render one frame.
    fn render(&mut self, stage: &Stage, view: &RenderView) -> Self::Output;
}

/// Renders a frame as a human-readable report.
///
/// Used by the headless CLI and in tests of the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, stage: &Stage, view: &RenderView) -> String {
        self.frames += 1;
        let u = stage.uniforms();
        let mut out = String::new();

        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "=== frame {} (t={:.3}s) clear={} ===",
            self.frames,
            u.pond.time,
            stage.settings().clear_color
        );
        let _ = writeln!(
            out,
            "camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0} aspect={:.3}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees,
            view.aspect
        );
        let _ = writeln!(
            out,
            "pond: time={:.3} start={} end={}",
            u.pond.time, u.pond.color_start, u.pond.color_end
        );
        let _ = writeln!(
            out,
            "fireflies: count={} time={:.3} size={} pixel_ratio={}",
            stage.fireflies().len(),
            u.fireflies.time,
            u.fireflies.size,
            u.fireflies.pixel_ratio
        );

        match stage.status() {
            LoadStatus::Loading => out.push_str("model: loading\n"),
            LoadStatus::Failed(e) => {
                let _ = writeln!(out, "model: failed: {e}");
            }
            LoadStatus::Ready {
                nodes, triangles, ..
            } => {
                let _ = writeln!(out, "model: {nodes} nodes, {triangles} triangles");
            }
        }
        if let Some(e) = stage.texture_error() {
            let _ = writeln!(out, "texture: failed: {e}");
        }

        if let Some(scene) = stage.scene() {
            for (index, node) in scene.graph.nodes().iter().enumerate() {
                let p = node.transform.position;
                let material = scene
                    .bindings
                    .get(index)
                    .map(|m| format!("{m:?}"))
                    .unwrap_or_else(|| "-".into());
                let _ = writeln!(
                    out,
                    "  [{index}] {:?} pos=({:.2}, {:.2}, {:.2}) material={material}",
                    node.name, p.x, p.y, p.z
                );
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pondlight_assets::{LoadError, SceneGraph, SceneNode};
    use pondlight_common::Transform;
    use pondlight_scene::{DebugParams, FireflySet, MissingNodePolicy};
    use std::time::Duration;

    fn stage() -> Stage {
        Stage::new(
            DebugParams::default(),
            FireflySet::from_seed(30, 3),
            2.0,
            MissingNodePolicy::Skip,
        )
    }

    #[test]
    fn text_render_while_loading() {
        let mut renderer = DebugTextRenderer::new();
        let out = renderer.render(&stage(), &RenderView::default());
        assert!(out.contains("frame 1"));
        assert!(out.contains("clear=#9ae4d5"));
        assert!(out.contains("count=30"));
        assert!(out.contains("model: loading"));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn text_render_lists_bound_nodes() {
        let mut s = stage();
        s.attach_scene(
            SceneGraph::new(vec![SceneNode {
                name: "pond".into(),
                transform: Transform::default(),
                primitives: Vec::new(),
            }]),
            Duration::ZERO,
        )
        .unwrap();
        let out = DebugTextRenderer::new().render(&s, &RenderView::default());
        assert!(out.contains("model: 1 nodes"));
        assert!(out.contains("\"pond\""));
        assert!(out.contains("material=Pond"));
    }

    #[test]
    fn text_render_reports_texture_failure() {
        let mut s = stage();
        let out = DebugTextRenderer::new().render(&s, &RenderView::default());
        assert!(!out.contains("texture:"));

        s.fail_texture(&LoadError::NoScene);
        let out = DebugTextRenderer::new().render(&s, &RenderView::default());
        assert!(out.contains("texture: failed:"));
        assert!(out.contains("model: loading"));
    }

    #[test]
    fn render_view_default_matches_initial_camera() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 45.0);
        assert_eq!(view.eye, Vec3::new(4.0, 2.0, 4.0));
    }
}
