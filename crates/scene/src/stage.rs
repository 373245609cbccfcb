use crate::debug_params::{DebugParams, ParamChange};
use crate::fireflies::FireflySet;
use crate::frame::FrameTick;
use crate::materials::{AssignError, MaterialBindings, MissingNodePolicy, bind_materials};
use crate::uniforms::{RenderSettings, SceneUniforms};
use crate::viewport::Viewport;
use pondlight_assets::{LoadError, SceneGraph};
use std::time::Duration;

/// Progress of the one model load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready {
        nodes: usize,
        triangles: usize,
        elapsed: Duration,
    },
    Failed(String),
}

/// A loaded model with a material bound to each top-level node.
#[derive(Debug, Clone)]
pub struct BoundScene {
    pub graph: SceneGraph,
    pub bindings: MaterialBindings,
}

/// Everything drawn each frame, owned in one place.
///
/// The model is absent until its load completes; fireflies and the
/// background render from the first frame.
pub struct Stage {
    params: DebugParams,
    uniforms: SceneUniforms,
    settings: RenderSettings,
    fireflies: FireflySet,
    scene: Option<BoundScene>,
    status: LoadStatus,
    texture_error: Option<String>,
    policy: MissingNodePolicy,
}

impl Stage {
    pub fn new(
        params: DebugParams,
        fireflies: FireflySet,
        pixel_ratio: f32,
        policy: MissingNodePolicy,
    ) -> Self {
        Self {
            uniforms: SceneUniforms::new(&params, pixel_ratio),
            settings: RenderSettings::new(&params),
            params,
            fireflies,
            scene: None,
            status: LoadStatus::Loading,
            texture_error: None,
            policy,
        }
    }

    pub fn params(&self) -> &DebugParams {
        &self.params
    }

    pub fn uniforms(&self) -> &SceneUniforms {
        &self.uniforms
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn fireflies(&self) -> &FireflySet {
        &self.fireflies
    }

    pub fn scene(&self) -> Option<&BoundScene> {
        self.scene.as_ref()
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Why the baked texture could not be used, if it could not.
    pub fn texture_error(&self) -> Option<&str> {
        self.texture_error.as_deref()
    }

    /// Route a panel edit through the parameters to uniforms and settings.
    pub fn set_param(&mut self, change: ParamChange) -> bool {
        let Self {
            params,
            uniforms,
            settings,
            ..
        } = self;
        params.apply(change, &mut [uniforms, settings])
    }

    /// Per-frame update of the time uniforms.
    pub fn advance(&mut self, tick: &FrameTick) {
        self.uniforms.advance(tick.elapsed);
    }

    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.uniforms.set_pixel_ratio(pixel_ratio);
    }

    /// Apply a window resize to `viewport` and carry the new pixel ratio
    /// into the firefly uniforms. Zero-sized resizes change nothing.
    pub fn resize(
        &mut self,
        viewport: &mut Viewport,
        width: u32,
        height: u32,
        scale_factor: f64,
    ) -> bool {
        if !viewport.resize(width, height, scale_factor) {
            return false;
        }
        self.set_pixel_ratio(viewport.pixel_ratio);
        true
    }

    /// Bind materials to a freshly loaded model and make it visible.
    /// On failure the model stays hidden and the status carries the error.
    pub fn attach_scene(
        &mut self,
        graph: SceneGraph,
        elapsed: Duration,
    ) -> Result<&BoundScene, AssignError> {
        let bindings = match bind_materials(&graph, self.policy) {
            Ok(b) => b,
            Err(e) => {
                tracing::error!("cannot show model: {e}");
                self.status = LoadStatus::Failed(e.to_string());
                return Err(e);
            }
        };
        self.status = LoadStatus::Ready {
            nodes: graph.len(),
            triangles: graph.triangle_count(),
            elapsed,
        };
        tracing::info!(nodes = graph.len(), "model added to stage");
        Ok(self.scene.insert(BoundScene { graph, bindings }))
    }

    pub fn fail_load(&mut self, err: &LoadError) {
        tracing::error!("model load failed: {err}");
        self.status = LoadStatus::Failed(err.to_string());
    }

    /// The model can still show with a placeholder; keep the reason.
    pub fn fail_texture(&mut self, err: &LoadError) {
        tracing::error!("baked texture unavailable: {err}");
        self.texture_error = Some(err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fireflies::FIREFLY_COUNT;
    use crate::materials::MaterialKind;
    use pondlight_assets::SceneNode;
    use pondlight_common::{Color, Transform};

    fn stage(policy: MissingNodePolicy) -> Stage {
        Stage::new(
            DebugParams::default(),
            FireflySet::from_seed(FIREFLY_COUNT, 1),
            1.0,
            policy,
        )
    }

    fn graph(names: &[&str]) -> SceneGraph {
        SceneGraph::new(
            names
                .iter()
                .map(|n| SceneNode {
                    name: n.to_string(),
                    transform: Transform::default(),
                    primitives: Vec::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn starts_loading_with_fireflies() {
        let s = stage(MissingNodePolicy::Fail);
        assert_eq!(s.status(), &LoadStatus::Loading);
        assert!(s.scene().is_none());
        assert_eq!(s.fireflies().len(), 30);
        assert_eq!(s.settings().clear_color.to_hex(), "#9ae4d5");
    }

    #[test]
    fn attach_complete_model() {
        let mut s = stage(MissingNodePolicy::Fail);
        let bound = s
            .attach_scene(
                graph(&["school-scene", "school-windows", "school-windows-up", "pond"]),
                Duration::from_millis(5),
            )
            .unwrap();
        assert_eq!(bound.bindings.get(3), Some(MaterialKind::Pond));
        assert!(matches!(s.status(), LoadStatus::Ready { nodes: 4, .. }));
        assert!(s.scene().is_some());
    }

    #[test]
    fn incomplete_model_is_reported_not_shown() {
        let mut s = stage(MissingNodePolicy::Fail);
        assert!(s.attach_scene(graph(&["pond"]), Duration::ZERO).is_err());
        assert!(s.scene().is_none());
        match s.status() {
            LoadStatus::Failed(msg) => assert!(msg.contains("school-scene")),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn load_failure_is_recorded() {
        let mut s = stage(MissingNodePolicy::Fail);
        s.fail_load(&LoadError::NoScene);
        assert!(matches!(s.status(), LoadStatus::Failed(_)));
    }

    #[test]
    fn set_param_reaches_uniforms_and_settings() {
        let mut s = stage(MissingNodePolicy::Fail);
        let c = Color::from_rgb8([1, 2, 3]);
        assert!(s.set_param(ParamChange::PondColorStart(c)));
        assert!(s.set_param(ParamChange::BackgroundColor(c)));
        assert!(s.set_param(ParamChange::FirefliesSize(99.0)));
        assert_eq!(s.uniforms().pond.color_start, c);
        assert_eq!(s.settings().clear_color, c);
        assert_eq!(s.uniforms().fireflies.size, 99.0);
        assert_eq!(s.params().fireflies_size, 99.0);
    }

    #[test]
    fn construction_mirrors_params() {
        let params = DebugParams {
            pond_color_start: Color::from_rgb8([1, 1, 1]),
            pond_color_end: Color::from_rgb8([2, 2, 2]),
            background_color: Color::from_rgb8([3, 3, 3]),
            fireflies_size: 120.0,
        };
        let s = Stage::new(
            params,
            FireflySet::from_seed(FIREFLY_COUNT, 1),
            1.5,
            MissingNodePolicy::Fail,
        );
        assert_eq!(s.uniforms().pond.color_start, params.pond_color_start);
        assert_eq!(s.uniforms().pond.color_end, params.pond_color_end);
        assert_eq!(s.uniforms().fireflies.size, 120.0);
        assert_eq!(s.uniforms().fireflies.pixel_ratio, 1.5);
        assert_eq!(s.settings().clear_color, params.background_color);
    }

    #[test]
    fn resize_updates_firefly_pixel_ratio_only() {
        let mut s = stage(MissingNodePolicy::Fail);
        let mut viewport = Viewport::new(1280, 720, 1.0);
        let pond = s.uniforms().pond;
        let size = s.uniforms().fireflies.size;

        assert!(s.resize(&mut viewport, 3000, 1500, 3.0));
        assert_eq!(viewport.pixel_ratio, 2.0);
        assert_eq!(s.uniforms().fireflies.pixel_ratio, 2.0);
        assert_eq!(s.uniforms().fireflies.size, size);
        assert_eq!(s.uniforms().pond, pond);

        // Minimised: neither the viewport nor the uniform moves.
        let before = viewport;
        assert!(!s.resize(&mut viewport, 0, 0, 1.0));
        assert_eq!(viewport, before);
        assert_eq!(s.uniforms().fireflies.pixel_ratio, 2.0);
    }

    #[test]
    fn texture_failure_keeps_model_status() {
        let mut s = stage(MissingNodePolicy::Skip);
        s.fail_texture(&LoadError::NoScene);
        s.attach_scene(graph(&["school-scene"]), Duration::ZERO)
            .unwrap();
        assert!(matches!(s.status(), LoadStatus::Ready { .. }));
        assert!(s.texture_error().is_some());
    }

    #[test]
    fn advance_moves_both_times() {
        let mut s = stage(MissingNodePolicy::Fail);
        s.advance(&FrameTick {
            index: 0,
            elapsed: 1.5,
            delta: 1.5,
        });
        assert_eq!(s.uniforms().pond.time, 1.5);
        assert_eq!(s.uniforms().fireflies.time, 1.5);
    }
}
