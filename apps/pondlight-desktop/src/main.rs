use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use pondlight_assets::{AssetRequest, PendingLoad, TextureData};
use pondlight_common::Color;
use pondlight_input::{PointerButton, PointerState};
use pondlight_render_wgpu::{OrbitCamera, WgpuRenderer};
use pondlight_scene::{
    DebugParams, FIREFLIES_SIZE_RANGE, FIREFLY_COUNT, FireflySet, FrameLoop, LoadStatus,
    MissingNodePolicy, ParamChange, Stage, Viewport,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Trackpad pixels that count as one wheel notch.
const PIXELS_PER_LINE: f64 = 50.0;

#[derive(Parser)]
#[command(name = "pondlight-desktop", about = "School, pond and fireflies")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the model and the baked texture
    #[arg(long, default_value = "./static")]
    assets: PathBuf,

    /// Model file, relative to the assets directory
    #[arg(long, default_value = "school.glb")]
    model: PathBuf,

    /// Baked lighting texture, relative to the assets directory
    #[arg(long, default_value = "baked.jpg")]
    texture: PathBuf,

    /// JSON file with initial debug parameters
    #[arg(long)]
    params: Option<PathBuf>,

    /// Seed for firefly placement; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Show the model even when some expected nodes are missing
    #[arg(long)]
    allow_missing_nodes: bool,
}

/// Application state.
struct AppState {
    stage: Stage,
    camera: OrbitCamera,
    pointer: PointerState,
    viewport: Viewport,
    frame_loop: FrameLoop,
    pending: Option<PendingLoad>,
    /// Baked texture of a freshly attached scene, not yet on the GPU.
    upload: Option<TextureData>,
    cursor: Option<(f64, f64)>,
}

impl AppState {
    fn new(stage: Stage, pending: PendingLoad) -> Self {
        Self {
            stage,
            camera: OrbitCamera::default(),
            pointer: PointerState::new(),
            viewport: Viewport::new(1280, 720, 1.0),
            frame_loop: FrameLoop::new(),
            pending: Some(pending),
            upload: None,
            cursor: None,
        }
    }

    fn poll_load(&mut self) {
        let Some(pending) = &mut self.pending else {
            return;
        };
        let Some(result) = pending.poll() else {
            return;
        };
        self.pending = None;

        match result {
            Ok(assets) => {
                if let Some(e) = &assets.texture_error {
                    self.stage.fail_texture(e);
                }
                if self
                    .stage
                    .attach_scene(assets.scene, assets.elapsed)
                    .is_ok()
                {
                    self.upload = Some(assets.baked_texture);
                }
            }
            Err(e) => self.stage.fail_load(&e),
        }
    }

    /// Returns whether the resize was applied.
    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) -> bool {
        if !self
            .stage
            .resize(&mut self.viewport, size.width, size.height, scale_factor)
        {
            return false;
        }
        self.camera.resize(&self.viewport);
        true
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        let params = *self.stage.params();
        let mut changes = Vec::new();

        egui::Window::new("Debug")
            .default_width(400.0)
            .show(ctx, |ui| {
                color_row(
                    ui,
                    "pondColorStart",
                    params.pond_color_start,
                    ParamChange::PondColorStart,
                    &mut changes,
                );
                color_row(
                    ui,
                    "pondColorEnd",
                    params.pond_color_end,
                    ParamChange::PondColorEnd,
                    &mut changes,
                );
                color_row(
                    ui,
                    "backgroundColor",
                    params.background_color,
                    ParamChange::BackgroundColor,
                    &mut changes,
                );

                let mut size = params.fireflies_size;
                let slider = egui::Slider::new(&mut size, FIREFLIES_SIZE_RANGE)
                    .step_by(1.0)
                    .text("firefliesSize");
                if ui.add(slider).changed() {
                    changes.push(ParamChange::FirefliesSize(size));
                }

                ui.separator();
                match self.stage.status() {
                    LoadStatus::Loading => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Loading model");
                        });
                    }
                    LoadStatus::Ready {
                        nodes,
                        triangles,
                        elapsed,
                    } => {
                        ui.label(format!(
                            "Model: {nodes} nodes, {triangles} triangles ({:.0} ms)",
                            elapsed.as_secs_f64() * 1000.0
                        ));
                    }
                    LoadStatus::Failed(e) => {
                        ui.colored_label(egui::Color32::LIGHT_RED, format!("Model failed: {e}"));
                    }
                }
                if let Some(e) = self.stage.texture_error() {
                    ui.colored_label(egui::Color32::LIGHT_RED, format!("Baked texture: {e}"));
                }
                ui.label(format!("Fireflies: {}", self.stage.fireflies().len()));
                ui.small("LMB: Orbit | RMB: Pan | Wheel: Zoom");
            });

        for change in changes {
            self.stage.set_param(change);
        }
    }
}

fn color_row(
    ui: &mut egui::Ui,
    label: &str,
    color: Color,
    change: fn(Color) -> ParamChange,
    changes: &mut Vec<ParamChange>,
) {
    ui.horizontal(|ui| {
        let mut rgb = color.to_rgb8();
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            changes.push(change(Color::from_rgb8(rgb)));
        }
        ui.label(label);
    });
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Window and GPU resources, created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, state: &mut AppState, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Pondlight")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("pondlight_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        state.resize(window.inner_size(), window.scale_factor());

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: state.viewport.width,
            height: state.viewport.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            &state.viewport,
            state.stage.fireflies(),
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, state: &mut AppState, size: PhysicalSize<u32>, scale_factor: f64) {
        if !state.resize(size, scale_factor) {
            return;
        }
        self.config.width = state.viewport.width;
        self.config.height = state.viewport.height;
        self.surface.configure(&self.device, &self.config);
        self.renderer.resize(&self.device, &state.viewport);
        tracing::info!(
            width = state.viewport.width,
            height = state.viewport.height,
            pixel_ratio = state.viewport.pixel_ratio,
            render_size = ?self.renderer.render_size(),
            "surface resized"
        );
    }

    fn redraw(&mut self, state: &mut AppState, egui_ctx: &EguiContext, event_loop: &ActiveEventLoop) {
        let Some(tick) = state.frame_loop.tick() else {
            event_loop.exit();
            return;
        };
        state.poll_load();
        state.stage.advance(&tick);
        state.camera.update();

        if let Some(texture) = state.upload.take() {
            if let Some(scene) = state.stage.scene() {
                self.renderer
                    .set_scene(&self.device, &self.queue, scene, &texture);
            }
        }

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            &state.camera,
            &state.stage,
            &state.viewport,
        );

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
        self.window.request_redraw();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    startup_error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
            startup_error: None,
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &mut self.state, &self.egui_ctx) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("GPU setup failed: {e:#}");
                self.startup_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let consumed = gpu.egui_winit.on_window_event(&gpu.window, &event).consumed;
        self.state
            .pointer
            .set_over_ui(self.egui_ctx.wants_pointer_input());

        match event {
            WindowEvent::CloseRequested => {
                self.state.frame_loop.cancel_token().cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                let scale_factor = gpu.window.scale_factor();
                gpu.resize(&mut self.state, size, scale_factor);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = gpu.window.inner_size();
                gpu.resize(&mut self.state, size, scale_factor);
            }
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = state == ElementState::Pressed;
                // Releases always reach the pointer so a drag never sticks.
                if pressed && consumed {
                    return;
                }
                if let Some(button) = pointer_button(button) {
                    self.state.pointer.button(button, pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.state.cursor.replace((position.x, position.y));
                if let Some((x, y)) = previous {
                    let dx = (position.x - x) as f32;
                    let dy = (position.y - y) as f32;
                    if let Some(action) = self.state.pointer.motion(dx, dy) {
                        self.state.camera.apply(action);
                    }
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_LINE) as f32,
                };
                if let Some(action) = self.state.pointer.scroll(lines) {
                    self.state.camera.apply(action);
                }
            }
            WindowEvent::RedrawRequested => {
                gpu.redraw(&mut self.state, &self.egui_ctx, event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("pondlight-desktop starting");

    let params = match &cli.params {
        Some(path) => DebugParams::from_json_file(path)
            .with_context(|| format!("reading debug parameters from {}", path.display()))?,
        None => DebugParams::default(),
    };
    let fireflies = match cli.seed {
        Some(seed) => FireflySet::from_seed(FIREFLY_COUNT, seed),
        None => FireflySet::random(FIREFLY_COUNT),
    };
    let policy = if cli.allow_missing_nodes {
        MissingNodePolicy::Skip
    } else {
        MissingNodePolicy::Fail
    };

    let request = AssetRequest {
        model: cli.assets.join(&cli.model),
        baked_texture: cli.assets.join(&cli.texture),
    };
    tracing::info!(
        model = %request.model.display(),
        texture = %request.baked_texture.display(),
        "loading assets"
    );
    let pending = PendingLoad::spawn(request);

    let stage = Stage::new(params, fireflies, 1.0, policy);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(stage, pending));
    event_loop.run_app(&mut app)?;

    match app.startup_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
