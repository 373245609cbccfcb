use crate::camera::OrbitCamera;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use pondlight_assets::TextureData;
use pondlight_scene::{BoundScene, FireflySet, MaterialKind, Stage, Viewport};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Samples per pixel of the scene pass.
const SAMPLE_COUNT: u32 = 4;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    viewport: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PondUniform {
    color_start: [f32; 4],
    color_end: [f32; 4],
    time: f32,
    _pad: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FirefliesUniform {
    time: f32,
    size: f32,
    pixel_ratio: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    uv: [f32; 2],
    color: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FireflyInstance {
    position: [f32; 3],
    scale: f32,
}

/// Two triangles spanning `[-0.5, 0.5]^2`.
const QUAD_CORNERS: [[f32; 2]; 6] = [
    [-0.5, -0.5],
    [0.5, -0.5],
    [0.5, 0.5],
    [-0.5, -0.5],
    [0.5, 0.5],
    [-0.5, 0.5],
];

/// CPU-side geometry for one material, in world space.
#[derive(Debug, Default)]
struct MeshBatch {
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
}

/// Scene geometry grouped by pipeline.
#[derive(Debug, Default)]
struct SceneBatches {
    baked: MeshBatch,
    flat: MeshBatch,
    pond: MeshBatch,
}

impl SceneBatches {
    /// Bake node transforms into vertices and sort primitives by material.
    fn build(scene: &BoundScene) -> Self {
        let mut batches = Self::default();
        for (index, node) in scene.graph.nodes().iter().enumerate() {
            let kind = scene.bindings.get(index).unwrap_or(MaterialKind::Source);
            for prim in &node.primitives {
                let color = kind
                    .flat_color(prim.base_color)
                    .map(|c| c.to_linear())
                    .unwrap_or([1.0, 1.0, 1.0]);
                let batch = match kind {
                    MaterialKind::Baked => &mut batches.baked,
                    MaterialKind::Pond => &mut batches.pond,
                    MaterialKind::WindowLight | MaterialKind::Source => &mut batches.flat,
                };
                let base = batch.vertices.len() as u32;
                batch
                    .vertices
                    .extend(prim.positions.iter().enumerate().map(|(i, p)| MeshVertex {
                        position: prim.transform.transform_point3((*p).into()).to_array(),
                        uv: prim.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                        color,
                    }));
                batch.indices.extend(prim.indices.iter().map(|i| base + i));
            }
        }
        batches
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, batch: &MeshBatch) -> Option<Self> {
        if batch.indices.is_empty() {
            return None;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&batch.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&batch.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(Self {
            vertex_buffer,
            index_buffer,
            index_count: batch.indices.len() as u32,
        })
    }

    fn draw<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[derive(Default)]
struct SceneMeshes {
    baked: Option<GpuMesh>,
    flat: Option<GpuMesh>,
    pond: Option<GpuMesh>,
}

/// wgpu renderer for the school, the pond and the fireflies.
pub struct WgpuRenderer {
    baked_pipeline: wgpu::RenderPipeline,
    flat_pipeline: wgpu::RenderPipeline,
    pond_pipeline: wgpu::RenderPipeline,
    fireflies_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    baked_sampler: wgpu::Sampler,
    baked_bind_group: wgpu::BindGroup,
    pond_buffer: wgpu::Buffer,
    pond_bind_group: wgpu::BindGroup,
    fireflies_buffer: wgpu::Buffer,
    fireflies_bind_group: wgpu::BindGroup,
    quad_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    meshes: SceneMeshes,
    surface_format: wgpu::TextureFormat,
    blit_pipeline: wgpu::RenderPipeline,
    blit_sampler: wgpu::Sampler,
    targets: RenderTargets,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        viewport: &Viewport,
        fireflies: &FireflySet,
    ) -> Self {
        let uniform_entry = |visibility| wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera_bind_group_layout"),
            entries: &[uniform_entry(wgpu::ShaderStages::VERTEX)],
        });
        let params_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("params_bind_group_layout"),
            entries: &[uniform_entry(
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let camera_buffer = uniform_buffer(device, "camera_buffer", &CameraUniform::zeroed());
        let camera_bind_group = uniform_bind_group(device, &camera_layout, &camera_buffer);
        let pond_buffer = uniform_buffer(device, "pond_buffer", &PondUniform::zeroed());
        let pond_bind_group = uniform_bind_group(device, &params_layout, &pond_buffer);
        let fireflies_buffer =
            uniform_buffer(device, "fireflies_buffer", &FirefliesUniform::zeroed());
        let fireflies_bind_group = uniform_bind_group(device, &params_layout, &fireflies_buffer);

        let baked_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("baked_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let baked_bind_group = texture_bind_group(
            device,
            queue,
            &texture_layout,
            &baked_sampler,
            &TextureData::placeholder(),
        );

        let mesh_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![
                0 => Float32x3,
                1 => Float32x2,
                2 => Float32x3,
            ],
        }];

        // Opaque mesh pipelines
        let baked_pipeline = PipelineSpec {
            label: "baked",
            source: shaders::baked_shader(),
            vs_entry: "vs_mesh",
            fs_entry: "fs_baked",
            bind_group_layouts: &[&camera_layout, &texture_layout],
            buffers: &mesh_buffers,
            blend: wgpu::BlendState::REPLACE,
            depth_write: Some(true),
            sample_count: SAMPLE_COUNT,
        }
        .build(device, surface_format);
        let flat_pipeline = PipelineSpec {
            label: "flat",
            source: shaders::flat_shader(),
            vs_entry: "vs_mesh",
            fs_entry: "fs_flat",
            bind_group_layouts: &[&camera_layout],
            buffers: &mesh_buffers,
            blend: wgpu::BlendState::REPLACE,
            depth_write: Some(true),
            sample_count: SAMPLE_COUNT,
        }
        .build(device, surface_format);
        let pond_pipeline = PipelineSpec {
            label: "pond",
            source: shaders::pond_shader(),
            vs_entry: "vs_mesh",
            fs_entry: "fs_pond",
            bind_group_layouts: &[&camera_layout, &params_layout],
            buffers: &mesh_buffers,
            blend: wgpu::BlendState::REPLACE,
            depth_write: Some(true),
            sample_count: SAMPLE_COUNT,
        }
        .build(device, surface_format);

        // Fireflies: additive, depth-tested, no depth write
        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };
        let fireflies_pipeline = PipelineSpec {
            label: "fireflies",
            source: shaders::FIREFLIES_SHADER.to_string(),
            vs_entry: "vs_fireflies",
            fs_entry: "fs_fireflies",
            bind_group_layouts: &[&camera_layout, &params_layout],
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<FireflyInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        1 => Float32x3,
                        2 => Float32,
                    ],
                },
            ],
            blend: additive,
            depth_write: Some(false),
            sample_count: SAMPLE_COUNT,
        }
        .build(device, surface_format);

        // Resolved scene onto the swapchain image
        let blit_pipeline = PipelineSpec {
            label: "blit",
            source: shaders::BLIT_SHADER.to_string(),
            vs_entry: "vs_blit",
            fs_entry: "fs_blit",
            bind_group_layouts: &[&texture_layout],
            buffers: &[],
            blend: wgpu::BlendState::REPLACE,
            depth_write: None,
            sample_count: 1,
        }
        .build(device, surface_format);
        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("firefly_quad_buffer"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let mut instances: Vec<FireflyInstance> = fireflies
            .particles()
            .iter()
            .map(|f| FireflyInstance {
                position: f.position.to_array(),
                scale: f.scale,
            })
            .collect();
        let instance_count = instances.len() as u32;
        // wgpu rejects zero-sized vertex buffers
        if instances.is_empty() {
            instances.push(FireflyInstance::zeroed());
        }
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("firefly_instance_buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let targets = RenderTargets::new(
            device,
            surface_format,
            &texture_layout,
            &blit_sampler,
            viewport.render_size(),
        );

        Self {
            baked_pipeline,
            flat_pipeline,
            pond_pipeline,
            fireflies_pipeline,
            camera_buffer,
            camera_bind_group,
            texture_layout,
            baked_sampler,
            baked_bind_group,
            pond_buffer,
            pond_bind_group,
            fireflies_buffer,
            fireflies_bind_group,
            quad_buffer,
            instance_buffer,
            instance_count,
            meshes: SceneMeshes::default(),
            surface_format,
            blit_pipeline,
            blit_sampler,
            targets,
        }
    }

    /// Rebuild the scene targets at the viewport's render size.
    pub fn resize(&mut self, device: &wgpu::Device, viewport: &Viewport) {
        let size = viewport.render_size();
        if size == self.targets.size {
            return;
        }
        self.targets = RenderTargets::new(
            device,
            self.surface_format,
            &self.texture_layout,
            &self.blit_sampler,
            size,
        );
    }

    /// Size of the offscreen scene targets, in pixels.
    pub fn render_size(&self) -> (u32, u32) {
        self.targets.size
    }

    /// Upload a bound scene and its baked texture, replacing any previous one.
    pub fn set_scene(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &BoundScene,
        baked: &TextureData,
    ) {
        let batches = SceneBatches::build(scene);
        self.meshes = SceneMeshes {
            baked: GpuMesh::upload(device, "baked", &batches.baked),
            flat: GpuMesh::upload(device, "flat", &batches.flat),
            pond: GpuMesh::upload(device, "pond", &batches.pond),
        };
        self.baked_bind_group = texture_bind_group(
            device,
            queue,
            &self.texture_layout,
            &self.baked_sampler,
            baked,
        );
        tracing::debug!(
            baked = batches.baked.indices.len() / 3,
            flat = batches.flat.indices.len() / 3,
            pond = batches.pond.indices.len() / 3,
            "scene uploaded"
        );
    }

    /// Render one frame: model, pond, then fireflies over them. The scene is
    /// drawn multisampled at the render size, resolved, then stretched onto
    /// `view`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &OrbitCamera,
        stage: &Stage,
        viewport: &Viewport,
    ) {
        let uniforms = stage.uniforms();
        let (width, height) = self.targets.size;
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&CameraUniform {
                view_proj: camera.view_projection().to_cols_array_2d(),
                view: camera.view_matrix().to_cols_array_2d(),
                proj: camera.projection_matrix().to_cols_array_2d(),
                viewport: [
                    width as f32,
                    height as f32,
                    viewport.pixel_ratio,
                    0.0,
                ],
            }),
        );
        let [sr, sg, sb] = uniforms.pond.color_start.to_linear();
        let [er, eg, eb] = uniforms.pond.color_end.to_linear();
        queue.write_buffer(
            &self.pond_buffer,
            0,
            bytemuck::bytes_of(&PondUniform {
                color_start: [sr, sg, sb, 1.0],
                color_end: [er, eg, eb, 1.0],
                time: uniforms.pond.time,
                _pad: [0.0; 3],
            }),
        );
        queue.write_buffer(
            &self.fireflies_buffer,
            0,
            bytemuck::bytes_of(&FirefliesUniform {
                time: uniforms.fireflies.time,
                size: uniforms.fireflies.size,
                pixel_ratio: uniforms.fireflies.pixel_ratio,
                _pad: 0.0,
            }),
        );

        let [r, g, b] = stage.settings().clear_color.to_linear();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.msaa_color,
                    resolve_target: Some(&self.targets.resolved),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.camera_bind_group, &[]);

            if let Some(mesh) = &self.meshes.baked {
                pass.set_pipeline(&self.baked_pipeline);
                pass.set_bind_group(1, &self.baked_bind_group, &[]);
                mesh.draw(&mut pass);
            }
            if let Some(mesh) = &self.meshes.flat {
                pass.set_pipeline(&self.flat_pipeline);
                mesh.draw(&mut pass);
            }
            if let Some(mesh) = &self.meshes.pond {
                pass.set_pipeline(&self.pond_pipeline);
                pass.set_bind_group(1, &self.pond_bind_group, &[]);
                mesh.draw(&mut pass);
            }

            if self.instance_count > 0 {
                pass.set_pipeline(&self.fireflies_pipeline);
                pass.set_bind_group(1, &self.fireflies_bind_group, &[]);
                pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.draw(0..QUAD_CORNERS.len() as u32, 0..self.instance_count);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &self.targets.blit_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Offscreen targets the scene pass draws into.
struct RenderTargets {
    size: (u32, u32),
    msaa_color: wgpu::TextureView,
    resolved: wgpu::TextureView,
    depth: wgpu::TextureView,
    blit_bind_group: wgpu::BindGroup,
}

impl RenderTargets {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        blit_layout: &wgpu::BindGroupLayout,
        blit_sampler: &wgpu::Sampler,
        size: (u32, u32),
    ) -> Self {
        let [msaa_color, resolved, depth] =
            Self::descriptors(size, format).map(|desc| device.create_texture(&desc));
        let resolved = resolved.create_view(&Default::default());
        let blit_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit_bind_group"),
            layout: blit_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&resolved),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(blit_sampler),
                },
            ],
        });
        tracing::debug!(width = size.0, height = size.1, "render targets created");
        Self {
            size,
            msaa_color: msaa_color.create_view(&Default::default()),
            resolved,
            depth: depth.create_view(&Default::default()),
            blit_bind_group,
        }
    }

    /// Multisampled colour, its single-sample resolve, and multisampled depth.
    fn descriptors(
        (width, height): (u32, u32),
        format: wgpu::TextureFormat,
    ) -> [wgpu::TextureDescriptor<'static>; 3] {
        let desc = |label: &'static str,
                    sample_count: u32,
                    format: wgpu::TextureFormat,
                    usage: wgpu::TextureUsages| wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        };
        [
            desc(
                "msaa_color_target",
                SAMPLE_COUNT,
                format,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            ),
            desc(
                "resolved_color_target",
                1,
                format,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            ),
            desc(
                "depth_target",
                SAMPLE_COUNT,
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            ),
        ]
    }
}

/// Everything that differs between the pipelines.
struct PipelineSpec<'a> {
    label: &'a str,
    source: String,
    vs_entry: &'a str,
    fs_entry: &'a str,
    bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    blend: wgpu::BlendState,
    /// `None` builds a pipeline without a depth attachment.
    depth_write: Option<bool>,
    sample_count: u32,
}

impl PipelineSpec<'_> {
    fn build(self, device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{}_shader", self.label)),
            source: wgpu::ShaderSource::Wgsl(self.source.into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{}_pipeline_layout", self.label)),
            bind_group_layouts: self.bind_group_layouts,
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{}_pipeline", self.label)),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(self.vs_entry),
                compilation_options: Default::default(),
                buffers: self.buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(self.fs_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(self.blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: self.depth_write.map(|depth_write_enabled| wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: self.sample_count,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        })
    }
}

fn uniform_buffer<T: Pod>(device: &wgpu::Device, label: &str, value: &T) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::bytes_of(value),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

fn uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("uniform_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}

/// Upload an sRGB texture and bind it with `sampler`.
fn texture_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    data: &TextureData,
) -> wgpu::BindGroup {
    let size = wgpu::Extent3d {
        width: data.width.max(1),
        height: data.height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("baked_texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.width),
            rows_per_image: Some(size.height),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("baked_bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use pondlight_assets::{MeshPrimitive, SceneGraph, SceneNode};
    use pondlight_common::{Color, Transform};
    use pondlight_scene::{MissingNodePolicy, bind_materials};

    fn triangle(transform: Mat4, base_color: Color) -> MeshPrimitive {
        MeshPrimitive {
            transform,
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            indices: vec![0, 1, 2],
            base_color,
        }
    }

    fn node(name: &str, prims: Vec<MeshPrimitive>) -> SceneNode {
        SceneNode {
            name: name.into(),
            transform: Transform::default(),
            primitives: prims,
        }
    }

    fn bound(nodes: Vec<SceneNode>) -> BoundScene {
        let graph = SceneGraph::new(nodes);
        let bindings = bind_materials(&graph, MissingNodePolicy::Skip).unwrap();
        BoundScene { graph, bindings }
    }

    #[test]
    fn gpu_struct_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 208);
        assert_eq!(std::mem::size_of::<PondUniform>(), 48);
        assert_eq!(std::mem::size_of::<FirefliesUniform>(), 16);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
        assert_eq!(std::mem::size_of::<FireflyInstance>(), 16);
    }

    #[test]
    fn scene_targets_are_multisampled_and_resolvable() {
        let format = wgpu::TextureFormat::Bgra8UnormSrgb;
        let [color, resolved, depth] = RenderTargets::descriptors((2000, 1000), format);

        assert_eq!(color.sample_count, 4);
        assert_eq!(depth.sample_count, color.sample_count);
        assert_eq!(resolved.sample_count, 1);
        assert_eq!(color.format, format);
        assert_eq!(resolved.format, format);
        assert_eq!(depth.format, DEPTH_FORMAT);
        assert!(resolved.usage.contains(wgpu::TextureUsages::TEXTURE_BINDING));
        for desc in [&color, &resolved, &depth] {
            assert_eq!((desc.size.width, desc.size.height), (2000, 1000));
        }
    }

    #[test]
    fn zero_sized_targets_are_clamped() {
        let [color, _, depth] =
            RenderTargets::descriptors((0, 0), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!((color.size.width, color.size.height), (1, 1));
        assert_eq!((depth.size.width, depth.size.height), (1, 1));
    }

    #[test]
    fn batches_group_by_material() {
        let red = Color::new(1.0, 0.0, 0.0);
        let scene = bound(vec![
            node("school-scene", vec![triangle(Mat4::IDENTITY, red)]),
            node("school-windows", vec![triangle(Mat4::IDENTITY, red)]),
            node("pond", vec![triangle(Mat4::IDENTITY, red)]),
            node("tree", vec![triangle(Mat4::IDENTITY, red)]),
        ]);
        let batches = SceneBatches::build(&scene);
        assert_eq!(batches.baked.indices.len(), 3);
        assert_eq!(batches.pond.indices.len(), 3);
        assert_eq!(batches.flat.indices.len(), 6);
        // Window light is white, the unbound node keeps its file colour.
        assert_eq!(batches.flat.vertices[0].color, [1.0, 1.0, 1.0]);
        assert_eq!(batches.flat.vertices[3].color, [1.0, 0.0, 0.0]);
        // Second primitive's indices are offset past the first's vertices.
        assert_eq!(&batches.flat.indices[3..], &[3, 4, 5]);
    }

    #[test]
    fn batches_bake_world_transform() {
        let scene = bound(vec![node(
            "pond",
            vec![triangle(
                Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
                Color::WHITE,
            )],
        )]);
        let batches = SceneBatches::build(&scene);
        assert_eq!(batches.pond.vertices[1].position, [1.0, 2.0, 0.0]);
        assert_eq!(batches.pond.vertices[1].uv, [1.0, 0.0]);
    }
}
