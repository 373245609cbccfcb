//! WGSL sources. Every shader shares the camera block at group 0.

const CAMERA_BLOCK: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    // x: width px, y: height px, z: pixel ratio
    viewport: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct MeshInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec3<f32>,
};

struct MeshOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_mesh(in: MeshInput) -> MeshOutput {
    var out: MeshOutput;
    out.clip_position = camera.view_proj * vec4<f32>(in.position, 1.0);
    out.uv = in.uv;
    out.color = in.color;
    return out;
}
"#;

/// Unlit baked-lighting texture.
const BAKED_BODY: &str = r#"
@group(1) @binding(0)
var baked_texture: texture_2d<f32>;
@group(1) @binding(1)
var baked_sampler: sampler;

@fragment
fn fs_baked(in: MeshOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(textureSample(baked_texture, baked_sampler, in.uv).rgb, 1.0);
}
"#;

/// Constant colour carried per vertex.
const FLAT_BODY: &str = r#"
@fragment
fn fs_flat(in: MeshOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

/// Noise-driven pond surface blending two colours with an outer glow.
const POND_BODY: &str = r#"
struct Pond {
    color_start: vec4<f32>,
    color_end: vec4<f32>,
    time: f32,
};

@group(1) @binding(0)
var<uniform> pond: Pond;

fn hash3(p: vec3<f32>) -> vec3<f32> {
    let q = vec3<f32>(
        dot(p, vec3<f32>(127.1, 311.7, 74.7)),
        dot(p, vec3<f32>(269.5, 183.3, 246.1)),
        dot(p, vec3<f32>(113.5, 271.9, 124.6)),
    );
    return -1.0 + 2.0 * fract(sin(q) * 43758.5453123);
}

fn corner(i: vec3<f32>, f: vec3<f32>, c: vec3<f32>) -> f32 {
    return dot(hash3(i + c), f - c);
}

// Gradient noise in roughly [-1, 1].
fn noise3(p: vec3<f32>) -> f32 {
    let i = floor(p);
    let f = fract(p);
    let u = f * f * (3.0 - 2.0 * f);

    let x00 = mix(corner(i, f, vec3<f32>(0.0, 0.0, 0.0)), corner(i, f, vec3<f32>(1.0, 0.0, 0.0)), u.x);
    let x10 = mix(corner(i, f, vec3<f32>(0.0, 1.0, 0.0)), corner(i, f, vec3<f32>(1.0, 1.0, 0.0)), u.x);
    let x01 = mix(corner(i, f, vec3<f32>(0.0, 0.0, 1.0)), corner(i, f, vec3<f32>(1.0, 0.0, 1.0)), u.x);
    let x11 = mix(corner(i, f, vec3<f32>(0.0, 1.0, 1.0)), corner(i, f, vec3<f32>(1.0, 1.0, 1.0)), u.x);
    return mix(mix(x00, x10, u.y), mix(x01, x11, u.y), u.z);
}

@fragment
fn fs_pond(in: MeshOutput) -> @location(0) vec4<f32> {
    let displaced_uv = in.uv + noise3(vec3<f32>(in.uv * 5.0, pond.time * 0.1));
    var strength = noise3(vec3<f32>(displaced_uv * 5.0, pond.time * 0.2));

    let outer_glow = distance(in.uv, vec2<f32>(0.5, 0.5)) * 5.0 - 1.4;
    strength = strength + outer_glow;
    strength = strength + step(-0.2, strength) * 0.8;
    strength = clamp(strength, 0.0, 1.0);

    let color = mix(pond.color_start.rgb, pond.color_end.rgb, strength);
    return vec4<f32>(color, 1.0);
}
"#;

/// Camera-facing glowing quads, one instance per firefly.
pub const FIREFLIES_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    viewport: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

struct Fireflies {
    time: f32,
    size: f32,
    pixel_ratio: f32,
    _pad: f32,
};

@group(1) @binding(0)
var<uniform> fireflies: Fireflies;

struct QuadInput {
    @location(0) corner: vec2<f32>,
};

struct InstanceInput {
    @location(1) position: vec3<f32>,
    @location(2) scale: f32,
};

struct FireflyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) point_coord: vec2<f32>,
};

@vertex
fn vs_fireflies(quad: QuadInput, instance: InstanceInput) -> FireflyOutput {
    var world = vec4<f32>(instance.position, 1.0);
    world.y = world.y + sin(fireflies.time + world.x * 100.0) * instance.scale * 0.2;

    let view_position = camera.view * world;
    var clip = camera.proj * view_position;

    // Point size in pixels, shrinking with distance.
    let size_px = fireflies.size * instance.scale * fireflies.pixel_ratio / max(-view_position.z, 0.001);
    let ndc_offset = quad.corner * size_px * 2.0 / camera.viewport.xy;
    clip = vec4<f32>(clip.xy + ndc_offset * clip.w, clip.zw);

    var out: FireflyOutput;
    out.clip_position = clip;
    out.point_coord = quad.corner + vec2<f32>(0.5, 0.5);
    return out;
}

@fragment
fn fs_fireflies(in: FireflyOutput) -> @location(0) vec4<f32> {
    let distance_to_center = distance(in.point_coord, vec2<f32>(0.5, 0.5));
    let strength = clamp(0.05 / distance_to_center - 0.1, 0.0, 1.0);
    return vec4<f32>(1.0, 1.0, 1.0, strength);
}
"#;

/// One oversized triangle covering the target, sampling the resolved scene.
pub const BLIT_SHADER: &str = r#"
@group(0) @binding(0)
var frame_texture: texture_2d<f32>;
@group(0) @binding(1)
var frame_sampler: sampler;

struct BlitOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> BlitOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: BlitOutput;
    out.clip_position = vec4<f32>(uv * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0), 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_blit(in: BlitOutput) -> @location(0) vec4<f32> {
    return textureSample(frame_texture, frame_sampler, in.uv);
}
"#;

pub fn baked_shader() -> String {
    format!("{CAMERA_BLOCK}{BAKED_BODY}")
}

pub fn flat_shader() -> String {
    format!("{CAMERA_BLOCK}{FLAT_BODY}")
}

pub fn pond_shader() -> String {
    format!("{CAMERA_BLOCK}{POND_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mesh_shaders_share_camera_block() {
        for (src, entry) in [
            (baked_shader(), "fs_baked"),
            (flat_shader(), "fs_flat"),
            (pond_shader(), "fs_pond"),
        ] {
            assert!(src.contains("fn vs_mesh"));
            assert!(src.contains(entry));
            assert_eq!(src.matches("var<uniform> camera").count(), 1);
        }
    }

    #[test]
    fn fireflies_shader_has_entry_points() {
        assert!(FIREFLIES_SHADER.contains("fn vs_fireflies"));
        assert!(FIREFLIES_SHADER.contains("fn fs_fireflies"));
    }

    #[test]
    fn blit_shader_needs_no_vertex_buffers() {
        assert!(BLIT_SHADER.contains("fn vs_blit(@builtin(vertex_index)"));
        assert!(BLIT_SHADER.contains("fn fs_blit"));
        assert!(!BLIT_SHADER.contains("@location(0) position"));
    }
}
