use crate::{DRACO_EXTENSION, LoadError};
use glam::Mat4;
use pondlight_common::{Color, Transform};
use std::borrow::Cow;
use std::path::Path;

/// Triangle geometry in world space, flattened out of a node subtree.
#[derive(Debug, Clone)]
pub struct MeshPrimitive {
    /// World transform of the glTF node that owns this primitive.
    pub transform: Mat4,
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    /// Material base colour from the glTF file.
    pub base_color: Color,
}

impl MeshPrimitive {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A top-level node of the loaded scene, looked up by name.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub primitives: Vec<MeshPrimitive>,
}

/// The top-level nodes of a glTF default scene.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new(nodes: Vec<SceneNode>) -> Self {
        Self { nodes }
    }

    /// Load a `.glb` or `.gltf` file. External buffers are resolved
    /// relative to the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        check_extensions(&bytes)?;

        let (doc, buffers, _images) = if bytes.starts_with(b"glTF") {
            gltf::import_slice(&bytes)?
        } else {
            gltf::import(path)?
        };
        Self::from_document(&doc, &buffers)
    }

    /// Parse a self-contained model (GLB, or glTF with data URIs).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        check_extensions(bytes)?;
        let (doc, buffers, _images) = gltf::import_slice(bytes)?;
        Self::from_document(&doc, &buffers)
    }

    fn from_document(
        doc: &gltf::Document,
        buffers: &[gltf::buffer::Data],
    ) -> Result<Self, LoadError> {
        let scene = doc
            .default_scene()
            .or_else(|| doc.scenes().next())
            .ok_or(LoadError::NoScene)?;

        let nodes = scene
            .nodes()
            .map(|node| {
                let local = Mat4::from_cols_array_2d(&node.transform().matrix());
                let mut primitives = Vec::new();
                collect_primitives(&node, Mat4::IDENTITY, buffers, &mut primitives);
                SceneNode {
                    name: node.name().unwrap_or_default().to_string(),
                    transform: Transform::from_matrix(local),
                    primitives,
                }
            })
            .collect();

        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&SceneNode> {
        self.nodes.get(index)
    }

    /// Index of the first top-level node whose name matches exactly.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.nodes
            .iter()
            .flat_map(|n| &n.primitives)
            .map(MeshPrimitive::triangle_count)
            .sum()
    }
}

/// Reject models whose geometry needs a decoder we do not ship.
fn check_extensions(bytes: &[u8]) -> Result<(), LoadError> {
    let json: Cow<'_, [u8]> = if bytes.starts_with(b"glTF") {
        gltf::Glb::from_slice(bytes)?.json
    } else {
        Cow::Borrowed(bytes)
    };
    let value: serde_json::Value = serde_json::from_slice(&json)?;
    let required = value
        .get("extensionsRequired")
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str());
    for name in required {
        if name == DRACO_EXTENSION {
            return Err(LoadError::UnsupportedExtension(name.to_string()));
        }
    }
    Ok(())
}

fn collect_primitives(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<MeshPrimitive>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::warn!(
                    node = node.name().unwrap_or_default(),
                    mode = ?primitive.mode(),
                    "skipping non-triangle primitive"
                );
                continue;
            }
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                tracing::warn!(
                    node = node.name().unwrap_or_default(),
                    "skipping primitive without positions"
                );
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let uvs = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect())
                .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);
            let indices = reader
                .read_indices()
                .map(|i| i.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());
            let [r, g, b, _] = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_factor();

            out.push(MeshPrimitive {
                transform: world,
                positions,
                uvs,
                indices,
                base_color: Color::from_linear([r, g, b]),
            });
        }
    }

    for child in node.children() {
        collect_primitives(&child, world, buffers, out);
    }
}
