//! Scene asset loading: glTF scene graph, baked texture, background loads.
//!
//! The renderer never touches files. It consumes a [`SceneGraph`] and a
//! [`TextureData`] delivered once by a [`PendingLoad`].
//!
//! # Invariants
//! - A load delivers exactly one `Result`; a dropped worker surfaces as
//!   [`LoadError::Disconnected`], never as silence.
//! - Models that require Draco mesh compression are rejected up front.

mod pending;
mod scene_graph;
mod texture;

pub use pending::{AssetRequest, LoadedAssets, PendingLoad};
pub use scene_graph::{MeshPrimitive, SceneGraph, SceneNode};
pub use texture::TextureData;

use std::path::PathBuf;

/// glTF extension for Draco-compressed geometry.
pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Errors from asset loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("glTF JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model requires unsupported extension {0}; re-export it without mesh compression")]
    UnsupportedExtension(String),
    #[error("model contains no scene")]
    NoScene,
    #[error("asset loader stopped before delivering a result")]
    Disconnected,
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A single triangle shared by three named top-level nodes; `school-windows`
    /// holds its mesh on a child node.
    pub const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0, 1, 2] } ],
        "nodes": [
            { "name": "school-scene", "mesh": 0 },
            { "name": "pond", "mesh": 0, "translation": [0.0, 0.5, 0.0] },
            { "name": "school-windows", "translation": [2.0, 0.0, 0.0], "children": [3] },
            { "name": "inner", "mesh": 0, "translation": [0.0, 1.0, 0.0] }
        ],
        "meshes": [ {
            "primitives": [ {
                "attributes": { "POSITION": 0, "TEXCOORD_0": 1 },
                "indices": 2,
                "material": 0
            } ]
        } ],
        "materials": [ {
            "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] }
        } ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 0.0, 1.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" },
            { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 24 },
            { "buffer": 0, "byteOffset": 60, "byteLength": 6 }
        ],
        "buffers": [ {
            "byteLength": 68,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAAAAAAAAAAAAIA/AAABAAIAAAA="
        } ]
    }"#;

    pub const DRACO_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "extensionsUsed": ["KHR_draco_mesh_compression"],
        "extensionsRequired": ["KHR_draco_mesh_compression"],
        "scenes": [ { "nodes": [] } ]
    }"#;
}
