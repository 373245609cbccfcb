use pondlight_assets::SceneGraph;
use pondlight_common::Color;

/// How a scene node is shaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialKind {
    /// Unlit, coloured by the baked lighting texture.
    Baked,
    /// Flat emissive colour for the lit windows.
    WindowLight,
    /// Animated pond shader.
    Pond,
    /// Flat base colour taken from the model file.
    Source,
}

impl MaterialKind {
    pub const WINDOW_LIGHT_COLOR: Color = Color::WHITE;

    /// Colour for the flat pipeline; `None` for textured or shader materials.
    pub fn flat_color(self, source: Color) -> Option<Color> {
        match self {
            MaterialKind::WindowLight => Some(Self::WINDOW_LIGHT_COLOR),
            MaterialKind::Source => Some(source),
            MaterialKind::Baked | MaterialKind::Pond => None,
        }
    }
}

/// Node names the scene expects, and the material each one receives.
pub const NAMED_MATERIALS: [(&str, MaterialKind); 4] = [
    ("school-scene", MaterialKind::Baked),
    ("school-windows", MaterialKind::WindowLight),
    ("school-windows-up", MaterialKind::WindowLight),
    ("pond", MaterialKind::Pond),
];

/// What to do when an expected node is absent from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingNodePolicy {
    /// Refuse the scene.
    #[default]
    Fail,
    /// Warn and bind whatever was found.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
    #[error("model is missing expected nodes: {}", .0.join(", "))]
    MissingNodes(Vec<String>),
}

/// Material per top-level node, indexed like [`SceneGraph::nodes`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialBindings {
    per_node: Vec<MaterialKind>,
}

impl MaterialBindings {
    pub fn get(&self, node: usize) -> Option<MaterialKind> {
        self.per_node.get(node).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, MaterialKind)> + '_ {
        self.per_node.iter().copied().enumerate()
    }

    pub fn len(&self) -> usize {
        self.per_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_node.is_empty()
    }
}

/// Look up each expected node by exact name and bind its material.
/// Unnamed or unexpected nodes keep their file colour.
pub fn bind_materials(
    graph: &SceneGraph,
    policy: MissingNodePolicy,
) -> Result<MaterialBindings, AssignError> {
    let mut per_node = vec![MaterialKind::Source; graph.len()];
    let mut missing = Vec::new();

    for (name, kind) in NAMED_MATERIALS {
        match graph.find(name) {
            Some(index) => {
                tracing::debug!(node = name, index, material = ?kind, "material bound");
                per_node[index] = kind;
            }
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        match policy {
            MissingNodePolicy::Fail => return Err(AssignError::MissingNodes(missing)),
            MissingNodePolicy::Skip => {
                for name in &missing {
                    tracing::warn!(node = %name, "expected node not found, skipping");
                }
            }
        }
    }

    Ok(MaterialBindings { per_node })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pondlight_assets::SceneNode;
    use pondlight_common::Transform;

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
    fn binds_all_four_nodes() {
        let g = graph(&["pond", "school-windows-up", "tree", "school-scene", "school-windows"]);
        let b = bind_materials(&g, MissingNodePolicy::Fail).unwrap();
        assert_eq!(b.get(0), Some(MaterialKind::Pond));
        assert_eq!(b.get(1), Some(MaterialKind::WindowLight));
        assert_eq!(b.get(2), Some(MaterialKind::Source));
        assert_eq!(b.get(3), Some(MaterialKind::Baked));
        assert_eq!(b.get(4), Some(MaterialKind::WindowLight));
        assert_eq!(b.len(), 5);
    }

    #[test]
    fn missing_nodes_fail_by_default() {
        let g = graph(&["school-scene", "pond"]);
        let err = bind_materials(&g, MissingNodePolicy::default()).unwrap_err();
        assert_eq!(
            err,
            AssignError::MissingNodes(vec!["school-windows".into(), "school-windows-up".into()])
        );
        assert!(err.to_string().contains("school-windows-up"));
    }

    #[test]
    fn missing_nodes_skipped_on_request() {
        let g = graph(&["pond"]);
        let b = bind_materials(&g, MissingNodePolicy::Skip).unwrap();
        assert_eq!(b.iter().collect::<Vec<_>>(), vec![(0, MaterialKind::Pond)]);
    }

    #[test]
    fn name_match_is_exact() {
        let g = graph(&["School-Scene", "school-scene ", "pond", "school-windows", "school-windows-up"]);
        assert!(bind_materials(&g, MissingNodePolicy::Fail).is_err());
    }

    #[test]
    fn first_duplicate_wins() {
        let g = graph(&["pond", "pond", "school-scene", "school-windows", "school-windows-up"]);
        let b = bind_materials(&g, MissingNodePolicy::Fail).unwrap();
        assert_eq!(b.get(0), Some(MaterialKind::Pond));
        assert_eq!(b.get(1), Some(MaterialKind::Source));
    }

    #[test]
    fn flat_colors() {
        let red = Color::new(1.0, 0.0, 0.0);
        assert_eq!(MaterialKind::WindowLight.flat_color(red), Some(Color::WHITE));
        assert_eq!(MaterialKind::Source.flat_color(red), Some(red));
        assert_eq!(MaterialKind::Baked.flat_color(red), None);
    }
}
