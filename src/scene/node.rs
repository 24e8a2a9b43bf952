//! Scene nodes and their local transforms.

use super::{MeshId, NodeId};
use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// What a node represents in the source scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// A plain transform node.
    #[default]
    Transform,
    /// A node that renders a mesh.
    Mesh { mesh: MeshId },
    /// A node that renders the mesh of another (mesh) node.
    InstancedMesh { source: NodeId },
    Light,
    Camera,
}

/// A node in the source scene graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneNode {
    pub name: Option<String>,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    /// Local translation.
    pub position: [f32; 3],
    /// Local Euler rotation in radians, applied as yaw (Y), pitch (X), roll (Z).
    pub rotation: [f32; 3],
    /// Quaternion rotation `[x, y, z, w]` composed after the Euler rotation.
    pub rotation_quaternion: Option<[f32; 4]>,
    /// Local scale.
    pub scaling: [f32; 3],
    /// Pivot point. glTF has no pivots, so a non-zero pivot is dropped on export.
    pub pivot: Option<[f32; 3]>,
    pub metadata: Option<serde_json::Value>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            name: None,
            parent: None,
            kind: NodeKind::Transform,
            position: [0.0; 3],
            rotation: [0.0; 3],
            rotation_quaternion: None,
            scaling: [1.0; 3],
            pivot: None,
            metadata: None,
        }
    }
}

impl SceneNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn transform() -> Self {
        Self::new(NodeKind::Transform)
    }

    pub fn mesh(mesh: MeshId) -> Self {
        Self::new(NodeKind::Mesh { mesh })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: [f32; 3]) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_rotation_quaternion(mut self, rotation: [f32; 4]) -> Self {
        self.rotation_quaternion = Some(rotation);
        self
    }

    pub fn with_scaling(mut self, scaling: [f32; 3]) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether the node carries a local transform.
    /// Lights and cameras are exported as bare, named nodes.
    pub fn is_transform_node(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Transform | NodeKind::Mesh { .. } | NodeKind::InstancedMesh { .. }
        )
    }

    /// Whether a pivot point is set to something other than the origin.
    pub fn has_pivot(&self) -> bool {
        self.pivot.is_some_and(|p| p != [0.0; 3])
    }

    /// Euler rotation composed with the quaternion override, not normalized.
    pub fn local_rotation(&self) -> Quat {
        let [pitch, yaw, roll] = self.rotation;
        let euler = Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll);
        match self.rotation_quaternion {
            Some(q) => euler * Quat::from_array(q),
            None => euler,
        }
    }

    /// Local transform matrix (scale, then rotation, then translation).
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from_array(self.scaling),
            self.local_rotation().normalize(),
            Vec3::from_array(self.position),
        )
    }
}
