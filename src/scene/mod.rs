//! In-memory source scene consumed by the exporter.
//!
//! Every object lives in an arena on [`Scene`] and is addressed by a small
//! copyable handle. Handles double as identity: two meshes that reference the
//! same [`VertexBufferId`] share geometry, and the exporter's dedup caches are
//! keyed on these handles rather than on object addresses.

mod geometry;
mod material;
mod node;

pub use geometry::{
    ComponentType, DataBuffer, Geometry, IndexArray, Mesh, SubMesh, VertexBuffer,
};
pub use material::{
    AlphaMode, FillMode, Material, MultiMaterial, PbrMaterial, Sampling, Texture, TextureImage,
    WrapMode,
};
pub use node::{NodeKind, SceneNode};

use crate::error::{ExportError, Result};
use glam::Mat4;
use serde::{Deserialize, Serialize};

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Position of the object in its scene arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(
    /// Handle to a [`SceneNode`].
    NodeId
);
handle!(
    /// Handle to a [`Mesh`].
    MeshId
);
handle!(
    /// Handle to a [`Material`].
    MaterialId
);
handle!(
    /// Handle to a [`Texture`].
    TextureId
);
handle!(
    /// Handle to a [`DataBuffer`].
    BufferId
);
handle!(
    /// Handle to a [`VertexBuffer`].
    VertexBufferId
);
handle!(
    /// Handle to an [`IndexArray`].
    IndexArrayId
);

/// A complete source scene.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    /// Optional scene name.
    pub name: Option<String>,
    /// Whether scene data is authored in a right-handed coordinate system.
    /// Left-handed scenes are mirrored on export.
    pub use_right_handed_system: bool,
    /// Arbitrary scene metadata.
    pub metadata: Option<serde_json::Value>,
    pub nodes: Vec<SceneNode>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub buffers: Vec<DataBuffer>,
    pub vertex_buffers: Vec<VertexBuffer>,
    pub index_arrays: Vec<IndexArray>,
}

impl Scene {
    /// Create an empty left-handed scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a scene description from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn add_node(&mut self, node: SceneNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() as u32 - 1)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() as u32 - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() as u32 - 1)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() as u32 - 1)
    }

    pub fn add_buffer(&mut self, buffer: DataBuffer) -> BufferId {
        self.buffers.push(buffer);
        BufferId(self.buffers.len() as u32 - 1)
    }

    pub fn add_vertex_buffer(&mut self, vertex_buffer: VertexBuffer) -> VertexBufferId {
        self.vertex_buffers.push(vertex_buffer);
        VertexBufferId(self.vertex_buffers.len() as u32 - 1)
    }

    pub fn add_index_array(&mut self, indices: IndexArray) -> IndexArrayId {
        self.index_arrays.push(indices);
        IndexArrayId(self.index_arrays.len() as u32 - 1)
    }

    pub fn node(&self, id: NodeId) -> Result<&SceneNode> {
        self.nodes.get(id.index()).ok_or(ExportError::MissingNode(id.0))
    }

    pub fn mesh(&self, id: MeshId) -> Result<&Mesh> {
        self.meshes.get(id.index()).ok_or(ExportError::MissingMesh(id.0))
    }

    pub fn material(&self, id: MaterialId) -> Result<&Material> {
        self.materials
            .get(id.index())
            .ok_or(ExportError::MissingMaterial(id.0))
    }

    pub fn texture(&self, id: TextureId) -> Result<&Texture> {
        self.textures
            .get(id.index())
            .ok_or(ExportError::MissingTexture(id.0))
    }

    pub fn buffer(&self, id: BufferId) -> Result<&DataBuffer> {
        self.buffers
            .get(id.index())
            .ok_or(ExportError::MissingBuffer(id.0))
    }

    pub fn vertex_buffer(&self, id: VertexBufferId) -> Result<&VertexBuffer> {
        self.vertex_buffers
            .get(id.index())
            .ok_or(ExportError::MissingVertexBuffer(id.0))
    }

    pub fn index_array(&self, id: IndexArrayId) -> Result<&IndexArray> {
        self.index_arrays
            .get(id.index())
            .ok_or(ExportError::MissingIndexArray(id.0))
    }

    /// Iterate all node handles in scene order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Nodes without a parent, in scene order.
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.node_ids()
            .filter(|&id| self.nodes[id.index()].parent.is_none())
            .collect()
    }

    /// Direct children of a node, in scene order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node_ids()
            .filter(|&child| self.nodes[child.index()].parent == Some(id))
            .collect()
    }

    /// All nodes below `id`, depth first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = self.children(id);
        stack.reverse();
        while let Some(next) = stack.pop() {
            if result.contains(&next) {
                continue;
            }
            result.push(next);
            let mut children = self.children(next);
            children.reverse();
            stack.extend(children);
        }
        result
    }

    /// Accumulated world transform of a node.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4> {
        let mut matrix = self.node(id)?.local_matrix();
        let mut current = self.node(id)?.parent;
        let mut depth = 0;
        while let Some(parent_id) = current {
            depth += 1;
            if depth > self.nodes.len() {
                return Err(ExportError::Export(format!(
                    "Node {} has a cyclic parent chain",
                    id.0
                )));
            }
            let parent = self.node(parent_id)?;
            matrix = parent.local_matrix() * matrix;
            current = parent.parent;
        }
        Ok(matrix)
    }

    /// Whether a node carries renderable geometry, directly or through the
    /// mesh it instances.
    pub fn has_geometry(&self, id: NodeId) -> Result<bool> {
        Ok(self.node_mesh(id)?.is_some())
    }

    /// The mesh rendered by a node, if any.
    ///
    /// Instanced nodes resolve through their source node. Meshes without
    /// geometry are not renderable and yield `None`.
    pub fn node_mesh(&self, id: NodeId) -> Result<Option<MeshId>> {
        let mesh_id = match self.node(id)?.kind {
            NodeKind::Mesh { mesh } => mesh,
            NodeKind::InstancedMesh { source } => match self.node(source)?.kind {
                NodeKind::Mesh { mesh } => mesh,
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        if self.mesh(mesh_id)?.geometry.is_some() {
            Ok(Some(mesh_id))
        } else {
            Ok(None)
        }
    }
}
