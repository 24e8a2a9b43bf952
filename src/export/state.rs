//! Per-handedness dedup cache for emitted geometry.

use super::utils::IndexWidth;
use crate::scene::{BufferId, IndexArrayId, MeshId, VertexBufferId};
use std::collections::HashMap;

/// Maps source geometry handles to the output indices already emitted for
/// them.
///
/// The exporter keeps one instance for geometry exported as authored and one
/// for geometry exported under right-handed conversion, so the same source
/// buffer referenced under both conventions is encoded once per convention.
#[derive(Debug, Default)]
pub struct ExporterState {
    indices_buffer_views: HashMap<(IndexArrayId, IndexWidth), u32>,
    indices_accessors: HashMap<(IndexArrayId, u32, u32), u32>,
    vertex_buffer_views: HashMap<(BufferId, u32), u32>,
    vertex_accessors: HashMap<(VertexBufferId, u32, u32), u32>,
    meshes: HashMap<MeshId, u32>,
}

impl ExporterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indices_buffer_view(&self, indices: IndexArrayId, width: IndexWidth) -> Option<u32> {
        self.indices_buffer_views.get(&(indices, width)).copied()
    }

    pub fn set_indices_buffer_view(&mut self, indices: IndexArrayId, width: IndexWidth, view: u32) {
        self.indices_buffer_views.insert((indices, width), view);
    }

    pub fn indices_accessor(&self, indices: IndexArrayId, start: u32, count: u32) -> Option<u32> {
        self.indices_accessors.get(&(indices, start, count)).copied()
    }

    pub fn set_indices_accessor(
        &mut self,
        indices: IndexArrayId,
        start: u32,
        count: u32,
        accessor: u32,
    ) {
        self.indices_accessors.insert((indices, start, count), accessor);
    }

    /// Views over a data buffer are shared only between vertex buffers with
    /// the same byte stride.
    pub fn vertex_buffer_view(&self, buffer: BufferId, byte_stride: u32) -> Option<u32> {
        self.vertex_buffer_views.get(&(buffer, byte_stride)).copied()
    }

    pub fn set_vertex_buffer_view(&mut self, buffer: BufferId, byte_stride: u32, view: u32) {
        self.vertex_buffer_views.insert((buffer, byte_stride), view);
    }

    pub fn vertex_accessor(&self, vertex_buffer: VertexBufferId, start: u32, count: u32) -> Option<u32> {
        self.vertex_accessors.get(&(vertex_buffer, start, count)).copied()
    }

    pub fn set_vertex_accessor(
        &mut self,
        vertex_buffer: VertexBufferId,
        start: u32,
        count: u32,
        accessor: u32,
    ) {
        self.vertex_accessors
            .insert((vertex_buffer, start, count), accessor);
    }

    pub fn mesh(&self, mesh: MeshId) -> Option<u32> {
        self.meshes.get(&mesh).copied()
    }

    pub fn set_mesh(&mut self, mesh: MeshId, index: u32) {
        self.meshes.insert(mesh, index);
    }
}
