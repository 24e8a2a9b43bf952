//! Meshes, submeshes and the buffers backing them.

use super::{BufferId, IndexArrayId, MaterialId, VertexBufferId};
use super::material::FillMode;
use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};

/// A mesh: shared geometry split into submeshes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mesh {
    pub name: Option<String>,
    /// Geometry, or `None` for a mesh with nothing to render.
    pub geometry: Option<Geometry>,
    pub submeshes: Vec<SubMesh>,
    /// Material for every submesh. A multi-material is indexed per submesh.
    pub material: Option<MaterialId>,
    /// Fill mode that takes precedence over the material's.
    pub override_fill_mode: Option<FillMode>,
}

impl Mesh {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_submesh(mut self, submesh: SubMesh) -> Self {
        self.submeshes.push(submesh);
        self
    }
}

/// Index and vertex data of a mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    /// Index array, or `None` for non-indexed geometry.
    pub indices: Option<IndexArrayId>,
    pub vertex_buffers: Vec<VertexBufferId>,
}

/// A contiguous range of a mesh drawn with one material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubMesh {
    /// Index into a multi-material's sub-materials.
    pub material_index: u32,
    pub vertex_start: u32,
    pub vertex_count: u32,
    pub index_start: u32,
    pub index_count: u32,
}

impl SubMesh {
    /// A submesh covering `vertex_count` vertices from the start of the
    /// buffers, with `index_count` indices.
    ///
    /// Index values are local to `vertex_start`.
    pub fn covering(vertex_count: u32, index_count: u32) -> Self {
        Self {
            vertex_count,
            index_count,
            ..Default::default()
        }
    }
}

/// Triangle (or line/point) indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexArray {
    /// 2-byte storage.
    U16(Vec<u16>),
    /// 4-byte storage, always exported as 32-bit.
    U32(Vec<u32>),
    /// Untyped list; exported as 16-bit when every value fits.
    List(Vec<u32>),
}

impl IndexArray {
    pub fn len(&self) -> usize {
        match self {
            IndexArray::U16(v) => v.len(),
            IndexArray::U32(v) | IndexArray::List(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            IndexArray::U16(v) => v.get(i).map(|&x| x as u32),
            IndexArray::U32(v) | IndexArray::List(v) => v.get(i).copied(),
        }
    }

    /// Whether the storage itself uses 4 bytes per index.
    pub fn has_32_bit_storage(&self) -> bool {
        matches!(self, IndexArray::U32(_))
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

/// Raw little-endian bytes backing one or more vertex buffers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BufferSource", into = "BufferSource")]
pub struct DataBuffer {
    pub bytes: Vec<u8>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BufferSource {
    Bytes(Vec<u8>),
    Floats(Vec<f32>),
}

impl From<BufferSource> for DataBuffer {
    fn from(source: BufferSource) -> Self {
        match source {
            BufferSource::Bytes(bytes) => Self { bytes },
            BufferSource::Floats(floats) => Self::from_floats(&floats),
        }
    }
}

impl From<DataBuffer> for BufferSource {
    fn from(buffer: DataBuffer) -> Self {
        BufferSource::Bytes(buffer.bytes)
    }
}

impl DataBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn from_floats(floats: &[f32]) -> Self {
        Self {
            bytes: floats.iter().flat_map(|f| f.to_le_bytes()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Component type of vertex data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    #[default]
    Float,
}

impl ComponentType {
    pub fn byte_size(self) -> u32 {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort => 2,
            ComponentType::Int | ComponentType::UnsignedInt | ComponentType::Float => 4,
        }
    }
}

/// A typed view of one vertex attribute inside a [`DataBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexBuffer {
    pub buffer: BufferId,
    /// Attribute kind, e.g. `"position"`, `"normal"`, `"uv"`, `"uv2"`.
    pub kind: String,
    #[serde(default)]
    pub byte_offset: u32,
    pub byte_stride: u32,
    /// Components per element.
    pub size: u32,
    #[serde(default)]
    pub component_type: ComponentType,
    #[serde(default)]
    pub normalized: bool,
}

impl VertexBuffer {
    /// A tightly packed float attribute starting at the beginning of `buffer`.
    pub fn floats(buffer: BufferId, kind: impl Into<String>, size: u32) -> Self {
        Self {
            buffer,
            kind: kind.into(),
            byte_offset: 0,
            byte_stride: size * 4,
            size,
            component_type: ComponentType::Float,
            normalized: false,
        }
    }

    /// Bytes of one element.
    fn element_size(&self) -> u64 {
        u64::from(self.size) * u64::from(self.component_type.byte_size())
    }

    /// Number of whole elements `data` holds for this view.
    pub fn element_count(&self, data: &DataBuffer) -> u32 {
        let element_size = self.element_size();
        let available = (data.len() as u64).saturating_sub(u64::from(self.byte_offset));
        if self.byte_stride == 0 || available < element_size {
            return 0;
        }
        let count = (available - element_size) / u64::from(self.byte_stride) + 1;
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Byte length needed to read `count` elements from `vertex_start`, or
    /// `None` when it does not fit in memory.
    pub fn required_len(&self, vertex_start: u32, count: u32) -> Option<usize> {
        if count == 0 {
            return Some(0);
        }
        let last = u64::from(vertex_start) + u64::from(count) - 1;
        let needed = last
            .checked_mul(u64::from(self.byte_stride))?
            .checked_add(u64::from(self.byte_offset) + self.element_size())?;
        usize::try_from(needed).ok()
    }

    /// Read `count` elements from `vertex_start` as tightly packed floats.
    pub fn read_floats(
        &self,
        buffer_id: BufferId,
        data: &DataBuffer,
        vertex_start: u32,
        count: u32,
    ) -> Result<Vec<f32>> {
        if self.component_type != ComponentType::Float {
            return Err(ExportError::UnsupportedAttributeFormat(format!(
                "{} data must be float, found {:?}",
                self.kind, self.component_type
            )));
        }
        match self.required_len(vertex_start, count) {
            Some(needed) if needed <= data.len() => {}
            needed => {
                return Err(ExportError::BufferOutOfRange {
                    buffer: buffer_id.0,
                    len: data.len(),
                    needed: needed.unwrap_or(usize::MAX),
                })
            }
        }

        let mut floats = Vec::with_capacity(count as usize * self.size as usize);
        for vertex in 0..count as usize {
            let base = self.byte_offset as usize
                + (vertex_start as usize + vertex) * self.byte_stride as usize;
            for component in 0..self.size as usize {
                let at = base + component * 4;
                let bytes = data.bytes.get(at..at + 4).ok_or(ExportError::BufferOutOfRange {
                    buffer: buffer_id.0,
                    len: data.len(),
                    needed: at + 4,
                })?;
                floats.push(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
            }
        }
        Ok(floats)
    }
}
