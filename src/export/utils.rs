//! Descriptor builders and attribute/topology mappings.
//!
//! Everything here is stateless; the exporter composes these to lay out the
//! binary buffer and describe it in JSON.

use crate::error::{ExportError, Result};
use crate::scene::{ComponentType, FillMode, IndexArray};
use glam::{Quat, Vec3};
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;

/// Create a buffer view into buffer `buffer_index`.
///
/// A zero `byte_offset`, a zero or absent `byte_stride` and an absent `name`
/// are omitted from the JSON rather than written out.
pub fn create_buffer_view(
    buffer_index: u32,
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<u32>,
    name: Option<String>,
) -> json::buffer::View {
    json::buffer::View {
        buffer: json::Index::new(buffer_index),
        byte_length: USize64(byte_length as u64),
        byte_offset: (byte_offset != 0).then(|| USize64(byte_offset as u64)),
        byte_stride: byte_stride
            .filter(|&stride| stride != 0)
            .map(|stride| json::buffer::Stride(stride as usize)),
        extensions: Default::default(),
        extras: Default::default(),
        name,
        target: None,
    }
}

/// Create an accessor over `buffer_view`.
///
/// Unlike buffer views, an explicit `Some(0)` byte offset is kept.
pub fn create_accessor(
    buffer_view: u32,
    type_: json::accessor::Type,
    component_type: json::accessor::ComponentType,
    count: usize,
    byte_offset: Option<usize>,
    min: Option<Vec<f32>>,
    max: Option<Vec<f32>>,
) -> json::Accessor {
    json::Accessor {
        buffer_view: Some(json::Index::new(buffer_view)),
        byte_offset: byte_offset.map(|offset| USize64(offset as u64)),
        count: USize64(count as u64),
        component_type: Valid(json::accessor::GenericComponentType(component_type)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Valid(type_),
        min: min.map(json::Value::from),
        max: max.map(json::Value::from),
        name: None,
        normalized: false,
        sparse: None,
    }
}

/// Component-wise bounds of `vertex_count` packed xyz positions starting at
/// vertex `vertex_start`.
///
/// With no vertices the `+inf`/`-inf` sentinels come back unchanged.
pub fn calculate_min_max_positions(
    positions: &[f32],
    vertex_start: usize,
    vertex_count: usize,
) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];

    let start = vertex_start * 3;
    let end = start + vertex_count * 3;
    for position in positions[start..end].chunks_exact(3) {
        for i in 0..3 {
            min[i] = min[i].min(position[i]);
            max[i] = max[i].max(position[i]);
        }
    }

    (min, max)
}

/// The closed set of vertex attributes the exporter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    Normal,
    Tangent,
    Color,
    /// UV channel 0 through 5.
    TexCoord(u32),
    /// Joint indices, first or second set.
    Joints(u32),
    /// Joint weights, first or second set.
    Weights(u32),
}

impl VertexAttribute {
    /// Parse a vertex buffer kind such as `"position"` or `"uv3"`.
    pub fn from_kind(kind: &str) -> Result<Self> {
        let attribute = match kind {
            "position" => VertexAttribute::Position,
            "normal" => VertexAttribute::Normal,
            "tangent" => VertexAttribute::Tangent,
            "color" => VertexAttribute::Color,
            "uv" => VertexAttribute::TexCoord(0),
            "uv2" => VertexAttribute::TexCoord(1),
            "uv3" => VertexAttribute::TexCoord(2),
            "uv4" => VertexAttribute::TexCoord(3),
            "uv5" => VertexAttribute::TexCoord(4),
            "uv6" => VertexAttribute::TexCoord(5),
            "matricesIndices" => VertexAttribute::Joints(0),
            "matricesIndicesExtra" => VertexAttribute::Joints(1),
            "matricesWeights" => VertexAttribute::Weights(0),
            "matricesWeightsExtra" => VertexAttribute::Weights(1),
            other => return Err(ExportError::UnknownVertexKind(other.to_string())),
        };
        Ok(attribute)
    }

    /// Element shape of the accessor for this attribute.
    pub fn accessor_type(self, color_has_alpha: bool) -> json::accessor::Type {
        use json::accessor::Type;
        match self {
            VertexAttribute::Position | VertexAttribute::Normal => Type::Vec3,
            VertexAttribute::Color if !color_has_alpha => Type::Vec3,
            VertexAttribute::Color
            | VertexAttribute::Tangent
            | VertexAttribute::Joints(_)
            | VertexAttribute::Weights(_) => Type::Vec4,
            VertexAttribute::TexCoord(_) => Type::Vec2,
        }
    }

    /// glTF semantic name of the attribute slot.
    pub fn semantic(self) -> json::mesh::Semantic {
        use json::mesh::Semantic;
        match self {
            VertexAttribute::Position => Semantic::Positions,
            VertexAttribute::Normal => Semantic::Normals,
            VertexAttribute::Tangent => Semantic::Tangents,
            VertexAttribute::Color => Semantic::Colors(0),
            VertexAttribute::TexCoord(set) => Semantic::TexCoords(set),
            VertexAttribute::Joints(set) => Semantic::Joints(set),
            VertexAttribute::Weights(set) => Semantic::Weights(set),
        }
    }
}

/// Whether a vertex buffer kind names a UV channel.
pub fn is_uv_kind(kind: &str) -> bool {
    kind.starts_with("uv")
}

/// Map a fill mode to the glTF primitive topology.
pub fn primitive_mode(fill_mode: FillMode) -> Result<json::mesh::Mode> {
    use json::mesh::Mode;
    let mode = match fill_mode {
        FillMode::TRIANGLE_FILL => Mode::Triangles,
        FillMode::TRIANGLE_STRIP => Mode::TriangleStrip,
        FillMode::TRIANGLE_FAN => Mode::TriangleFan,
        FillMode::POINT_LIST | FillMode::POINT_FILL => Mode::Points,
        FillMode::WIREFRAME | FillMode::LINE_LOOP => Mode::LineLoop,
        FillMode::LINE_LIST => Mode::Lines,
        FillMode::LINE_STRIP => Mode::LineStrip,
        FillMode(other) => return Err(ExportError::UnknownFillMode(other)),
    };
    Ok(mode)
}

/// Map a vertex component type to its glTF component type.
pub fn component_type(component_type: ComponentType) -> Result<json::accessor::ComponentType> {
    use json::accessor::ComponentType as Gltf;
    let mapped = match component_type {
        ComponentType::Byte => Gltf::I8,
        ComponentType::UnsignedByte => Gltf::U8,
        ComponentType::Short => Gltf::I16,
        ComponentType::UnsignedShort => Gltf::U16,
        ComponentType::UnsignedInt => Gltf::U32,
        ComponentType::Float => Gltf::F32,
        ComponentType::Int => {
            return Err(ExportError::UnsupportedAttributeFormat(
                "signed 32-bit integer attributes".to_string(),
            ))
        }
    };
    Ok(mapped)
}

/// Element width of an exported index array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    pub fn byte_size(self) -> usize {
        match self {
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }

    pub fn component_type(self) -> json::accessor::ComponentType {
        match self {
            IndexWidth::U16 => json::accessor::ComponentType::U16,
            IndexWidth::U32 => json::accessor::ComponentType::U32,
        }
    }

    /// Width needed for `count` indices from `start`: 32-bit when the storage
    /// is already 4 bytes per element or a value exceeds 65535.
    pub fn for_range(indices: &IndexArray, start: usize, count: usize) -> Self {
        if indices.has_32_bit_storage() {
            return IndexWidth::U32;
        }
        let exceeds = (start..start + count)
            .filter_map(|i| indices.get(i))
            .any(|value| value > u16::MAX as u32);
        if exceeds {
            IndexWidth::U32
        } else {
            IndexWidth::U16
        }
    }
}

/// Mirror a position across the XY plane.
pub fn convert_to_right_handed_position(position: &mut Vec3) {
    position.z = -position.z;
}

/// Mirror a rotation to match [`convert_to_right_handed_position`].
pub fn convert_to_right_handed_rotation(rotation: &mut Quat) {
    *rotation = Quat::from_xyzw(-rotation.x, -rotation.y, rotation.z, rotation.w);
}

/// Bytes needed to pad `length` to a 4-byte boundary.
pub fn padding_to_4(length: usize) -> usize {
    (4 - length % 4) % 4
}
