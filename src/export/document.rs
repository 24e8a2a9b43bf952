//! Output glTF lists under construction.

use super::utils::create_buffer_view;
use super::writer::BinaryWriter;
use gltf_json as json;

pub const PNG_MIME_TYPE: &str = "image/png";

/// Encoded bytes of an exported image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// File name the `.gltf` output refers to.
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Top-level glTF lists plus the binary payload they describe.
///
/// Every `push_*` appends and returns the new element's index. Indices are
/// never reused or reordered, so an index handed out once stays valid for the
/// rest of the export.
#[derive(Debug, Default)]
pub struct Document {
    pub accessors: Vec<json::Accessor>,
    pub buffer_views: Vec<json::buffer::View>,
    pub meshes: Vec<json::Mesh>,
    pub nodes: Vec<json::Node>,
    pub materials: Vec<json::Material>,
    pub textures: Vec<json::Texture>,
    pub samplers: Vec<json::texture::Sampler>,
    pub images: Vec<json::Image>,
    /// Parallel to `images`.
    pub image_data: Vec<ImageData>,
    pub scenes: Vec<json::Scene>,
    pub cameras: Vec<json::Camera>,
    pub animations: Vec<json::Animation>,
    pub skins: Vec<json::Skin>,
    pub writer: BinaryWriter,
}

fn push<T>(list: &mut Vec<T>, item: T) -> u32 {
    list.push(item);
    (list.len() - 1) as u32
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_accessor(&mut self, accessor: json::Accessor) -> u32 {
        push(&mut self.accessors, accessor)
    }

    pub fn push_buffer_view(&mut self, view: json::buffer::View) -> u32 {
        push(&mut self.buffer_views, view)
    }

    pub fn push_mesh(&mut self, mesh: json::Mesh) -> u32 {
        push(&mut self.meshes, mesh)
    }

    pub fn push_node(&mut self, node: json::Node) -> u32 {
        push(&mut self.nodes, node)
    }

    pub fn push_material(&mut self, material: json::Material) -> u32 {
        push(&mut self.materials, material)
    }

    pub fn push_texture(&mut self, texture: json::Texture) -> u32 {
        push(&mut self.textures, texture)
    }

    pub fn push_sampler(&mut self, sampler: json::texture::Sampler) -> u32 {
        push(&mut self.samplers, sampler)
    }

    pub fn push_scene(&mut self, scene: json::Scene) -> u32 {
        push(&mut self.scenes, scene)
    }

    /// Add a PNG image stored as `file_name` next to the `.gltf` file.
    pub fn push_png_image(&mut self, name: Option<String>, file_name: String, bytes: Vec<u8>) -> u32 {
        self.image_data.push(ImageData {
            file_name: file_name.clone(),
            mime_type: PNG_MIME_TYPE.to_string(),
            bytes,
        });
        push(
            &mut self.images,
            json::Image {
                buffer_view: None,
                mime_type: Some(json::image::MimeType(PNG_MIME_TYPE.to_string())),
                name,
                uri: Some(file_name),
                extensions: Default::default(),
                extras: Default::default(),
            },
        )
    }

    /// Append a buffer view over the bytes `write` emits.
    ///
    /// The view starts on a 4-byte boundary; the gap before it is zero-filled.
    pub fn write_buffer_view(
        &mut self,
        byte_stride: Option<u32>,
        name: Option<String>,
        write: impl FnOnce(&mut BinaryWriter),
    ) -> u32 {
        self.writer.align(4);
        let start = self.writer.byte_offset();
        write(&mut self.writer);
        let length = self.writer.byte_offset() - start;
        self.push_buffer_view(create_buffer_view(0, start, length, byte_stride, name))
    }
}
