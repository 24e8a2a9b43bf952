//! Document assembly and GLB framing.

use super::data::{GltfData, BIN_MIME_TYPE, GLB_MIME_TYPE, GLTF_MIME_TYPE};
use super::document::Document;
use super::utils::{create_buffer_view, padding_to_4};
use crate::error::{ExportError, Result};
use gltf_json as json;
use json::validation::USize64;

/// `"glTF"` read as a little-endian u32.
pub const GLB_MAGIC: u32 = 0x4654_6C67;
pub const GLB_VERSION: u32 = 2;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

/// Root-level fields that do not come from the document lists.
#[derive(Debug, Clone, Default)]
pub(crate) struct Assembly {
    pub generator: String,
    pub extensions_used: Vec<String>,
    pub extensions_required: Vec<String>,
}

/// `<prefix>.gltf`, `<prefix>.bin` when there is binary data, and one file
/// per image.
pub(crate) fn write_gltf(mut document: Document, prefix: &str, assembly: &Assembly) -> Result<GltfData> {
    let binary = std::mem::take(&mut document.writer).into_output_data();
    let images = std::mem::take(&mut document.image_data);

    let bin_name = format!("{}.bin", prefix);
    let buffers = if binary.is_empty() {
        Vec::new()
    } else {
        vec![buffer(binary.len(), Some(bin_name.clone()))]
    };
    let root = into_root(document, buffers, assembly);
    let text = json::serialize::to_string_pretty(&root)?;

    let mut data = GltfData::new();
    data.insert(format!("{}.gltf", prefix), GLTF_MIME_TYPE, text.into_bytes());
    if !binary.is_empty() {
        data.insert(bin_name, BIN_MIME_TYPE, binary);
    }
    for image in images {
        data.insert(image.file_name, image.mime_type, image.bytes);
    }
    log::info!("Assembled glTF output: {} files", data.len());
    Ok(data)
}

/// A single `<prefix>.glb` with images moved into the binary chunk.
pub(crate) fn write_glb(mut document: Document, prefix: &str, assembly: &Assembly) -> Result<GltfData> {
    let mut binary = std::mem::take(&mut document.writer).into_output_data();
    let images = std::mem::take(&mut document.image_data);

    for (image, data) in document.images.iter_mut().zip(&images) {
        document.buffer_views.push(create_buffer_view(
            0,
            binary.len(),
            data.bytes.len(),
            None,
            None,
        ));
        binary.extend_from_slice(&data.bytes);
        image.buffer_view = Some(json::Index::new((document.buffer_views.len() - 1) as u32));
        image.mime_type = Some(json::image::MimeType(data.mime_type.clone()));
        image.uri = None;
    }

    let buffers = if binary.is_empty() {
        Vec::new()
    } else {
        vec![buffer(binary.len(), None)]
    };
    let root = into_root(document, buffers, assembly);
    let text = json::serialize::to_string(&root)?;
    let glb = encode_glb(text.as_bytes(), &binary)?;
    log::info!("Assembled GLB output: {} bytes", glb.len());

    let mut data = GltfData::new();
    data.insert(format!("{}.glb", prefix), GLB_MIME_TYPE, glb);
    Ok(data)
}

/// Frame JSON text and binary payload as a GLB container.
///
/// The JSON chunk is padded with spaces and the binary chunk with zeros, each
/// to a 4-byte boundary. An empty payload writes no binary chunk.
pub fn encode_glb(json: &[u8], binary: &[u8]) -> Result<Vec<u8>> {
    let json_padding = padding_to_4(json.len());
    let padded_json_len = json.len() + json_padding;
    let binary_padding = padding_to_4(binary.len());
    let padded_binary_len = binary.len() + binary_padding;

    let binary_chunk_size = if binary.is_empty() {
        0
    } else {
        8 + padded_binary_len
    };
    let total_size = 12 + 8 + padded_json_len + binary_chunk_size;
    let total_size_u32 = u32::try_from(total_size).map_err(|_| {
        ExportError::Export(format!(
            "GLB output of {} bytes exceeds the container size limit",
            total_size
        ))
    })?;

    let mut glb = Vec::with_capacity(total_size);

    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&total_size_u32.to_le_bytes());

    glb.extend_from_slice(&(padded_json_len as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(json);
    glb.extend(std::iter::repeat(b' ').take(json_padding));

    if !binary.is_empty() {
        glb.extend_from_slice(&(padded_binary_len as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        glb.extend_from_slice(binary);
        glb.extend(std::iter::repeat(0u8).take(binary_padding));
    }

    Ok(glb)
}

fn buffer(byte_length: usize, uri: Option<String>) -> json::Buffer {
    json::Buffer {
        byte_length: USize64(byte_length as u64),
        name: None,
        uri,
        extensions: Default::default(),
        extras: Default::default(),
    }
}

fn into_root(document: Document, buffers: Vec<json::Buffer>, assembly: &Assembly) -> json::Root {
    let scene = (!document.scenes.is_empty()).then(|| json::Index::new(0));
    json::Root {
        accessors: document.accessors,
        animations: document.animations,
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some(assembly.generator.clone()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers,
        buffer_views: document.buffer_views,
        cameras: document.cameras,
        extensions: Default::default(),
        extensions_required: assembly.extensions_required.clone(),
        extensions_used: assembly.extensions_used.clone(),
        extras: Default::default(),
        images: document.images,
        materials: document.materials,
        meshes: document.meshes,
        nodes: document.nodes,
        samplers: document.samplers,
        scene,
        scenes: document.scenes,
        skins: document.skins,
        textures: document.textures,
    }
}
