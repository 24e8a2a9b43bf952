//! Material export.

use super::document::Document;
use super::extension::ExtensionPipeline;
use crate::error::{ExportError, Result};
use crate::scene::{
    AlphaMode, Material, MaterialId, PbrMaterial, Sampling, Scene, Texture, TextureId,
    TextureImage, WrapMode,
};
use gltf_json as json;
use image::ImageEncoder;
use json::validation::Checked::Valid;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

/// Texture infos exported for a material, by source texture.
pub type TextureMap = HashMap<TextureId, json::texture::Info>;

/// Output material index, or `None` when the material could not be exported.
pub type MaterialFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<u32>>> + 'a>>;

const CONTEXT: &str = "exporter";

/// What a material exporter may touch while it runs.
pub struct MaterialContext<'a> {
    pub scene: &'a Scene,
    pub document: &'a mut Document,
    pub extensions: &'a mut ExtensionPipeline,
}

/// Translates source materials to glTF.
///
/// Materials are deduplicated by the caller, so each is exported at most once.
pub trait MaterialExporter {
    /// Export `material`. `has_uvs` tells whether the mesh using it carries
    /// any UV channel. `Ok(None)` leaves the primitive without a material.
    fn export_material<'a>(
        &'a mut self,
        material: MaterialId,
        has_uvs: bool,
        context: MaterialContext<'a>,
    ) -> MaterialFuture<'a>;

    /// Whether an exported material samples textures and so needs UVs.
    fn needs_uvs(&self, material: MaterialId) -> bool;
}

/// Metallic-roughness material exporter.
#[derive(Debug, Default)]
pub struct PbrMaterialExporter {
    textures: TextureMap,
    samplers: HashMap<(WrapMode, WrapMode, Sampling), u32>,
    image_names: HashSet<String>,
    uv_materials: HashSet<MaterialId>,
}

impl PbrMaterialExporter {
    pub fn new() -> Self {
        Self::default()
    }

    async fn export_pbr(
        &mut self,
        id: MaterialId,
        source: &PbrMaterial,
        has_uvs: bool,
        context: &mut MaterialContext<'_>,
    ) -> Result<u32> {
        let mut material = pbr_material(source);
        let mut textures = TextureMap::new();

        if let Some(texture) = source.base_color_texture {
            if let Some(info) = self.export_texture_for(id, texture, has_uvs, context).await? {
                material.pbr_metallic_roughness.base_color_texture = Some(info.clone());
                textures.insert(texture, info);
            }
        }

        let additional =
            context
                .extensions
                .post_export_material_additional_textures(CONTEXT, &material, source);
        for texture in additional {
            if textures.contains_key(&texture) {
                continue;
            }
            if let Some(info) = self.export_texture_for(id, texture, has_uvs, context).await? {
                textures.insert(texture, info);
            }
        }

        let material = context
            .extensions
            .post_export_material(CONTEXT, material, source, &textures)
            .await;
        Ok(context.document.push_material(material))
    }

    async fn export_texture_for(
        &mut self,
        material: MaterialId,
        texture: TextureId,
        has_uvs: bool,
        context: &mut MaterialContext<'_>,
    ) -> Result<Option<json::texture::Info>> {
        if !has_uvs {
            log::warn!(
                "Material {} uses texture {} but its mesh has no UVs; texture skipped",
                material.0,
                texture.0
            );
            return Ok(None);
        }
        let info = self.export_texture(texture, context).await?;
        self.uv_materials.insert(material);
        Ok(Some(info))
    }

    /// Export a texture once and return its info.
    pub async fn export_texture(
        &mut self,
        id: TextureId,
        context: &mut MaterialContext<'_>,
    ) -> Result<json::texture::Info> {
        if let Some(info) = self.textures.get(&id) {
            return Ok(info.clone());
        }

        let scene = context.scene;
        let source = scene.texture(id)?;
        let replacement = context.extensions.pre_export_texture(CONTEXT, source).await;
        let texture = replacement.as_ref().unwrap_or(source);

        let bytes = match &texture.image {
            TextureImage::Png(bytes) => bytes.clone(),
            TextureImage::Rgba8 {
                width,
                height,
                pixels,
            } => encode_png(pixels, *width, *height)?,
        };
        let file_name = self.unique_image_name(&texture.name);
        let image = context
            .document
            .push_png_image(Some(texture.name.clone()), file_name, bytes);
        let sampler = self.sampler(texture, context.document);
        let index = context.document.push_texture(json::Texture {
            name: Some(texture.name.clone()),
            sampler: Some(json::Index::new(sampler)),
            source: json::Index::new(image),
            extensions: Default::default(),
            extras: Default::default(),
        });

        let mut info = json::texture::Info {
            index: json::Index::new(index),
            tex_coord: texture.coordinates_index,
            extensions: Default::default(),
            extras: Default::default(),
        };
        context
            .extensions
            .post_export_texture(CONTEXT, &mut info, texture);

        self.textures.insert(id, info.clone());
        Ok(info)
    }

    fn sampler(&mut self, texture: &Texture, document: &mut Document) -> u32 {
        let key = (texture.wrap_u, texture.wrap_v, texture.sampling);
        if let Some(&index) = self.samplers.get(&key) {
            return index;
        }
        let (mag_filter, min_filter) = filters(texture.sampling);
        let index = document.push_sampler(json::texture::Sampler {
            mag_filter: Some(Valid(mag_filter)),
            min_filter: Some(Valid(min_filter)),
            name: None,
            wrap_s: Valid(wrapping_mode(texture.wrap_u)),
            wrap_t: Valid(wrapping_mode(texture.wrap_v)),
            extensions: Default::default(),
            extras: Default::default(),
        });
        self.samplers.insert(key, index);
        index
    }

    /// A `.png` file name derived from `name` that no earlier image uses.
    fn unique_image_name(&mut self, name: &str) -> String {
        let stem: String = name
            .trim_end_matches(".png")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stem = if stem.is_empty() { "texture".to_string() } else { stem };

        let mut candidate = format!("{}.png", stem);
        let mut suffix = 1;
        while self.image_names.contains(&candidate) {
            candidate = format!("{}_{}.png", stem, suffix);
            suffix += 1;
        }
        self.image_names.insert(candidate.clone());
        candidate
    }
}

impl MaterialExporter for PbrMaterialExporter {
    fn export_material<'a>(
        &'a mut self,
        material: MaterialId,
        has_uvs: bool,
        mut context: MaterialContext<'a>,
    ) -> MaterialFuture<'a> {
        Box::pin(async move {
            let scene = context.scene;
            match scene.material(material)? {
                Material::Pbr(source) => self
                    .export_pbr(material, source, has_uvs, &mut context)
                    .await
                    .map(Some),
                Material::Multi(_) => {
                    log::warn!(
                        "Material {} is a multi-material and cannot be exported directly",
                        material.0
                    );
                    Ok(None)
                }
                Material::Unsupported => {
                    log::warn!("Material {} has an unsupported type", material.0);
                    Ok(None)
                }
            }
        })
    }

    fn needs_uvs(&self, material: MaterialId) -> bool {
        self.uv_materials.contains(&material)
    }
}

fn pbr_material(source: &PbrMaterial) -> json::Material {
    let alpha_mode = match source.alpha_mode {
        AlphaMode::Opaque => json::material::AlphaMode::Opaque,
        AlphaMode::Mask => json::material::AlphaMode::Mask,
        AlphaMode::Blend => json::material::AlphaMode::Blend,
    };
    let alpha_cutoff = match source.alpha_mode {
        AlphaMode::Mask => source.alpha_cutoff.map(json::material::AlphaCutoff),
        _ => None,
    };

    json::Material {
        name: source.name.clone(),
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_texture: None,
            base_color_factor: json::material::PbrBaseColorFactor(source.base_color),
            metallic_factor: json::material::StrengthFactor(source.metallic),
            roughness_factor: json::material::StrengthFactor(source.roughness),
            metallic_roughness_texture: None,
            extensions: Default::default(),
            extras: Default::default(),
        },
        alpha_mode: Valid(alpha_mode),
        alpha_cutoff,
        double_sided: !source.back_face_culling,
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: json::material::EmissiveFactor(source.emissive),
        extensions: Default::default(),
        extras: Default::default(),
    }
}

fn wrapping_mode(mode: WrapMode) -> json::texture::WrappingMode {
    match mode {
        WrapMode::Repeat => json::texture::WrappingMode::Repeat,
        WrapMode::Clamp => json::texture::WrappingMode::ClampToEdge,
        WrapMode::Mirror => json::texture::WrappingMode::MirroredRepeat,
    }
}

fn filters(sampling: Sampling) -> (json::texture::MagFilter, json::texture::MinFilter) {
    use json::texture::{MagFilter, MinFilter};
    match sampling {
        Sampling::Nearest => (MagFilter::Nearest, MinFilter::Nearest),
        Sampling::Linear => (MagFilter::Linear, MinFilter::Linear),
        Sampling::Trilinear => (MagFilter::Linear, MinFilter::LinearMipmapLinear),
    }
}

/// Encode raw RGBA8 pixels as PNG.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(ExportError::Export(format!(
            "Texture is {}x{} but has {} bytes of RGBA8 data, expected {}",
            width,
            height,
            pixels.len(),
            expected
        )));
    }

    let mut bytes = Vec::new();
    let cursor = std::io::Cursor::new(&mut bytes);
    let encoder = image::codecs::png::PngEncoder::new(cursor);
    encoder.write_image(pixels, width, height, image::ExtendedColorType::Rgba8)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MultiMaterial;

    fn export(
        exporter: &mut PbrMaterialExporter,
        scene: &Scene,
        document: &mut Document,
        material: MaterialId,
        has_uvs: bool,
    ) -> Option<u32> {
        let mut extensions = ExtensionPipeline::default();
        let context = MaterialContext {
            scene,
            document,
            extensions: &mut extensions,
        };
        pollster::block_on(exporter.export_material(material, has_uvs, context)).unwrap()
    }

    fn red_pixel_texture(name: &str) -> Texture {
        Texture::new(
            name,
            TextureImage::Rgba8 {
                width: 1,
                height: 1,
                pixels: vec![255, 0, 0, 255],
            },
        )
    }

    #[test]
    fn test_pbr_material_factors() {
        let mut scene = Scene::new();
        let mut source = PbrMaterial::new("red", [1.0, 0.0, 0.0, 1.0]);
        source.back_face_culling = false;
        source.alpha_mode = AlphaMode::Mask;
        source.alpha_cutoff = Some(0.25);
        let id = scene.add_material(Material::Pbr(source));

        let mut document = Document::new();
        let mut exporter = PbrMaterialExporter::new();
        assert_eq!(export(&mut exporter, &scene, &mut document, id, false), Some(0));

        let material = &document.materials[0];
        assert_eq!(material.name.as_deref(), Some("red"));
        assert!(material.double_sided);
        assert_eq!(material.alpha_cutoff.as_ref().map(|c| c.0), Some(0.25));
        assert_eq!(
            material.pbr_metallic_roughness.base_color_factor.0,
            [1.0, 0.0, 0.0, 1.0]
        );
        assert!(!exporter.needs_uvs(id));
    }

    #[test]
    fn test_unsupported_and_multi_materials_are_skipped() {
        let mut scene = Scene::new();
        let unsupported = scene.add_material(Material::Unsupported);
        let multi = scene.add_material(Material::Multi(MultiMaterial::default()));

        let mut document = Document::new();
        let mut exporter = PbrMaterialExporter::new();
        assert_eq!(export(&mut exporter, &scene, &mut document, unsupported, true), None);
        assert_eq!(export(&mut exporter, &scene, &mut document, multi, true), None);
        assert!(document.materials.is_empty());
    }

    #[test]
    fn test_textures_and_samplers_are_shared() {
        let mut scene = Scene::new();
        let texture = scene.add_texture(red_pixel_texture("wall"));
        let a = scene.add_material(Material::Pbr(
            PbrMaterial::new("a", [1.0; 4]).with_texture(texture),
        ));
        let b = scene.add_material(Material::Pbr(
            PbrMaterial::new("b", [1.0; 4]).with_texture(texture),
        ));

        let mut document = Document::new();
        let mut exporter = PbrMaterialExporter::new();
        export(&mut exporter, &scene, &mut document, a, true);
        export(&mut exporter, &scene, &mut document, b, true);

        assert_eq!(document.materials.len(), 2);
        assert_eq!(document.textures.len(), 1);
        assert_eq!(document.samplers.len(), 1);
        assert_eq!(document.images.len(), 1);
        assert_eq!(document.image_data[0].file_name, "wall.png");
        assert_eq!(&document.image_data[0].bytes[1..4], b"PNG");
        assert!(exporter.needs_uvs(a) && exporter.needs_uvs(b));
    }

    #[test]
    fn test_texture_without_uvs_is_dropped() {
        let mut scene = Scene::new();
        let texture = scene.add_texture(red_pixel_texture("wall"));
        let id = scene.add_material(Material::Pbr(
            PbrMaterial::new("m", [1.0; 4]).with_texture(texture),
        ));

        let mut document = Document::new();
        let mut exporter = PbrMaterialExporter::new();
        assert_eq!(export(&mut exporter, &scene, &mut document, id, false), Some(0));
        assert!(document.materials[0]
            .pbr_metallic_roughness
            .base_color_texture
            .is_none());
        assert!(document.textures.is_empty());
        assert!(!exporter.needs_uvs(id));
    }

    #[test]
    fn test_image_names_are_unique() {
        let mut exporter = PbrMaterialExporter::new();
        assert_eq!(exporter.unique_image_name("brick wall.png"), "brick_wall.png");
        assert_eq!(exporter.unique_image_name("brick wall"), "brick_wall_1.png");
        assert_eq!(exporter.unique_image_name(""), "texture.png");
    }

    #[test]
    fn test_encode_png_checks_pixel_count() {
        assert!(encode_png(&[0; 3], 1, 1).is_err());
        let png = encode_png(&[0; 16], 2, 2).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }
}
