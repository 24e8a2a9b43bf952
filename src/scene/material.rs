//! Materials and textures.

use super::{MaterialId, TextureId};
use serde::{Deserialize, Serialize};

/// How primitives are rasterized.
///
/// This is an open code rather than an enum: scene data may carry modes the
/// glTF topology mapping does not know, and that is reported at export time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FillMode(pub u32);

impl FillMode {
    pub const TRIANGLE_FILL: Self = Self(0);
    pub const WIREFRAME: Self = Self(1);
    pub const POINT_FILL: Self = Self(2);
    pub const POINT_LIST: Self = Self(3);
    pub const LINE_LIST: Self = Self(4);
    pub const LINE_LOOP: Self = Self(5);
    pub const LINE_STRIP: Self = Self(6);
    pub const TRIANGLE_STRIP: Self = Self(7);
    pub const TRIANGLE_FAN: Self = Self(8);
}

impl Default for FillMode {
    fn default() -> Self {
        Self::TRIANGLE_FILL
    }
}

/// A source material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Material {
    Pbr(PbrMaterial),
    Multi(MultiMaterial),
    /// Any material class the exporter cannot translate.
    #[serde(other)]
    Unsupported,
}

impl Material {
    pub fn name(&self) -> Option<&str> {
        match self {
            Material::Pbr(m) => m.name.as_deref(),
            Material::Multi(m) => m.name.as_deref(),
            Material::Unsupported => None,
        }
    }

    /// Fill mode the material renders with, when it defines one.
    pub fn fill_mode(&self) -> Option<FillMode> {
        match self {
            Material::Pbr(m) => Some(m.fill_mode),
            _ => None,
        }
    }
}

/// Alpha blending behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

/// A metallic-roughness material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbrMaterial {
    pub name: Option<String>,
    /// Linear RGBA.
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: Option<f32>,
    pub back_face_culling: bool,
    pub fill_mode: FillMode,
    pub base_color_texture: Option<TextureId>,
}

impl Default for PbrMaterial {
    fn default() -> Self {
        Self {
            name: None,
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 1.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: None,
            back_face_culling: true,
            fill_mode: FillMode::TRIANGLE_FILL,
            base_color_texture: None,
        }
    }
}

impl PbrMaterial {
    pub fn new(name: impl Into<String>, base_color: [f32; 4]) -> Self {
        Self {
            name: Some(name.into()),
            base_color,
            ..Default::default()
        }
    }

    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.base_color_texture = Some(texture);
        self
    }

    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.fill_mode = fill_mode;
        self
    }
}

/// A material that assigns one sub-material per submesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiMaterial {
    pub name: Option<String>,
    pub sub_materials: Vec<Option<MaterialId>>,
}

/// Texture addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    Repeat,
    Clamp,
    Mirror,
}

/// Texture filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    Nearest,
    Linear,
    #[default]
    Trilinear,
}

/// Image payload of a texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureImage {
    /// Already-encoded PNG bytes.
    Png(Vec<u8>),
    /// Raw RGBA8 pixels, row-major.
    Rgba8 {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

/// A texture referenced by materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub name: String,
    pub image: TextureImage,
    /// UV set the texture samples from.
    #[serde(default)]
    pub coordinates_index: u32,
    #[serde(default)]
    pub wrap_u: WrapMode,
    #[serde(default)]
    pub wrap_v: WrapMode,
    #[serde(default)]
    pub sampling: Sampling,
}

impl Texture {
    pub fn new(name: impl Into<String>, image: TextureImage) -> Self {
        Self {
            name: name.into(),
            image,
            coordinates_index: 0,
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::Repeat,
            sampling: Sampling::Trilinear,
        }
    }
}
