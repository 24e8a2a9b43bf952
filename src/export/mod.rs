//! glTF 2.0 export.
//!
//! [`GltfExporter`] walks a [`Scene`], lays geometry out in a single binary
//! buffer and produces either a `.gltf` file set or a `.glb` container. The
//! free functions below wrap the common case of one export with default
//! collaborators.

pub mod container;
pub mod data;
pub mod document;
pub mod exporter;
pub mod extension;
pub mod material;
mod mesh;
pub mod options;
pub mod state;
pub mod utils;
pub mod writer;

pub use container::encode_glb;
pub use data::{GltfData, GltfFile};
pub use exporter::{GltfExporter, CONVERSION_ROOT_NAME};
pub use extension::{ExtensionPipeline, ExtensionRegistry, GltfExtension, HookFuture};
pub use material::{MaterialContext, MaterialExporter, PbrMaterialExporter, TextureMap};
pub use options::ExportOptions;

use crate::error::Result;
use crate::scene::Scene;

/// Export `scene` as `<prefix>.gltf` plus its buffer and image files.
pub async fn export_gltf(
    scene: &Scene,
    prefix: &str,
    options: ExportOptions,
    registry: &ExtensionRegistry,
) -> Result<GltfData> {
    let mut exporter = GltfExporter::new(scene, options, registry);
    let result = exporter.export_gltf(prefix).await;
    exporter.dispose();
    result
}

/// Export `scene` as a single `<prefix>.glb`.
pub async fn export_glb(
    scene: &Scene,
    prefix: &str,
    options: ExportOptions,
    registry: &ExtensionRegistry,
) -> Result<GltfData> {
    let mut exporter = GltfExporter::new(scene, options, registry);
    let result = exporter.export_glb(prefix).await;
    exporter.dispose();
    result
}

/// Blocking [`export_gltf`].
pub fn export_gltf_blocking(
    scene: &Scene,
    prefix: &str,
    options: ExportOptions,
    registry: &ExtensionRegistry,
) -> Result<GltfData> {
    pollster::block_on(export_gltf(scene, prefix, options, registry))
}

/// Blocking [`export_glb`].
pub fn export_glb_blocking(
    scene: &Scene,
    prefix: &str,
    options: ExportOptions,
    registry: &ExtensionRegistry,
) -> Result<GltfData> {
    pollster::block_on(export_glb(scene, prefix, options, registry))
}
