//! # glTF Scene Export
//!
//! A Rust library for exporting in-memory scene graphs to glTF 2.0.
//!
//! ## Overview
//!
//! A [`Scene`] holds nodes, meshes, materials, textures and raw vertex data in
//! handle-addressed arenas. [`GltfExporter`] walks that scene and produces
//! either a `.gltf` document with side files (`.bin`, `.png`) or a single
//! self-contained `.glb` container. Shared vertex data, index arrays, meshes,
//! materials and textures are written once and referenced from everywhere
//! they are used.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gltf_scene_export::{export_glb_blocking, ExportOptions, ExtensionRegistry, Scene};
//!
//! let scene = Scene::from_json(&std::fs::read_to_string("scene.json")?)?;
//!
//! let data = export_glb_blocking(
//!     &scene,
//!     "scene",
//!     ExportOptions::default(),
//!     &ExtensionRegistry::new(),
//! )?;
//! data.write_to_dir("out")?;
//! ```
//!
//! ## Extensions
//!
//! Behaviour can be extended by registering [`GltfExtension`] factories. One
//! instance per export is created from each factory; the exporter calls their
//! hooks after each node, primitive, material and texture is produced:
//!
//! ```ignore
//! use gltf_scene_export::{ExtensionRegistry, GltfExtension};
//!
//! let mut registry = ExtensionRegistry::new();
//! registry.register("EXT_my_extension", |_options| Box::new(MyExtension::default()));
//! ```

pub mod error;
pub mod export;
pub mod scene;

// Re-export main types for convenience
pub use error::{ExportError, Result};
pub use export::{
    encode_glb, export_glb, export_glb_blocking, export_gltf, export_gltf_blocking,
    ExportOptions, ExtensionRegistry, GltfData, GltfExporter, GltfExtension, GltfFile,
    MaterialExporter, PbrMaterialExporter,
};
pub use scene::{
    DataBuffer, Geometry, IndexArray, Material, Mesh, NodeKind, PbrMaterial, Scene, SceneNode,
    SubMesh, Texture, TextureImage, VertexBuffer,
};

#[cfg(feature = "wasm")]
pub mod wasm;
