//! WASM bindings for gltf-scene-export.
//!
//! This module provides JavaScript-friendly APIs for use in the browser.

use crate::{ExportOptions, ExtensionRegistry, GltfData, Scene};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the browser console
    console_error_panic_hook::set_once();
}

/// Export configuration options.
#[wasm_bindgen]
pub struct ExportSettings {
    export_unused_uvs: bool,
    remove_noop_root_nodes: bool,
    conversion_nodes: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl ExportSettings {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ExportSettings {
        ExportSettings {
            export_unused_uvs: false,
            remove_noop_root_nodes: true,
            conversion_nodes: false,
        }
    }

    #[wasm_bindgen(setter)]
    pub fn set_export_unused_uvs(&mut self, value: bool) {
        self.export_unused_uvs = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_remove_noop_root_nodes(&mut self, value: bool) {
        self.remove_noop_root_nodes = value;
    }

    #[wasm_bindgen(setter)]
    pub fn set_conversion_nodes(&mut self, value: bool) {
        self.conversion_nodes = value;
    }
}

impl ExportSettings {
    fn to_options(&self) -> ExportOptions {
        ExportOptions::default()
            .with_export_unused_uvs(self.export_unused_uvs)
            .with_remove_noop_root_nodes(self.remove_noop_root_nodes)
            .with_coordinate_system_conversion_nodes(self.conversion_nodes)
    }
}

fn parse_scene(scene_json: &str) -> Result<Scene, JsError> {
    Scene::from_json(scene_json).map_err(|e| JsError::new(&format!("Invalid scene: {}", e)))
}

fn files_to_map(data: &GltfData) -> js_sys::Map {
    let map = js_sys::Map::new();
    for file in data.files() {
        let bytes = js_sys::Uint8Array::from(file.data.as_slice());
        map.set(&JsValue::from_str(&file.name), &bytes);
    }
    map
}

/// Export a JSON scene description as a GLB container.
#[wasm_bindgen(js_name = exportGlb)]
pub fn export_glb(
    scene_json: &str,
    prefix: &str,
    settings: Option<ExportSettings>,
) -> Result<Vec<u8>, JsError> {
    let scene = parse_scene(scene_json)?;
    let options = settings.unwrap_or_default().to_options();

    let data = crate::export_glb_blocking(&scene, prefix, options, &ExtensionRegistry::new())
        .map_err(|e| JsError::new(&e.to_string()))?;

    let name = format!("{}.glb", prefix);
    data.get(&name)
        .map(|file| file.data.clone())
        .ok_or_else(|| JsError::new(&format!("Export produced no {}", name)))
}

/// Export a JSON scene description as glTF.
///
/// Returns a `Map` from file name to `Uint8Array` holding the `.gltf`
/// document, its `.bin` buffer and any images.
#[wasm_bindgen(js_name = exportGltf)]
pub fn export_gltf(
    scene_json: &str,
    prefix: &str,
    settings: Option<ExportSettings>,
) -> Result<js_sys::Map, JsError> {
    let scene = parse_scene(scene_json)?;
    let options = settings.unwrap_or_default().to_options();

    let data = crate::export_gltf_blocking(&scene, prefix, options, &ExtensionRegistry::new())
        .map_err(|e| JsError::new(&e.to_string()))?;

    Ok(files_to_map(&data))
}
