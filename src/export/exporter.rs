//! Scene graph walk and node export.

use super::container::{self, Assembly};
use super::data::GltfData;
use super::document::Document;
use super::extension::{ExtensionPipeline, ExtensionRegistry};
use super::material::{MaterialContext, MaterialExporter, PbrMaterialExporter};
use super::options::{gltf_extras, ExportOptions};
use super::state::ExporterState;
use super::utils::{convert_to_right_handed_position, convert_to_right_handed_rotation};
use crate::error::{ExportError, Result};
use crate::scene::{MaterialId, NodeId, NodeKind, Scene, SceneNode};
use glam::{Mat4, Quat, Vec3};
use gltf_json as json;
use std::collections::{HashMap, HashSet};

const CONTEXT: &str = "exporter";

/// Name of the node wrapping a left-handed scene when conversion nodes are
/// requested.
pub const CONVERSION_ROOT_NAME: &str = "__root__";

const NOOP_EPSILON: f32 = 1e-6;

/// Exports one scene to glTF or GLB.
///
/// An exporter runs a single export. Its extension instances stay alive until
/// [`GltfExporter::dispose`] is called.
pub struct GltfExporter<'s> {
    scene: Option<&'s Scene>,
    pub(super) options: ExportOptions,
    pub(super) document: Document,
    pub(super) extensions: ExtensionPipeline,
    material_exporter: Box<dyn MaterialExporter>,
    /// Cache for geometry exported as authored.
    original_state: ExporterState,
    /// Cache for geometry exported under right-handed conversion.
    right_handed_state: ExporterState,
    materials: HashMap<MaterialId, Option<u32>>,
    node_map: HashMap<NodeId, u32>,
    convert_to_right_handed: HashSet<NodeId>,
    exported: bool,
}

impl<'s> GltfExporter<'s> {
    /// Create an exporter with one instance of every registered extension.
    pub fn new(
        scene: impl Into<Option<&'s Scene>>,
        options: ExportOptions,
        registry: &ExtensionRegistry,
    ) -> Self {
        let extensions = registry.instantiate(&options);
        Self {
            scene: scene.into(),
            options,
            document: Document::new(),
            extensions,
            material_exporter: Box::new(PbrMaterialExporter::new()),
            original_state: ExporterState::new(),
            right_handed_state: ExporterState::new(),
            materials: HashMap::new(),
            node_map: HashMap::new(),
            convert_to_right_handed: HashSet::new(),
            exported: false,
        }
    }

    /// Replace the default metallic-roughness material exporter.
    pub fn with_material_exporter(mut self, exporter: impl MaterialExporter + 'static) -> Self {
        self.material_exporter = Box::new(exporter);
        self
    }

    /// Export as `<prefix>.gltf`, `<prefix>.bin` and image files.
    pub async fn export_gltf(&mut self, prefix: &str) -> Result<GltfData> {
        self.export_scene().await?;
        self.extensions.on_exporting();
        let assembly = self.assembly();
        container::write_gltf(std::mem::take(&mut self.document), prefix, &assembly)
    }

    /// Export as a single `<prefix>.glb`.
    pub async fn export_glb(&mut self, prefix: &str) -> Result<GltfData> {
        self.export_scene().await?;
        self.extensions.on_exporting();
        let assembly = self.assembly();
        container::write_glb(std::mem::take(&mut self.document), prefix, &assembly)
    }

    /// Release the extension instances.
    pub fn dispose(&mut self) {
        self.extensions.dispose();
    }

    fn assembly(&self) -> Assembly {
        Assembly {
            generator: self.options.generator.clone(),
            extensions_used: self.extensions.used_names(),
            extensions_required: self.extensions.required_names(),
        }
    }

    pub(super) fn state(&self, right_handed: bool) -> &ExporterState {
        if right_handed {
            &self.right_handed_state
        } else {
            &self.original_state
        }
    }

    pub(super) fn state_mut(&mut self, right_handed: bool) -> &mut ExporterState {
        if right_handed {
            &mut self.right_handed_state
        } else {
            &mut self.original_state
        }
    }

    async fn export_scene(&mut self) -> Result<()> {
        let scene = self.scene.ok_or(ExportError::NoScene)?;
        if self.exported {
            return Err(ExportError::Export(
                "Exporter has already produced its output".to_string(),
            ));
        }
        self.exported = true;

        let mut nodes = self.collect_nodes(scene)?;
        log::debug!("Collected {} nodes for export", nodes.len());

        let left_handed = !scene.use_right_handed_system;
        let use_conversion_root =
            left_handed && self.options.include_coordinate_system_conversion_nodes;
        if left_handed && !use_conversion_root {
            self.convert_to_right_handed = nodes.iter().copied().collect();
        }

        if self.options.remove_noop_root_nodes && !use_conversion_root {
            self.remove_noop_roots(scene, &mut nodes)?;
        }

        let mut exported = Vec::with_capacity(nodes.len());
        for &id in &nodes {
            let index = self.export_node(scene, id).await?;
            self.node_map.insert(id, index);
            exported.push((id, index));
        }

        let mut roots = Vec::new();
        for &(id, index) in &exported {
            let parent = scene
                .node(id)?
                .parent
                .and_then(|parent| self.node_map.get(&parent).copied());
            match parent {
                Some(parent) => self.document.nodes[parent as usize]
                    .children
                    .get_or_insert_with(Vec::new)
                    .push(json::Index::new(index)),
                None => roots.push(index),
            }
        }

        if use_conversion_root {
            let root = self.document.push_node(conversion_root(&roots));
            roots = vec![root];
        }

        let extras = match self.options.select_metadata(scene.metadata.as_ref()) {
            Some(value) => Some(serde_json::value::to_raw_value(&value)?),
            None => None,
        };
        self.document.push_scene(json::Scene {
            name: scene.name.clone(),
            nodes: roots.into_iter().map(json::Index::new).collect(),
            extensions: Default::default(),
            extras,
        });
        log::info!(
            "Exported {} nodes, {} meshes, {} materials",
            self.document.nodes.len(),
            self.document.meshes.len(),
            self.document.materials.len()
        );
        Ok(())
    }

    /// Exportable nodes: transform nodes, then meshes, then lights, then
    /// cameras, each in scene order.
    fn collect_nodes(&self, scene: &Scene) -> Result<Vec<NodeId>> {
        let mut categories: [Vec<NodeId>; 4] = Default::default();
        for id in scene.node_ids() {
            let node = scene.node(id)?;
            if !self.options.should_export_node(node) {
                continue;
            }
            let category = match node.kind {
                NodeKind::Transform => 0,
                NodeKind::Mesh { .. } | NodeKind::InstancedMesh { .. } => 1,
                NodeKind::Light => 2,
                NodeKind::Camera => 3,
            };
            categories[category].push(id);
        }
        Ok(categories.into_iter().flatten().collect())
    }

    fn remove_noop_roots(&mut self, scene: &Scene, nodes: &mut Vec<NodeId>) -> Result<()> {
        let mut removed = Vec::new();
        for &id in nodes.iter() {
            let convert = self.convert_to_right_handed.contains(&id);
            if is_noop_root(scene, id, convert)? {
                removed.push(id);
            }
        }

        for id in removed {
            log::debug!("Removing no-op root node {}", id.0);
            nodes.retain(|&node| node != id);
            self.convert_to_right_handed.remove(&id);
            for descendant in scene.descendants(id) {
                self.convert_to_right_handed.remove(&descendant);
            }
        }
        Ok(())
    }

    async fn export_node(&mut self, scene: &'s Scene, id: NodeId) -> Result<u32> {
        let source = scene.node(id)?;
        let right_handed = self.convert_to_right_handed.contains(&id);
        let mut node = empty_node(source.name.clone());

        if source.is_transform_node() {
            if source.has_pivot() {
                log::warn!(
                    "Node {} has a pivot point, which glTF cannot express; it is ignored",
                    source.name.as_deref().unwrap_or("<unnamed>")
                );
            }
            set_transform(&mut node, source, right_handed);

            if let Some(mesh) = scene.node_mesh(id)? {
                let index = self.export_mesh(scene, mesh, right_handed).await?;
                node.mesh = Some(json::Index::new(index));
            }
        }

        if let Some(extras) = gltf_extras(source.metadata.as_ref()) {
            node.extras = Some(serde_json::value::to_raw_value(&extras)?);
        }

        let node = self
            .extensions
            .post_export_node(CONTEXT, node, source, &self.node_map)
            .await;
        Ok(self.document.push_node(node))
    }

    /// Export a material once; later calls return the first result.
    pub(super) async fn export_material(
        &mut self,
        scene: &'s Scene,
        id: MaterialId,
        has_uvs: bool,
    ) -> Result<Option<u32>> {
        if let Some(&cached) = self.materials.get(&id) {
            return Ok(cached);
        }

        let context = MaterialContext {
            scene,
            document: &mut self.document,
            extensions: &mut self.extensions,
        };
        let index = self
            .material_exporter
            .export_material(id, has_uvs, context)
            .await?;
        if index.is_none() {
            log::warn!("Material {} was not exported", id.0);
        }
        self.materials.insert(id, index);
        Ok(index)
    }

    pub(super) fn material_needs_uvs(&self, id: MaterialId) -> bool {
        self.material_exporter.needs_uvs(id)
    }
}

fn empty_node(name: Option<String>) -> json::Node {
    json::Node {
        camera: None,
        children: None,
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: None,
        name,
        rotation: None,
        scale: None,
        translation: None,
        skin: None,
        weights: None,
    }
}

fn conversion_root(children: &[u32]) -> json::Node {
    let mut node = empty_node(Some(CONVERSION_ROOT_NAME.to_string()));
    node.rotation = Some(json::scene::UnitQuaternion([0.0, 1.0, 0.0, 0.0]));
    node.scale = Some([1.0, 1.0, -1.0]);
    if !children.is_empty() {
        node.children = Some(children.iter().copied().map(json::Index::new).collect());
    }
    node
}

/// Write the node's local TRS, leaving identity components out.
fn set_transform(node: &mut json::Node, source: &SceneNode, right_handed: bool) {
    let mut translation = Vec3::from_array(source.position);
    if translation != Vec3::ZERO {
        if right_handed {
            convert_to_right_handed_position(&mut translation);
        }
        node.translation = Some(translation.to_array());
    }

    let scale = Vec3::from_array(source.scaling);
    if scale != Vec3::ONE {
        node.scale = Some(scale.to_array());
    }

    let mut rotation = source.local_rotation().normalize();
    if right_handed {
        convert_to_right_handed_rotation(&mut rotation);
    }
    if rotation != Quat::IDENTITY {
        node.rotation = Some(json::scene::UnitQuaternion(rotation.to_array()));
    }
}

/// A root transform node without geometry whose world transform is the
/// identity, after handedness conversion when `convert` is set.
fn is_noop_root(scene: &Scene, id: NodeId, convert: bool) -> Result<bool> {
    let node = scene.node(id)?;
    if node.parent.is_some() || !node.is_transform_node() || scene.has_geometry(id)? {
        return Ok(false);
    }

    let mut matrix = scene.world_matrix(id)?;
    if convert {
        let mirror = Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0));
        matrix = mirror * matrix * mirror;
    }
    Ok(matrix.abs_diff_eq(Mat4::IDENTITY, NOOP_EPSILON))
}
