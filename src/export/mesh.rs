//! Mesh and primitive export.

use super::exporter::GltfExporter;
use super::utils::{
    calculate_min_max_positions, component_type, create_accessor, is_uv_kind, primitive_mode,
    IndexWidth, VertexAttribute,
};
use crate::error::{ExportError, Result};
use crate::scene::{
    Geometry, IndexArrayId, Material, MaterialId, Mesh, MeshId, Scene, SubMesh, VertexBuffer,
    VertexBufferId,
};
use gltf_json as json;
use json::validation::Checked::Valid;
use std::collections::BTreeMap;

impl<'s> GltfExporter<'s> {
    /// Export a mesh once per handedness and return its output index.
    pub(super) async fn export_mesh(
        &mut self,
        scene: &'s Scene,
        id: MeshId,
        right_handed: bool,
    ) -> Result<u32> {
        if let Some(index) = self.state(right_handed).mesh(id) {
            return Ok(index);
        }

        let mesh = scene.mesh(id)?;
        let geometry = mesh
            .geometry
            .as_ref()
            .ok_or_else(|| ExportError::Export(format!("Mesh {} has no geometry", id.0)))?;

        let submeshes = if mesh.submeshes.is_empty() {
            vec![whole_mesh(scene, geometry)?]
        } else {
            mesh.submeshes.clone()
        };

        let mut primitives = Vec::with_capacity(submeshes.len());
        for submesh in &submeshes {
            let primitive = self
                .export_primitive(scene, mesh, geometry, submesh, right_handed)
                .await?;
            primitives.push(primitive);
        }

        let index = self.document.push_mesh(json::Mesh {
            name: mesh.name.clone(),
            primitives,
            weights: None,
            extensions: Default::default(),
            extras: Default::default(),
        });
        self.state_mut(right_handed).set_mesh(id, index);
        Ok(index)
    }

    async fn export_primitive(
        &mut self,
        scene: &'s Scene,
        mesh: &Mesh,
        geometry: &Geometry,
        submesh: &SubMesh,
        right_handed: bool,
    ) -> Result<json::mesh::Primitive> {
        let mut vertex_buffers = Vec::with_capacity(geometry.vertex_buffers.len());
        for &id in &geometry.vertex_buffers {
            vertex_buffers.push((id, scene.vertex_buffer(id)?));
        }
        let has_uvs = vertex_buffers.iter().any(|(_, vb)| is_uv_kind(&vb.kind));

        let material = resolve_material(scene, mesh, submesh)?;
        let material_index = match material {
            Some(id) => self.export_material(scene, id, has_uvs).await?,
            None => None,
        };

        let material_fill_mode = match material {
            Some(id) => scene.material(id)?.fill_mode(),
            None => None,
        };
        let fill_mode = mesh
            .override_fill_mode
            .or(material_fill_mode)
            .unwrap_or_default();
        let mode = primitive_mode(fill_mode)?;

        let indices = match geometry.indices {
            Some(indices) => Some(self.export_indices(scene, indices, submesh, right_handed)?),
            None => None,
        };

        let export_uvs = self.options.export_unused_uvs
            || material.map_or(false, |id| self.material_needs_uvs(id));

        let mut attributes = BTreeMap::new();
        for (id, vertex_buffer) in vertex_buffers {
            if is_uv_kind(&vertex_buffer.kind) && !export_uvs {
                continue;
            }
            let attribute = VertexAttribute::from_kind(&vertex_buffer.kind)?;
            let accessor =
                self.export_vertex_buffer(scene, id, vertex_buffer, attribute, submesh, right_handed)?;
            attributes.insert(Valid(attribute.semantic()), json::Index::new(accessor));
        }

        let primitive = json::mesh::Primitive {
            attributes,
            indices: indices.map(json::Index::new),
            material: material_index.map(json::Index::new),
            mode: Valid(mode),
            targets: None,
            extensions: Default::default(),
            extras: Default::default(),
        };
        Ok(self
            .extensions
            .post_export_mesh_primitive(primitive, mesh, submesh)
            .await)
    }

    /// Accessor over the submesh's range of an index array.
    fn export_indices(
        &mut self,
        scene: &Scene,
        id: IndexArrayId,
        submesh: &SubMesh,
        right_handed: bool,
    ) -> Result<u32> {
        let start = submesh.index_start;
        let count = submesh.index_count;
        if let Some(accessor) = self.state(right_handed).indices_accessor(id, start, count) {
            return Ok(accessor);
        }

        let indices = scene.index_array(id)?;
        let end = u64::from(start) + u64::from(count);
        if end > indices.len() as u64 {
            return Err(ExportError::Export(format!(
                "Index array {} has {} indices, submesh needs {}..{}",
                id.0,
                indices.len(),
                start,
                end
            )));
        }
        let width = IndexWidth::for_range(indices, start as usize, count as usize);

        let view = match self.state(right_handed).indices_buffer_view(id, width) {
            Some(view) => view,
            None => {
                // TODO: reverse triangle winding when `right_handed` is set;
                // the flag only selects the cache for now.
                let view = self.document.write_buffer_view(None, None, |writer| {
                    for index in indices.iter() {
                        match width {
                            // Values past u16 are outside every range this view serves.
                            IndexWidth::U16 => writer.write_u16(index as u16),
                            IndexWidth::U32 => writer.write_u32(index),
                        }
                    }
                });
                self.state_mut(right_handed)
                    .set_indices_buffer_view(id, width, view);
                view
            }
        };

        let accessor = self.document.push_accessor(create_accessor(
            view,
            json::accessor::Type::Scalar,
            width.component_type(),
            count as usize,
            Some(start as usize * width.byte_size()),
            None,
            None,
        ));
        self.state_mut(right_handed)
            .set_indices_accessor(id, start, count, accessor);
        Ok(accessor)
    }

    /// Accessor over the submesh's vertex range of one attribute.
    fn export_vertex_buffer(
        &mut self,
        scene: &Scene,
        id: VertexBufferId,
        vertex_buffer: &VertexBuffer,
        attribute: VertexAttribute,
        submesh: &SubMesh,
        right_handed: bool,
    ) -> Result<u32> {
        let start = submesh.vertex_start;
        let count = submesh.vertex_count;
        if let Some(accessor) = self.state(right_handed).vertex_accessor(id, start, count) {
            return Ok(accessor);
        }

        let data = scene.buffer(vertex_buffer.buffer)?;
        match vertex_buffer.required_len(start, count) {
            Some(needed) if needed <= data.len() => {}
            needed => {
                return Err(ExportError::BufferOutOfRange {
                    buffer: vertex_buffer.buffer.0,
                    len: data.len(),
                    needed: needed.unwrap_or(usize::MAX),
                })
            }
        }
        let component_type = component_type(vertex_buffer.component_type)?;

        let stride = vertex_buffer.byte_stride;
        let view = match self.state(right_handed).vertex_buffer_view(vertex_buffer.buffer, stride) {
            Some(view) => view,
            None => {
                // TODO: mirror positions and normals when `right_handed` is
                // set; the flag only selects the cache for now.
                let view = self.document.write_buffer_view(
                    Some(stride),
                    None,
                    |writer| writer.write_bytes(&data.bytes),
                );
                self.state_mut(right_handed)
                    .set_vertex_buffer_view(vertex_buffer.buffer, stride, view);
                view
            }
        };

        let (min, max) = if attribute == VertexAttribute::Position && count > 0 {
            if vertex_buffer.size != 3 {
                return Err(ExportError::UnsupportedAttributeFormat(format!(
                    "positions must have 3 components, found {}",
                    vertex_buffer.size
                )));
            }
            let positions = vertex_buffer.read_floats(vertex_buffer.buffer, data, start, count)?;
            let (min, max) = calculate_min_max_positions(&positions, 0, count as usize);
            (Some(min.to_vec()), Some(max.to_vec()))
        } else {
            (None, None)
        };

        let byte_offset = u64::from(vertex_buffer.byte_offset) + u64::from(start) * u64::from(stride);
        let byte_offset = usize::try_from(byte_offset).map_err(|_| ExportError::BufferOutOfRange {
            buffer: vertex_buffer.buffer.0,
            len: data.len(),
            needed: usize::MAX,
        })?;
        let mut accessor = create_accessor(
            view,
            attribute.accessor_type(vertex_buffer.size == 4),
            component_type,
            count as usize,
            Some(byte_offset),
            min,
            max,
        );
        accessor.normalized = vertex_buffer.normalized;

        let index = self.document.push_accessor(accessor);
        self.state_mut(right_handed)
            .set_vertex_accessor(id, start, count, index);
        Ok(index)
    }
}

/// The material drawn by a submesh, picking from a multi-material by the
/// submesh's material index.
fn resolve_material(scene: &Scene, mesh: &Mesh, submesh: &SubMesh) -> Result<Option<MaterialId>> {
    let Some(id) = mesh.material else {
        return Ok(None);
    };
    match scene.material(id)? {
        Material::Multi(multi) => Ok(multi
            .sub_materials
            .get(submesh.material_index as usize)
            .copied()
            .flatten()),
        _ => Ok(Some(id)),
    }
}

/// A single submesh spanning all indices of `geometry` and every vertex all
/// of its vertex buffers can serve.
fn whole_mesh(scene: &Scene, geometry: &Geometry) -> Result<SubMesh> {
    let mut vertex_count: Option<u32> = None;
    for &id in &geometry.vertex_buffers {
        let vertex_buffer = scene.vertex_buffer(id)?;
        let count = vertex_buffer.element_count(scene.buffer(vertex_buffer.buffer)?);
        vertex_count = Some(vertex_count.map_or(count, |current| current.min(count)));
    }
    let vertex_count = vertex_count.unwrap_or(0);
    let index_count = match geometry.indices {
        Some(id) => scene.index_array(id)?.len() as u32,
        None => 0,
    };
    Ok(SubMesh::covering(vertex_count, index_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::extension::ExtensionRegistry;
    use crate::export::options::ExportOptions;
    use crate::scene::{
        DataBuffer, FillMode, IndexArray, MultiMaterial, PbrMaterial, Texture, TextureImage,
    };

    fn exporter(scene: &Scene) -> GltfExporter<'_> {
        GltfExporter::new(scene, ExportOptions::default(), &ExtensionRegistry::new())
    }

    fn quad_scene() -> (Scene, Geometry) {
        let mut scene = Scene::new();
        let buffer = scene.add_buffer(DataBuffer::from_floats(&[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            1.0, 1.0, 0.0, //
            0.0, 1.0, -2.0,
        ]));
        let position = scene.add_vertex_buffer(VertexBuffer::floats(buffer, "position", 3));
        let indices = scene.add_index_array(IndexArray::List(vec![0, 1, 2, 0, 2, 3]));
        let geometry = Geometry {
            indices: Some(indices),
            vertex_buffers: vec![position],
        };
        (scene, geometry)
    }

    #[test]
    fn test_single_triangle() {
        let mut scene = Scene::new();
        let buffer = scene.add_buffer(DataBuffer::from_floats(&[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0,
        ]));
        let position = scene.add_vertex_buffer(VertexBuffer::floats(buffer, "position", 3));
        let mesh = scene.add_mesh(Mesh::new(Geometry {
            indices: None,
            vertex_buffers: vec![position],
        }));

        let mut exporter = exporter(&scene);
        assert_eq!(pollster::block_on(exporter.export_mesh(&scene, mesh, false)).unwrap(), 0);

        let document = &exporter.document;
        assert_eq!(document.accessors.len(), 1);
        assert_eq!(document.accessors[0].count.0, 3);
        assert_eq!(document.meshes[0].primitives.len(), 1);
        assert_eq!(document.writer.byte_offset(), 36);

        let primitive = serde_json::to_value(&document.meshes[0].primitives[0]).unwrap();
        assert!(primitive.get("mode").is_none());
        assert!(primitive.get("indices").is_none());
        assert_eq!(primitive["attributes"]["POSITION"], 0);
    }

    #[test]
    fn test_shared_ranges_are_deduplicated() {
        let (mut scene, geometry) = quad_scene();
        let mesh = scene.add_mesh(
            Mesh::new(geometry)
                .with_submesh(SubMesh::covering(4, 6))
                .with_submesh(SubMesh::covering(4, 6)),
        );

        let mut exporter = exporter(&scene);
        pollster::block_on(exporter.export_mesh(&scene, mesh, false)).unwrap();

        let document = &exporter.document;
        let primitives = &document.meshes[0].primitives;
        assert_eq!(primitives[0].indices, primitives[1].indices);
        assert_eq!(primitives[0].attributes, primitives[1].attributes);
        assert_eq!(document.accessors.len(), 2);
        assert_eq!(document.buffer_views.len(), 2);
        // 48 bytes of positions, 12 bytes of u16 indices.
        assert_eq!(document.writer.byte_offset(), 60);
    }

    #[test]
    fn test_handedness_states_are_isolated() {
        let (mut scene, geometry) = quad_scene();
        let mesh = scene.add_mesh(Mesh::new(geometry));

        let mut exporter = exporter(&scene);
        let original = pollster::block_on(exporter.export_mesh(&scene, mesh, false)).unwrap();
        let converted = pollster::block_on(exporter.export_mesh(&scene, mesh, true)).unwrap();
        let again = pollster::block_on(exporter.export_mesh(&scene, mesh, true)).unwrap();

        assert_ne!(original, converted);
        assert_eq!(converted, again);
        let document = &exporter.document;
        assert_eq!(document.meshes.len(), 2);
        assert_eq!(document.buffer_views.len(), 4);
        assert_eq!(document.accessors.len(), 4);
        assert_ne!(
            document.meshes[0].primitives[0].attributes,
            document.meshes[1].primitives[0].attributes
        );
    }

    #[test]
    fn test_submesh_ranges_and_bounds() {
        let (mut scene, geometry) = quad_scene();
        let mesh = scene.add_mesh(
            Mesh::new(geometry)
                .with_submesh(SubMesh {
                    material_index: 0,
                    vertex_start: 0,
                    vertex_count: 3,
                    index_start: 0,
                    index_count: 3,
                })
                .with_submesh(SubMesh {
                    material_index: 0,
                    vertex_start: 2,
                    vertex_count: 2,
                    index_start: 3,
                    index_count: 3,
                }),
        );

        let mut exporter = exporter(&scene);
        pollster::block_on(exporter.export_mesh(&scene, mesh, false)).unwrap();
        let accessors = serde_json::to_value(&exporter.document.accessors).unwrap();

        // Positions of the second submesh: vertices 2 and 3.
        let positions = accessors
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["type"] == "VEC3")
            .collect::<Vec<_>>();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0]["min"], serde_json::json!([0.0, 0.0, 0.0]));
        assert_eq!(positions[0]["max"], serde_json::json!([1.0, 1.0, 0.0]));
        assert_eq!(positions[1]["byteOffset"], 24);
        assert_eq!(positions[1]["min"], serde_json::json!([0.0, 1.0, -2.0]));
        assert_eq!(positions[1]["max"], serde_json::json!([1.0, 1.0, 0.0]));

        let indices = accessors
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["type"] == "SCALAR")
            .collect::<Vec<_>>();
        assert_eq!(indices[0]["byteOffset"], 0);
        assert_eq!(indices[1]["byteOffset"], 6);
        assert_eq!(indices[1]["componentType"], 5123);
    }

    #[test]
    fn test_large_index_values_use_32_bit() {
        let mut scene = Scene::new();
        let indices = scene.add_index_array(IndexArray::List(vec![0, 70000, 1]));
        let mut exporter = exporter(&scene);
        let accessor = exporter
            .export_indices(&scene, indices, &SubMesh::covering(0, 3), false)
            .unwrap();

        let document = &exporter.document;
        let json = serde_json::to_value(&document.accessors[accessor as usize]).unwrap();
        assert_eq!(json["componentType"], 5125);
        assert_eq!(document.writer.byte_offset(), 12);
    }

    #[test]
    fn test_index_range_past_end_is_an_error() {
        let mut scene = Scene::new();
        let indices = scene.add_index_array(IndexArray::U16(vec![0, 1, 2]));
        let mut exporter = exporter(&scene);
        let submesh = SubMesh {
            index_start: 2,
            index_count: 3,
            ..Default::default()
        };
        assert!(exporter.export_indices(&scene, indices, &submesh, false).is_err());
    }

    #[test]
    fn test_unknown_vertex_kind_is_fatal() {
        let (mut scene, mut geometry) = quad_scene();
        let buffer = scene.vertex_buffer(geometry.vertex_buffers[0]).unwrap().buffer;
        let bogus = scene.add_vertex_buffer(VertexBuffer::floats(buffer, "bogus", 3));
        geometry.vertex_buffers.push(bogus);
        let mesh = scene.add_mesh(Mesh::new(geometry));

        let mut exporter = exporter(&scene);
        let result = pollster::block_on(exporter.export_mesh(&scene, mesh, false));
        assert!(matches!(result, Err(ExportError::UnknownVertexKind(kind)) if kind == "bogus"));
    }

    #[test]
    fn test_fill_mode_precedence() {
        let (mut scene, geometry) = quad_scene();
        let strip = scene.add_material(Material::Pbr(
            PbrMaterial::new("strip", [1.0; 4]).with_fill_mode(FillMode::TRIANGLE_STRIP),
        ));
        let from_material = scene.add_mesh(Mesh::new(geometry.clone()).with_material(strip));
        let mut overridden = Mesh::new(geometry.clone()).with_material(strip);
        overridden.override_fill_mode = Some(FillMode::LINE_LIST);
        let overridden = scene.add_mesh(overridden);
        let mut unknown = Mesh::new(geometry);
        unknown.override_fill_mode = Some(FillMode(42));
        let unknown = scene.add_mesh(unknown);

        let mut exporter = exporter(&scene);
        pollster::block_on(exporter.export_mesh(&scene, from_material, false)).unwrap();
        pollster::block_on(exporter.export_mesh(&scene, overridden, false)).unwrap();
        let modes: Vec<_> = exporter
            .document
            .meshes
            .iter()
            .map(|m| m.primitives[0].mode.clone())
            .collect();
        assert_eq!(
            modes,
            vec![
                Valid(json::mesh::Mode::TriangleStrip),
                Valid(json::mesh::Mode::Lines)
            ]
        );
        // Both meshes use the same material, exported once.
        assert_eq!(exporter.document.materials.len(), 1);

        let result = pollster::block_on(exporter.export_mesh(&scene, unknown, false));
        assert!(matches!(result, Err(ExportError::UnknownFillMode(42))));
    }

    #[test]
    fn test_multi_material_selects_sub_material() {
        let (mut scene, geometry) = quad_scene();
        let red = scene.add_material(Material::Pbr(PbrMaterial::new("red", [1.0, 0.0, 0.0, 1.0])));
        let blue = scene.add_material(Material::Pbr(PbrMaterial::new("blue", [0.0, 0.0, 1.0, 1.0])));
        let multi = scene.add_material(Material::Multi(MultiMaterial {
            name: None,
            sub_materials: vec![Some(blue), None, Some(red)],
        }));
        let submesh = |material_index| SubMesh {
            material_index,
            ..SubMesh::covering(4, 6)
        };
        let mesh = scene.add_mesh(
            Mesh::new(geometry)
                .with_material(multi)
                .with_submesh(submesh(2))
                .with_submesh(submesh(1))
                .with_submesh(submesh(0)),
        );

        let mut exporter = exporter(&scene);
        pollster::block_on(exporter.export_mesh(&scene, mesh, false)).unwrap();
        let document = &exporter.document;
        let materials: Vec<_> = document.meshes[0]
            .primitives
            .iter()
            .map(|p| p.material.map(|m| m.value()))
            .collect();
        assert_eq!(materials, vec![Some(0), None, Some(1)]);
        assert_eq!(document.materials[0].name.as_deref(), Some("red"));
        assert_eq!(document.materials[1].name.as_deref(), Some("blue"));
    }

    fn uv_scene(textured: bool) -> (Scene, MeshId) {
        let (mut scene, mut geometry) = quad_scene();
        let uv_data = scene.add_buffer(DataBuffer::from_floats(&[0.0; 8]));
        let uv = scene.add_vertex_buffer(VertexBuffer::floats(uv_data, "uv", 2));
        geometry.vertex_buffers.push(uv);

        let mut material = PbrMaterial::new("m", [1.0; 4]);
        if textured {
            let texture = scene.add_texture(Texture::new(
                "checker",
                TextureImage::Rgba8 {
                    width: 1,
                    height: 1,
                    pixels: vec![0, 0, 0, 255],
                },
            ));
            material = material.with_texture(texture);
        }
        let material = scene.add_material(Material::Pbr(material));
        let mesh = scene.add_mesh(Mesh::new(geometry).with_material(material));
        (scene, mesh)
    }

    fn attribute_names(exporter: &GltfExporter<'_>) -> Vec<String> {
        let primitive = serde_json::to_value(&exporter.document.meshes[0].primitives[0]).unwrap();
        primitive["attributes"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    #[test]
    fn test_unused_uvs_are_skipped() {
        let (scene, mesh) = uv_scene(false);
        let mut exporter = exporter(&scene);
        pollster::block_on(exporter.export_mesh(&scene, mesh, false)).unwrap();
        assert_eq!(attribute_names(&exporter), vec!["POSITION"]);
    }

    #[test]
    fn test_uvs_kept_for_textured_material() {
        let (scene, mesh) = uv_scene(true);
        let mut exporter = exporter(&scene);
        pollster::block_on(exporter.export_mesh(&scene, mesh, false)).unwrap();
        assert_eq!(attribute_names(&exporter), vec!["POSITION", "TEXCOORD_0"]);
        assert!(exporter.document.materials[0]
            .pbr_metallic_roughness
            .base_color_texture
            .is_some());
    }

    #[test]
    fn test_unused_uvs_exported_on_request() {
        let (scene, mesh) = uv_scene(false);
        let options = ExportOptions::default().with_export_unused_uvs(true);
        let mut exporter = GltfExporter::new(&scene, options, &ExtensionRegistry::new());
        pollster::block_on(exporter.export_mesh(&scene, mesh, false)).unwrap();
        assert_eq!(attribute_names(&exporter), vec!["POSITION", "TEXCOORD_0"]);
    }

    #[test]
    fn test_short_vertex_buffer_is_an_error() {
        let mut scene = Scene::new();
        let buffer = scene.add_buffer(DataBuffer::from_floats(&[0.0; 6]));
        let position = scene.add_vertex_buffer(VertexBuffer::floats(buffer, "position", 3));
        let mesh = scene.add_mesh(
            Mesh::new(Geometry {
                indices: None,
                vertex_buffers: vec![position],
            })
            .with_submesh(SubMesh::covering(3, 0)),
        );

        let mut exporter = exporter(&scene);
        let result = pollster::block_on(exporter.export_mesh(&scene, mesh, false));
        assert!(matches!(result, Err(ExportError::BufferOutOfRange { needed: 36, .. })));
    }

    /// Positions (stride 12) followed by UVs (stride 8) in one data buffer.
    fn packed_scene(submesh: Option<SubMesh>) -> (Scene, MeshId) {
        let mut scene = Scene::new();
        let buffer = scene.add_buffer(DataBuffer::from_floats(&[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
        ]));
        let position = scene.add_vertex_buffer(VertexBuffer::floats(buffer, "position", 3));
        let uv = scene.add_vertex_buffer(VertexBuffer {
            byte_offset: 36,
            ..VertexBuffer::floats(buffer, "uv", 2)
        });
        let mut mesh = Mesh::new(Geometry {
            indices: None,
            vertex_buffers: vec![position, uv],
        });
        if let Some(submesh) = submesh {
            mesh = mesh.with_submesh(submesh);
        }
        let mesh = scene.add_mesh(mesh);
        (scene, mesh)
    }

    fn uv_accessor(exporter: &GltfExporter<'_>) -> serde_json::Value {
        let primitive = &exporter.document.meshes[0].primitives[0];
        let index = primitive
            .attributes
            .get(&Valid(json::mesh::Semantic::TexCoords(0)))
            .unwrap()
            .value();
        serde_json::to_value(&exporter.document.accessors[index]).unwrap()
    }

    #[test]
    fn test_strides_sharing_a_buffer_get_their_own_views() {
        let (scene, mesh) = packed_scene(Some(SubMesh::covering(3, 0)));
        let options = ExportOptions::default().with_export_unused_uvs(true);
        let mut exporter = GltfExporter::new(&scene, options, &ExtensionRegistry::new());
        pollster::block_on(exporter.export_mesh(&scene, mesh, false)).unwrap();

        let views = serde_json::to_value(&exporter.document.buffer_views).unwrap();
        assert_eq!(views.as_array().unwrap().len(), 2);
        assert_eq!(views[0]["byteStride"], 12);
        assert_eq!(views[1]["byteStride"], 8);

        let uv = uv_accessor(&exporter);
        assert_eq!(uv["bufferView"], 1);
        assert_eq!(uv["byteOffset"], 36);
        assert_eq!(uv["type"], "VEC2");
        // The last UV ends exactly at the end of its view.
        assert_eq!(views[1]["byteLength"], 60);
    }

    #[test]
    fn test_whole_mesh_counts_vertices_every_buffer_can_serve() {
        let (scene, mesh) = packed_scene(None);
        let options = ExportOptions::default().with_export_unused_uvs(true);
        let mut exporter = GltfExporter::new(&scene, options, &ExtensionRegistry::new());
        pollster::block_on(exporter.export_mesh(&scene, mesh, false)).unwrap();

        let accessors = serde_json::to_value(&exporter.document.accessors).unwrap();
        for accessor in accessors.as_array().unwrap() {
            assert_eq!(accessor["count"], 3);
        }
        assert_eq!(uv_accessor(&exporter)["count"], 3);
    }

    #[test]
    fn test_huge_index_range_is_an_error() {
        let mut scene = Scene::new();
        let indices = scene.add_index_array(IndexArray::U16(vec![0, 1, 2]));
        let mut exporter = exporter(&scene);
        let submesh = SubMesh {
            index_start: u32::MAX,
            index_count: 3,
            ..Default::default()
        };
        assert!(matches!(
            exporter.export_indices(&scene, indices, &submesh, false),
            Err(ExportError::Export(_))
        ));
    }

    #[test]
    fn test_huge_vertex_range_is_an_error() {
        let (mut scene, geometry) = quad_scene();
        let mesh = scene.add_mesh(Mesh::new(geometry).with_submesh(SubMesh {
            vertex_start: u32::MAX,
            vertex_count: 3,
            ..SubMesh::covering(0, 6)
        }));

        let mut exporter = exporter(&scene);
        let result = pollster::block_on(exporter.export_mesh(&scene, mesh, false));
        assert!(matches!(result, Err(ExportError::BufferOutOfRange { .. })));
    }
}
