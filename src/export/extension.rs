//! Extension hooks.
//!
//! Extensions are registered as named factories on an [`ExtensionRegistry`].
//! Each export instantiates its own [`ExtensionPipeline`] from a snapshot of
//! the registry and owns those instances until it is disposed.

use super::material::TextureMap;
use super::options::ExportOptions;
use crate::scene::{Mesh, NodeId, PbrMaterial, SceneNode, SubMesh, Texture, TextureId};
use gltf_json as json;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by an async hook. `None` passes the value through.
pub type HookFuture<'a, T> = Pin<Box<dyn Future<Output = Option<T>> + 'a>>;

/// A glTF extension participating in an export.
///
/// Every hook has a pass-through default, so an extension implements only
/// the points it cares about.
pub trait GltfExtension {
    /// Extension name as written to `extensionsUsed`.
    fn name(&self) -> &str;

    fn enabled(&self) -> bool {
        true
    }

    /// Whether a document using this extension must list it in
    /// `extensionsRequired`.
    fn required(&self) -> bool {
        false
    }

    /// Set by extensions that act through the synchronous hooks.
    fn was_used(&self) -> bool {
        false
    }

    /// Replace a texture before it is exported.
    fn pre_export_texture<'a>(
        &'a mut self,
        _context: &'a str,
        _texture: &'a Texture,
    ) -> HookFuture<'a, Texture> {
        Box::pin(async { None })
    }

    fn post_export_mesh_primitive<'a>(
        &'a mut self,
        _primitive: &'a json::mesh::Primitive,
        _mesh: &'a Mesh,
        _submesh: &'a SubMesh,
    ) -> HookFuture<'a, json::mesh::Primitive> {
        Box::pin(async { None })
    }

    /// `node_map` holds the source nodes exported so far.
    fn post_export_node<'a>(
        &'a mut self,
        _context: &'a str,
        _node: &'a json::Node,
        _source: &'a SceneNode,
        _node_map: &'a HashMap<NodeId, u32>,
    ) -> HookFuture<'a, json::Node> {
        Box::pin(async { None })
    }

    fn post_export_material<'a>(
        &'a mut self,
        _context: &'a str,
        _material: &'a json::Material,
        _source: &'a PbrMaterial,
        _textures: &'a TextureMap,
    ) -> HookFuture<'a, json::Material> {
        Box::pin(async { None })
    }

    /// Extra textures the material needs exported alongside its own.
    fn post_export_material_additional_textures(
        &mut self,
        _context: &str,
        _material: &json::Material,
        _source: &PbrMaterial,
    ) -> Vec<TextureId> {
        Vec::new()
    }

    fn post_export_texture(
        &mut self,
        _context: &str,
        _texture_info: &mut json::texture::Info,
        _texture: &Texture,
    ) {
    }

    /// Called once before the document is assembled.
    fn on_exporting(&mut self) {}

    fn dispose(&mut self) {}
}

/// Creates an extension instance for one export.
pub type ExtensionFactory =
    Arc<dyn Fn(&ExportOptions) -> Box<dyn GltfExtension> + Send + Sync>;

/// Ordered set of named extension factories.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    factories: Vec<(String, ExtensionFactory)>,
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`.
    ///
    /// A factory already registered under the same name is replaced, and the
    /// new one moves to the end of the order.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&ExportOptions) -> Box<dyn GltfExtension> + Send + Sync + 'static,
    ) {
        let name = name.into();
        if self.unregister(&name) {
            log::warn!("Extension with the name '{}' already exists", name);
        }
        self.factories.push((name, Arc::new(factory)));
    }

    /// Remove the factory registered under `name`. Returns whether one was.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.factories.len();
        self.factories.retain(|(registered, _)| registered != name);
        self.factories.len() != before
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Create one instance of every registered extension, in order.
    pub fn instantiate(&self, options: &ExportOptions) -> ExtensionPipeline {
        ExtensionPipeline::new(
            self.factories
                .iter()
                .map(|(_, factory)| factory(options))
                .collect(),
        )
    }
}

struct Entry {
    extension: Box<dyn GltfExtension>,
    acted: bool,
}

/// The extension instances owned by one export.
///
/// Async hooks fold over the enabled extensions in order: each receives the
/// value produced by the previous one, and a `None` result leaves the value
/// unchanged. Synchronous hooks run on every enabled extension in order.
#[derive(Default)]
pub struct ExtensionPipeline {
    entries: Vec<Entry>,
    disposed: bool,
}

impl fmt::Debug for ExtensionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.extension.name()))
            .finish()
    }
}

impl ExtensionPipeline {
    pub fn new(extensions: Vec<Box<dyn GltfExtension>>) -> Self {
        Self {
            entries: extensions
                .into_iter()
                .map(|extension| Entry {
                    extension,
                    acted: false,
                })
                .collect(),
            disposed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn enabled_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.entries.iter_mut().filter(|e| e.extension.enabled())
    }

    /// The replacement texture, if any extension produced one.
    pub async fn pre_export_texture(&mut self, context: &str, texture: &Texture) -> Option<Texture> {
        let mut current: Option<Texture> = None;
        for entry in self.enabled_mut() {
            let input = current.as_ref().unwrap_or(texture);
            let replaced = entry.extension.pre_export_texture(context, input).await;
            if let Some(replacement) = replaced {
                entry.acted = true;
                current = Some(replacement);
            }
        }
        current
    }

    pub async fn post_export_mesh_primitive(
        &mut self,
        mut primitive: json::mesh::Primitive,
        mesh: &Mesh,
        submesh: &SubMesh,
    ) -> json::mesh::Primitive {
        for entry in self.enabled_mut() {
            let replaced = entry
                .extension
                .post_export_mesh_primitive(&primitive, mesh, submesh)
                .await;
            if let Some(replacement) = replaced {
                entry.acted = true;
                primitive = replacement;
            }
        }
        primitive
    }

    pub async fn post_export_node(
        &mut self,
        context: &str,
        mut node: json::Node,
        source: &SceneNode,
        node_map: &HashMap<NodeId, u32>,
    ) -> json::Node {
        for entry in self.enabled_mut() {
            let replaced = entry
                .extension
                .post_export_node(context, &node, source, node_map)
                .await;
            if let Some(replacement) = replaced {
                entry.acted = true;
                node = replacement;
            }
        }
        node
    }

    pub async fn post_export_material(
        &mut self,
        context: &str,
        mut material: json::Material,
        source: &PbrMaterial,
        textures: &TextureMap,
    ) -> json::Material {
        for entry in self.enabled_mut() {
            let replaced = entry
                .extension
                .post_export_material(context, &material, source, textures)
                .await;
            if let Some(replacement) = replaced {
                entry.acted = true;
                material = replacement;
            }
        }
        material
    }

    pub fn post_export_material_additional_textures(
        &mut self,
        context: &str,
        material: &json::Material,
        source: &PbrMaterial,
    ) -> Vec<TextureId> {
        let mut textures = Vec::new();
        for entry in self.enabled_mut() {
            textures.extend(
                entry
                    .extension
                    .post_export_material_additional_textures(context, material, source),
            );
        }
        textures
    }

    pub fn post_export_texture(
        &mut self,
        context: &str,
        texture_info: &mut json::texture::Info,
        texture: &Texture,
    ) {
        for entry in self.enabled_mut() {
            entry
                .extension
                .post_export_texture(context, texture_info, texture);
        }
    }

    pub fn on_exporting(&mut self) {
        for entry in self.enabled_mut() {
            entry.extension.on_exporting();
        }
    }

    /// Names for `extensionsUsed`, in registration order.
    pub fn used_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.extension.enabled() && (e.acted || e.extension.was_used()))
            .map(|e| e.extension.name().to_string())
            .collect()
    }

    /// Names for `extensionsRequired`; always a subset of [`Self::used_names`].
    pub fn required_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.extension.enabled() && (e.acted || e.extension.was_used()))
            .filter(|e| e.extension.required())
            .map(|e| e.extension.name().to_string())
            .collect()
    }

    /// Release every extension. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for entry in &mut self.entries {
            entry.extension.dispose();
        }
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct PassThrough;

    impl GltfExtension for PassThrough {
        fn name(&self) -> &str {
            "EXT_pass_through"
        }
    }

    struct Suffix {
        name: &'static str,
        suffix: &'static str,
        required: bool,
    }

    impl GltfExtension for Suffix {
        fn name(&self) -> &str {
            self.name
        }

        fn required(&self) -> bool {
            self.required
        }

        fn post_export_node<'a>(
            &'a mut self,
            _context: &'a str,
            node: &'a json::Node,
            _source: &'a SceneNode,
            _node_map: &'a HashMap<NodeId, u32>,
        ) -> HookFuture<'a, json::Node> {
            Box::pin(async move {
                let mut node = node.clone();
                let name = node.name.take().unwrap_or_default();
                node.name = Some(format!("{}{}", name, self.suffix));
                Some(node)
            })
        }
    }

    struct Disabled;

    impl GltfExtension for Disabled {
        fn name(&self) -> &str {
            "EXT_disabled"
        }

        fn enabled(&self) -> bool {
            false
        }

        fn post_export_node<'a>(
            &'a mut self,
            _context: &'a str,
            _node: &'a json::Node,
            _source: &'a SceneNode,
            _node_map: &'a HashMap<NodeId, u32>,
        ) -> HookFuture<'a, json::Node> {
            Box::pin(async { Some(json::Node::default()) })
        }
    }

    fn named_node(name: &str) -> json::Node {
        json::Node {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn run_node_hook(pipeline: &mut ExtensionPipeline, node: json::Node) -> json::Node {
        let source = SceneNode::transform();
        let node_map = HashMap::new();
        pollster::block_on(pipeline.post_export_node("test", node, &source, &node_map))
    }

    #[test]
    fn test_only_acting_extension_changes_node() {
        let mut pipeline = ExtensionPipeline::new(vec![
            Box::new(PassThrough),
            Box::new(Suffix {
                name: "EXT_suffix",
                suffix: "_b",
                required: false,
            }),
        ]);
        let node = run_node_hook(&mut pipeline, named_node("a"));
        assert_eq!(node.name.as_deref(), Some("a_b"));
        assert_eq!(pipeline.used_names(), vec!["EXT_suffix".to_string()]);
    }

    #[test]
    fn test_hooks_chain_in_registration_order() {
        let mut pipeline = ExtensionPipeline::new(vec![
            Box::new(Suffix {
                name: "EXT_first",
                suffix: "_1",
                required: false,
            }),
            Box::new(Suffix {
                name: "EXT_second",
                suffix: "_2",
                required: true,
            }),
        ]);
        let node = run_node_hook(&mut pipeline, named_node("n"));
        assert_eq!(node.name.as_deref(), Some("n_1_2"));
        assert_eq!(pipeline.used_names(), vec!["EXT_first", "EXT_second"]);
        assert_eq!(pipeline.required_names(), vec!["EXT_second"]);
    }

    #[test]
    fn test_disabled_extension_is_skipped() {
        let mut pipeline = ExtensionPipeline::new(vec![Box::new(Disabled)]);
        let node = run_node_hook(&mut pipeline, named_node("kept"));
        assert_eq!(node.name.as_deref(), Some("kept"));
        assert!(pipeline.used_names().is_empty());
    }

    #[test]
    fn test_unused_extensions_are_not_listed() {
        let mut pipeline = ExtensionPipeline::new(vec![Box::new(PassThrough)]);
        run_node_hook(&mut pipeline, named_node("x"));
        assert!(pipeline.used_names().is_empty());
        assert!(pipeline.required_names().is_empty());
    }

    #[test]
    fn test_register_duplicate_replaces_and_moves_to_end() {
        let mut registry = ExtensionRegistry::new();
        registry.register("a", |_| Box::new(PassThrough));
        registry.register("b", |_| Box::new(PassThrough));
        registry.register("a", |_| Box::new(PassThrough));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(registry.len(), 2);

        assert!(registry.unregister("b"));
        assert!(!registry.unregister("b"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_instantiate_creates_fresh_instances() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let mut registry = ExtensionRegistry::new();
        registry.register("EXT_pass_through", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::new(PassThrough)
        });

        let options = ExportOptions::default();
        let first = registry.instantiate(&options);
        let second = registry.instantiate(&options);
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dispose_runs_once() {
        struct Counting(Arc<AtomicUsize>);

        impl GltfExtension for Counting {
            fn name(&self) -> &str {
                "EXT_counting"
            }

            fn dispose(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let disposed = Arc::new(AtomicUsize::new(0));
        let mut pipeline = ExtensionPipeline::new(vec![Box::new(Counting(disposed.clone()))]);
        pipeline.dispose();
        pipeline.dispose();
        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }
}
