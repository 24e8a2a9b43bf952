//! Export configuration.

use crate::scene::SceneNode;
use std::fmt;
use std::sync::Arc;

/// Decides whether a source node is exported.
pub type NodePredicate = Arc<dyn Fn(&SceneNode) -> bool + Send + Sync>;

/// Decides whether an animation (by name) is exported.
pub type AnimationPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Maps scene metadata to the output scene's `extras`.
pub type MetadataSelector =
    Arc<dyn Fn(Option<&serde_json::Value>) -> Option<serde_json::Value> + Send + Sync>;

/// Options controlling a single export.
#[derive(Clone)]
pub struct ExportOptions {
    /// Node inclusion predicate. Every node is exported when unset.
    pub should_export_node: Option<NodePredicate>,
    /// Animation inclusion predicate. Animations are not exported yet, so
    /// this is carried for API compatibility only.
    pub should_export_animation: Option<AnimationPredicate>,
    /// Selects the output scene's extras from the scene metadata. When unset,
    /// `metadata.gltf.extras` is passed through if present.
    pub metadata_selector: Option<MetadataSelector>,
    /// Export UV channels even when no material samples them.
    pub export_unused_uvs: bool,
    /// Drop root transform nodes that contribute neither transform nor
    /// geometry.
    pub remove_noop_root_nodes: bool,
    /// For left-handed scenes, wrap the roots in a `__root__` conversion node
    /// instead of mirroring every node. Disables no-op root removal.
    pub include_coordinate_system_conversion_nodes: bool,
    /// `asset.generator` of the output document.
    pub generator: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            should_export_node: None,
            should_export_animation: None,
            metadata_selector: None,
            export_unused_uvs: false,
            remove_noop_root_nodes: true,
            include_coordinate_system_conversion_nodes: false,
            generator: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl fmt::Debug for ExportOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportOptions")
            .field("should_export_node", &self.should_export_node.is_some())
            .field("should_export_animation", &self.should_export_animation.is_some())
            .field("metadata_selector", &self.metadata_selector.is_some())
            .field("export_unused_uvs", &self.export_unused_uvs)
            .field("remove_noop_root_nodes", &self.remove_noop_root_nodes)
            .field(
                "include_coordinate_system_conversion_nodes",
                &self.include_coordinate_system_conversion_nodes,
            )
            .field("generator", &self.generator)
            .finish()
    }
}

impl ExportOptions {
    pub fn with_node_filter(
        mut self,
        predicate: impl Fn(&SceneNode) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_export_node = Some(Arc::new(predicate));
        self
    }

    pub fn with_animation_filter(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_export_animation = Some(Arc::new(predicate));
        self
    }

    pub fn with_metadata_selector(
        mut self,
        selector: impl Fn(Option<&serde_json::Value>) -> Option<serde_json::Value>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.metadata_selector = Some(Arc::new(selector));
        self
    }

    pub fn with_export_unused_uvs(mut self, value: bool) -> Self {
        self.export_unused_uvs = value;
        self
    }

    pub fn with_remove_noop_root_nodes(mut self, value: bool) -> Self {
        self.remove_noop_root_nodes = value;
        self
    }

    pub fn with_coordinate_system_conversion_nodes(mut self, value: bool) -> Self {
        self.include_coordinate_system_conversion_nodes = value;
        self
    }

    pub fn should_export_node(&self, node: &SceneNode) -> bool {
        self.should_export_node
            .as_ref()
            .map_or(true, |predicate| predicate(node))
    }

    /// Extras for the output scene, from the selector or the conventional
    /// `gltf.extras` metadata field.
    pub fn select_metadata(
        &self,
        metadata: Option<&serde_json::Value>,
    ) -> Option<serde_json::Value> {
        match &self.metadata_selector {
            Some(selector) => selector(metadata),
            None => gltf_extras(metadata),
        }
    }
}

/// The `gltf.extras` field of a metadata object.
pub(crate) fn gltf_extras(metadata: Option<&serde_json::Value>) -> Option<serde_json::Value> {
    metadata?.get("gltf")?.get("extras").cloned()
}
