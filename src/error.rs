//! Error types for the glTF scene exporter.

use thiserror::Error;

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for scene export operations.
///
/// Every variant aborts the export in progress. Conditions the exporter can
/// degrade around (a material that fails to export, a pivot point) are logged
/// instead and never surface here.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The exporter was created without a scene.
    #[error("No scene available to export")]
    NoScene,

    /// A node handle does not resolve in the scene.
    #[error("Node {0} does not exist in the scene")]
    MissingNode(u32),

    /// A mesh handle does not resolve in the scene.
    #[error("Mesh {0} does not exist in the scene")]
    MissingMesh(u32),

    /// A material handle does not resolve in the scene.
    #[error("Material {0} does not exist in the scene")]
    MissingMaterial(u32),

    /// A texture handle does not resolve in the scene.
    #[error("Texture {0} does not exist in the scene")]
    MissingTexture(u32),

    /// A data buffer handle does not resolve in the scene.
    #[error("Buffer {0} does not exist in the scene")]
    MissingBuffer(u32),

    /// A vertex buffer handle does not resolve in the scene.
    #[error("Vertex buffer {0} does not exist in the scene")]
    MissingVertexBuffer(u32),

    /// An index array handle does not resolve in the scene.
    #[error("Index array {0} does not exist in the scene")]
    MissingIndexArray(u32),

    /// A read reached past the end of the backing data.
    #[error("Buffer {buffer} is {len} bytes long, but {needed} bytes are required")]
    BufferOutOfRange { buffer: u32, len: usize, needed: usize },

    /// A vertex buffer uses a kind outside the exportable attribute set.
    #[error("Unsupported vertex buffer kind: {0}")]
    UnknownVertexKind(String),

    /// A material or mesh uses a fill mode without a glTF topology.
    #[error("Unsupported fill mode: {0}")]
    UnknownFillMode(u32),

    /// Attribute data is stored in a format the exporter cannot read.
    #[error("Unsupported attribute format: {0}")]
    UnsupportedAttributeFormat(String),

    /// Failed to serialize JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to encode an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to assemble the output.
    #[error("Export error: {0}")]
    Export(String),
}
