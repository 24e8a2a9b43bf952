//! Export artifacts.

use crate::error::Result;
use std::path::Path;

pub const GLTF_MIME_TYPE: &str = "model/gltf+json";
pub const GLB_MIME_TYPE: &str = "model/gltf-binary";
pub const BIN_MIME_TYPE: &str = "application/octet-stream";

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GltfFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// The files an export produced, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GltfData {
    files: Vec<GltfFile>,
}

impl GltfData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any earlier file with the same name.
    pub fn insert(&mut self, name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) {
        let name = name.into();
        self.files.retain(|file| file.name != name);
        self.files.push(GltfFile {
            name,
            mime_type: mime_type.into(),
            data,
        });
    }

    pub fn get(&self, name: &str) -> Option<&GltfFile> {
        self.files.iter().find(|file| file.name == name)
    }

    pub fn files(&self) -> &[GltfFile] {
        &self.files
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|file| file.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file into `dir`, creating it if needed.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for file in &self.files {
            let path = dir.join(&file.name);
            std::fs::write(&path, &file.data)?;
            log::debug!("Wrote {} ({} bytes)", path.display(), file.data.len());
        }
        Ok(())
    }
}
