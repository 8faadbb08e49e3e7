pub mod classify;
pub mod sections;

use std::path::Path;

use crate::error::SeedError;
use sections::Section;

/// Read the whole document from disk.
pub fn load_document(path: &Path) -> Result<String, SeedError> {
    std::fs::read_to_string(path).map_err(|source| SeedError::DocumentLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Two-step pipeline: file → text → sections.
pub fn load_sections(path: &Path) -> Result<Vec<Section>, SeedError> {
    let markdown = load_document(path)?;
    Ok(sections::extract_sections(&markdown))
}
