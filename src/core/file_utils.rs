//! File utilities: input image discovery and JSON helpers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info};

use crate::core::errors::{OrthoparkError, OrthoparkResultExt, Result};

/// Image extensions accepted as ODM input (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

/// Check whether a path has a supported image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// List supported image files directly inside `input_dir`, sorted by name.
///
/// A missing or unreadable directory yields an empty list; the problem is
/// logged rather than returned.
pub fn list_images(input_dir: &Path) -> Vec<PathBuf> {
    if !input_dir.is_dir() {
        error!("Image directory not found: {}", input_dir.display());
        return Vec::new();
    }

    let entries = match fs::read_dir(input_dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to read directory '{}': {}", input_dir.display(), e);
            return Vec::new();
        }
    };

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_image_file(path))
        .collect();
    images.sort();

    info!(
        "Found {} supported images in '{}'",
        images.len(),
        input_dir.display()
    );
    images
}

/// Read and deserialize a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        OrthoparkError::io(format!("Failed to read JSON file {}", path.display()), e)
    })?;
    serde_json::from_str(&content).map_json_err(&path.display().to_string())
}

/// Serialize `data` as pretty JSON, creating parent directories as needed.
pub fn save_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            OrthoparkError::io(format!("Failed to create directory {}", parent.display()), e)
        })?;
    }
    let content = serde_json::to_string_pretty(data)?;
    fs::write(path, content).map_err(|e| {
        OrthoparkError::io(format!("Failed to write JSON file {}", path.display()), e)
    })?;
    info!("Saved JSON: {}", path.display());
    Ok(())
}
