//! Path and filter utilities

use std::path::{Path, PathBuf};

use crate::utils::config::IMAGE_EXTENSIONS;

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// True if `name`, lowercased, ends with one of the image extensions.
pub fn has_image_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// True if the file name of `path` is an image candidate. Non-UTF-8 names are checked lossily.
pub fn is_image_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| has_image_extension(&n.to_string_lossy()))
        .unwrap_or(false)
}
