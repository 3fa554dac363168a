// Gallery module - folder browsing, photo pages and thumbnails
mod album;
mod classify;
mod error;
mod handlers;
mod metadata;
#[cfg(test)]
mod test_support;
mod thumbnail;
mod types;
mod view;

// Re-export public items
pub use album::{album_href, group_albums, parse_album_name};
pub use classify::{normalize_request_path, probe_dimensions};
pub use error::GalleryError;
pub use handlers::{pics_handler, pics_root_handler, scale_handler};
pub use metadata::{flash_fired, flash_phrase, read_exif, read_image_metadata, simplify_fraction};
pub use thumbnail::{parse_height, scaled_width, thumbnail_dimensions};
pub use types::*;
pub use view::build_breadcrumb;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type SharedGallery = Arc<Gallery>;

/// Read-only view of the gallery tree. Holds configuration only, so one
/// instance is shared by every request.
pub struct Gallery {
    pub(crate) config: crate::GalleryConfig,
    pub(crate) placeholder_path: PathBuf,
}

impl Gallery {
    pub fn new(config: crate::GalleryConfig, placeholder_path: PathBuf) -> Self {
        Self {
            config,
            placeholder_path,
        }
    }

    pub fn config(&self) -> &crate::GalleryConfig {
        &self.config
    }

    pub(crate) fn full_path(&self, relative_path: &str) -> PathBuf {
        self.config.source_directory.join(relative_path)
    }

    pub(crate) fn is_visible(&self, file_name: &str) -> bool {
        self.config.show_hidden || !file_name.starts_with('.')
    }

    pub(crate) fn placeholder_path(&self) -> &Path {
        &self.placeholder_path
    }
}

/// Percent-encode each segment of a slash separated path.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a directory path and an entry name, either of which may be empty.
pub(crate) fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}
