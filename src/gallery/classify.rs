use super::{Gallery, GalleryError, PathEntity, PathKind};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Clean a request path into slash separated segments.
///
/// Empty and `.` segments are dropped. Any `..` segment, backslash or NUL
/// byte makes the path invalid, so a request can never climb out of the
/// gallery root lexically.
pub fn normalize_request_path(request_path: &str) -> Result<String, GalleryError> {
    let mut segments = Vec::new();
    for segment in request_path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(GalleryError::InvalidPath),
            s if s.contains('\\') || s.contains('\0') => return Err(GalleryError::InvalidPath),
            s => segments.push(s),
        }
    }
    Ok(segments.join("/"))
}

/// Read just enough of a file to learn its pixel size.
///
/// This is the "is it a photo" test: `Ok` means the file is a raster image
/// the decoder understands.
pub fn probe_dimensions(path: &Path) -> Result<(u32, u32), GalleryError> {
    let reader = image::ImageReader::open(path)?.with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

impl Gallery {
    /// Resolve a request path to a location on disk that is guaranteed to sit
    /// under the gallery root, following symlinks.
    pub(crate) fn resolve(&self, request_path: &str) -> Result<(String, PathBuf), GalleryError> {
        let relative = normalize_request_path(request_path)?;
        let root = std::fs::canonicalize(&self.config.source_directory)?;
        let target = std::fs::canonicalize(root.join(&relative))?;

        if !target.starts_with(&root) {
            debug!("Path escapes gallery root: {:?}", target);
            return Err(GalleryError::InvalidPath);
        }

        Ok((relative, target))
    }

    pub fn classify(&self, request_path: &str) -> PathEntity {
        let (relative_path, target) = match self.resolve(request_path) {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!("Cannot resolve {:?}: {}", request_path, e);
                return PathEntity {
                    kind: PathKind::NotFound,
                    relative_path: request_path.trim_matches('/').to_string(),
                };
            }
        };

        let kind = match std::fs::metadata(&target) {
            Ok(metadata) if metadata.is_dir() => PathKind::Directory,
            Ok(metadata) if metadata.is_file() => match probe_dimensions(&target) {
                Ok(_) => PathKind::Photo,
                Err(e) => {
                    trace!("{:?} is not an image: {}", target, e);
                    PathKind::OtherFile
                }
            },
            Ok(_) => PathKind::NotFound,
            Err(e) => {
                debug!("Failed to stat {:?}: {}", target, e);
                PathKind::NotFound
            }
        };

        debug!("Classified {:?} as {:?}", relative_path, kind);
        PathEntity {
            kind,
            relative_path,
        }
    }
}
