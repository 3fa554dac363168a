use super::{
    BreadcrumbItem, DirectoryListing, Gallery, GalleryError, GalleryResponse, GalleryViewModel, NotFoundView,
    PathKind, PhotoEntry, PhotoView, PicsOptions, encode_path, group_albums, join_relative,
    read_exif, read_image_metadata,
};
use tracing::{debug, warn};

/// Breadcrumb for `/pics/<relative_path>`.
///
/// Every segment links to its own directory form (trailing slash). The
/// final segment of a nested path links without the slash and is marked
/// current.
pub fn build_breadcrumb(relative_path: &str) -> Vec<BreadcrumbItem> {
    let segments: Vec<&str> = std::iter::once("pics")
        .chain(relative_path.split('/').filter(|s| !s.is_empty()))
        .collect();

    let mut breadcrumb = Vec::with_capacity(segments.len());
    let mut current_path = String::new();

    for (i, segment) in segments.iter().enumerate() {
        current_path.push('/');
        current_path.push_str(&urlencoding::encode(segment));

        let is_last = i == segments.len() - 1;
        let href = if is_last && segments.len() > 1 {
            current_path.clone()
        } else {
            format!("{}/", current_path)
        };

        breadcrumb.push(BreadcrumbItem {
            label: segment.to_string(),
            href,
            is_current: is_last,
        });
    }

    breadcrumb
}

fn page_title(relative_path: &str) -> String {
    relative_path
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or("pics")
        .to_string()
}

impl Gallery {
    /// Build the response for `/pics/<request_path>`.
    pub fn view(&self, request_path: &str, options: PicsOptions) -> GalleryResponse {
        let entity = self.classify(request_path);
        let relative_path = entity.relative_path;

        match entity.kind {
            PathKind::Directory => match self.album_view(&relative_path) {
                Ok(model) => GalleryResponse::Album(model),
                Err(e) => {
                    warn!("Failed to list {:?}: {}", relative_path, e);
                    GalleryResponse::NotFound(self.not_found_view(&relative_path))
                }
            },
            PathKind::Photo if options.download => self.file_response(&relative_path, true),
            PathKind::Photo => GalleryResponse::Photo(self.photo_view(&relative_path, options)),
            PathKind::OtherFile => self.file_response(&relative_path, false),
            PathKind::NotFound => GalleryResponse::NotFound(self.not_found_view(&relative_path)),
        }
    }

    /// List a directory the way the classifier sees it: hidden names are
    /// skipped and every entry must resolve inside the gallery root, so
    /// symlinks pointing elsewhere are left out.
    pub fn list_directory(&self, relative_path: &str) -> Result<DirectoryListing, GalleryError> {
        let (relative_path, directory) = self.resolve(relative_path)?;

        let mut listing = DirectoryListing::default();
        for entry in std::fs::read_dir(&directory)?.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if !self.is_visible(&name) {
                continue;
            }

            let target = match self.resolve(&join_relative(&relative_path, &name)) {
                Ok((_, target)) => target,
                Err(e) => {
                    debug!("Skipping {:?} in {:?}: {}", name, relative_path, e);
                    continue;
                }
            };

            if target.is_file() {
                listing.files.push(name);
            } else if target.is_dir() {
                listing.folders.push(name);
            }
        }
        listing.files.sort();

        Ok(listing)
    }

    pub fn album_view(&self, relative_path: &str) -> Result<GalleryViewModel, GalleryError> {
        let DirectoryListing { folders, files } = self.list_directory(relative_path)?;

        debug!(
            "Listing {:?}: {} folders, {} files",
            relative_path,
            folders.len(),
            files.len()
        );

        let groups = group_albums(&folders, self.config.name_separator)
            .iter()
            .map(|group| group.to_view(relative_path))
            .collect();

        let photo_entries = files
            .iter()
            .map(|name| self.photo_entry(relative_path, name))
            .collect();

        Ok(GalleryViewModel {
            title: page_title(relative_path),
            breadcrumb: build_breadcrumb(relative_path),
            is_empty: files.is_empty() && folders.is_empty(),
            groups,
            photo_entries,
        })
    }

    fn photo_entry(&self, relative_path: &str, name: &str) -> PhotoEntry {
        let child = join_relative(relative_path, name);
        let encoded = encode_path(&child);

        let metadata_summary = match read_image_metadata(&self.full_path(&child)) {
            Ok(metadata) => metadata.summary(),
            Err(e) => {
                debug!("No metadata for {:?}: {}", child, e);
                String::new()
            }
        };

        PhotoEntry {
            display_name: name.to_string(),
            href: format!("/pics/{}", encoded),
            thumbnail_href: format!("/scale/{}", encoded),
            metadata_summary,
        }
    }

    pub fn photo_view(&self, relative_path: &str, options: PicsOptions) -> PhotoView {
        let encoded = encode_path(relative_path);
        let more_info_href = format!("/pics/{}?exif=1", encoded);

        PhotoView {
            title: page_title(relative_path),
            breadcrumb: build_breadcrumb(relative_path),
            preview_href: format!(
                "/scale/{}?height={}",
                encoded, self.config.thumbnail.preview_height
            ),
            download_href: format!("/pics/{}?dl=1", encoded),
            exif: read_exif(
                &self.full_path(relative_path),
                options.exif_mode,
                &more_info_href,
            ),
        }
    }

    pub fn not_found_view(&self, relative_path: &str) -> NotFoundView {
        NotFoundView {
            title: "Not found".to_string(),
            breadcrumb: build_breadcrumb(relative_path),
        }
    }

    fn file_response(&self, relative_path: &str, attachment: bool) -> GalleryResponse {
        GalleryResponse::File {
            path: self.full_path(relative_path),
            file_name: page_title(relative_path),
            attachment,
        }
    }
}
