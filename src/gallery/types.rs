use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

/// What a request path points at on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    Photo,
    OtherFile,
    Directory,
    NotFound,
}

/// A classified path under the gallery root. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntity {
    pub kind: PathKind,
    /// Slash separated, without leading or trailing slash. Empty for the root.
    pub relative_path: String,
}

/// A directory (or file stem) name split into an optional date and a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumNameRecord {
    /// `None` when no date could be parsed; such albums land in the unsorted bucket.
    pub date: Option<NaiveDate>,
    pub title: String,
    /// The name exactly as found on disk, used for links.
    pub raw_name: String,
}

/// Bucket key for album grouping.
///
/// Ordering is display order: newer years sort first and `Unsorted`
/// sorts after every real year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlbumYear {
    Year(i32),
    Unsorted,
}

impl Ord for AlbumYear {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (AlbumYear::Year(a), AlbumYear::Year(b)) => b.cmp(a),
            (AlbumYear::Year(_), AlbumYear::Unsorted) => Ordering::Less,
            (AlbumYear::Unsorted, AlbumYear::Year(_)) => Ordering::Greater,
            (AlbumYear::Unsorted, AlbumYear::Unsorted) => Ordering::Equal,
        }
    }
}

impl PartialOrd for AlbumYear {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Visible entries of a gallery directory, limited to those that resolve
/// inside the gallery root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub folders: Vec<String>,
    /// Sorted by name.
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumGroup {
    pub year: AlbumYear,
    pub records: Vec<AlbumNameRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    pub size_bytes: u64,
    /// Present only when the file decodes as an image.
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExifMode {
    #[default]
    Summary,
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExifRow {
    pub label: String,
    pub value: String,
}

/// Outcome of reading EXIF data for the photo page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExifReport {
    /// The file has no EXIF segment.
    Unavailable,
    Table {
        rows: Vec<ExifRow>,
        /// Link to the full listing; only set in summary mode.
        more_info_href: Option<String>,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreadcrumbItem {
    pub label: String,
    pub href: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumLink {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumGroupView {
    pub caption: String,
    pub is_unsorted: bool,
    pub entries: Vec<AlbumLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoEntry {
    pub display_name: String,
    pub href: String,
    pub thumbnail_href: String,
    pub metadata_summary: String,
}

/// Render-ready listing of a gallery directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryViewModel {
    pub title: String,
    pub breadcrumb: Vec<BreadcrumbItem>,
    pub groups: Vec<AlbumGroupView>,
    pub photo_entries: Vec<PhotoEntry>,
    pub is_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoView {
    pub title: String,
    pub breadcrumb: Vec<BreadcrumbItem>,
    pub preview_href: String,
    pub download_href: String,
    pub exif: ExifReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotFoundView {
    pub title: String,
    pub breadcrumb: Vec<BreadcrumbItem>,
}

/// Everything the transport layer needs to answer a `/pics/...` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryResponse {
    Album(GalleryViewModel),
    Photo(PhotoView),
    /// Raw bytes to stream back as `application/octet-stream`.
    File {
        path: PathBuf,
        file_name: String,
        attachment: bool,
    },
    NotFound(NotFoundView),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PicsOptions {
    pub download: bool,
    pub exif_mode: ExifMode,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PicsQuery {
    pub dl: Option<String>,
    pub exif: Option<String>,
}

impl PicsQuery {
    pub fn options(&self) -> PicsOptions {
        PicsOptions {
            download: self.dl.as_deref() == Some("1"),
            exif_mode: if self.exif.as_deref() == Some("1") {
                ExifMode::Full
            } else {
                ExifMode::Summary
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ScaleQuery {
    pub height: Option<String>,
}

/// An encoded thumbnail ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}
