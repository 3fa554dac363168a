use crate::gallery::{GalleryViewModel, NotFoundView, PhotoView};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template error: {0}")]
    Liquid(#[from] liquid::Error),

    #[error("Failed to read template {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Turns gallery view models into HTML pages.
pub trait PageRenderer: Send + Sync {
    fn render_album(&self, view: &GalleryViewModel) -> Result<String, TemplateError>;
    fn render_photo(&self, view: &PhotoView) -> Result<String, TemplateError>;
    fn render_not_found(&self, view: &NotFoundView) -> Result<String, TemplateError>;
}

const LAYOUT: (&str, &str) = (
    "layout.html.liquid",
    include_str!("../templates/layout.html.liquid"),
);
const ALBUM: (&str, &str) = (
    "album.html.liquid",
    include_str!("../templates/album.html.liquid"),
);
const PHOTO: (&str, &str) = (
    "photo.html.liquid",
    include_str!("../templates/photo.html.liquid"),
);
const NOT_FOUND: (&str, &str) = (
    "not_found.html.liquid",
    include_str!("../templates/not_found.html.liquid"),
);

/// Liquid based renderer. Each page template renders the body, which the
/// layout then wraps with the stylesheet and sidebar.
pub struct LiquidRenderer {
    app_name: String,
    layout: liquid::Template,
    album: liquid::Template,
    photo: liquid::Template,
    not_found: liquid::Template,
}

impl LiquidRenderer {
    /// Renderer using only the templates compiled into the binary.
    pub fn builtin(app_name: &str) -> Result<Self, TemplateError> {
        Self::from_sources(app_name, LAYOUT.1, ALBUM.1, PHOTO.1, NOT_FOUND.1)
    }

    /// Load templates from `directory`, falling back to the built-in copy of
    /// any template the directory does not provide.
    pub async fn load(directory: Option<&Path>, app_name: &str) -> Result<Self, TemplateError> {
        let Some(directory) = directory else {
            return Self::builtin(app_name);
        };

        info!("Loading templates from {:?}", directory);
        let layout = load_source(directory, LAYOUT).await?;
        let album = load_source(directory, ALBUM).await?;
        let photo = load_source(directory, PHOTO).await?;
        let not_found = load_source(directory, NOT_FOUND).await?;

        Self::from_sources(app_name, &layout, &album, &photo, &not_found)
    }

    fn from_sources(
        app_name: &str,
        layout: &str,
        album: &str,
        photo: &str,
        not_found: &str,
    ) -> Result<Self, TemplateError> {
        let parser = liquid::ParserBuilder::with_stdlib().build()?;

        Ok(Self {
            app_name: app_name.to_string(),
            layout: parser.parse(layout)?,
            album: parser.parse(album)?,
            photo: parser.parse(photo)?,
            not_found: parser.parse(not_found)?,
        })
    }

    fn render_page<T: Serialize>(
        &self,
        template: &liquid::Template,
        title: &str,
        view: &T,
    ) -> Result<String, TemplateError> {
        let globals = liquid::to_object(view)?;
        let content = template.render(&globals)?;

        let page = liquid::object!({
            "app_name": self.app_name,
            "title": title,
            "content": content,
        });
        Ok(self.layout.render(&page)?)
    }
}

async fn load_source(directory: &Path, (name, builtin): (&str, &str)) -> Result<String, TemplateError> {
    match tokio::fs::read_to_string(directory.join(name)).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Template {} not in {:?}, using built-in", name, directory);
            Ok(builtin.to_string())
        }
        Err(source) => Err(TemplateError::Io {
            name: name.to_string(),
            source,
        }),
    }
}

impl PageRenderer for LiquidRenderer {
    fn render_album(&self, view: &GalleryViewModel) -> Result<String, TemplateError> {
        self.render_page(&self.album, &view.title, view)
    }

    fn render_photo(&self, view: &PhotoView) -> Result<String, TemplateError> {
        self.render_page(&self.photo, &view.title, view)
    }

    fn render_not_found(&self, view: &NotFoundView) -> Result<String, TemplateError> {
        self.render_page(&self.not_found, &view.title, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::{
        AlbumGroupView, AlbumLink, ExifReport, ExifRow, PhotoEntry, build_breadcrumb,
    };
    use tempfile::TempDir;

    fn album_model() -> GalleryViewModel {
        GalleryViewModel {
            title: "pics".to_string(),
            breadcrumb: build_breadcrumb(""),
            groups: vec![
                AlbumGroupView {
                    caption: "2021".to_string(),
                    is_unsorted: false,
                    entries: vec![AlbumLink {
                        label: "10 Apr: Birthday".to_string(),
                        href: "/pics/2021-04-10_Birthday".to_string(),
                    }],
                },
                AlbumGroupView {
                    caption: "Unsorted".to_string(),
                    is_unsorted: true,
                    entries: vec![AlbumLink {
                        label: "<script>".to_string(),
                        href: "/pics/%3Cscript%3E".to_string(),
                    }],
                },
            ],
            photo_entries: vec![PhotoEntry {
                display_name: "cake.jpg".to_string(),
                href: "/pics/cake.jpg".to_string(),
                thumbnail_href: "/scale/cake.jpg".to_string(),
                metadata_summary: "0.5mb (640x480)".to_string(),
            }],
            is_empty: false,
        }
    }

    #[test]
    fn album_page_renders_groups_and_photos() {
        let renderer = LiquidRenderer::builtin("Pics").unwrap();
        let html = renderer.render_album(&album_model()).unwrap();

        assert!(html.contains("<link rel='stylesheet' href='/css'>"));
        assert!(html.contains("<b>2021</b>"));
        assert!(html.contains("<b>Unsorted</b>"));
        assert!(html.contains("href='/pics/2021-04-10_Birthday'>10 Apr: Birthday</a>"));
        assert!(html.contains("src='/scale/cake.jpg'"));
        assert!(html.contains("0.5mb (640x480)"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn empty_album_says_so() {
        let renderer = LiquidRenderer::builtin("Pics").unwrap();
        let model = GalleryViewModel {
            groups: Vec::new(),
            photo_entries: Vec::new(),
            is_empty: true,
            ..album_model()
        };
        let html = renderer.render_album(&model).unwrap();
        assert!(html.contains("This folder is empty."));
    }

    #[test]
    fn photo_page_renders_exif_variants() {
        let renderer = LiquidRenderer::builtin("Pics").unwrap();
        let mut view = PhotoView {
            title: "cake.jpg".to_string(),
            breadcrumb: build_breadcrumb("cake.jpg"),
            preview_href: "/scale/cake.jpg?height=512".to_string(),
            download_href: "/pics/cake.jpg?dl=1".to_string(),
            exif: ExifReport::Table {
                rows: vec![ExifRow {
                    label: "Flash".to_string(),
                    value: "Flash fired".to_string(),
                }],
                more_info_href: Some("/pics/cake.jpg?exif=1".to_string()),
            },
        };

        let html = renderer.render_photo(&view).unwrap();
        assert!(html.contains("href='/pics/cake.jpg?dl=1'>Download original</a>"));
        assert!(html.contains("<b>Flash:</b>"));
        assert!(html.contains("Get more info"));

        view.exif = ExifReport::Unavailable;
        let html = renderer.render_photo(&view).unwrap();
        assert!(html.contains("No EXIF data is available for this image."));

        view.exif = ExifReport::Failed {
            message: "Invalid TIFF preamble".to_string(),
        };
        let html = renderer.render_photo(&view).unwrap();
        assert!(html.contains("An error occured whilst obtaining EXIF data"));
        assert!(html.contains("<code>Invalid TIFF preamble</code>"));
    }

    #[test]
    fn not_found_page() {
        let renderer = LiquidRenderer::builtin("Pics").unwrap();
        let view = NotFoundView {
            title: "Not found".to_string(),
            breadcrumb: build_breadcrumb("a/b"),
        };
        let html = renderer.render_not_found(&view).unwrap();
        assert!(html.contains("The path you have requested does not exist."));
        assert!(html.contains("href='/pics/a/'"));
    }

    #[tokio::test]
    async fn directory_templates_override_builtin() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("not_found.html.liquid"),
            "<p>Gone: {{ breadcrumb.size }}</p>",
        )
        .unwrap();

        let renderer = LiquidRenderer::load(Some(temp_dir.path()), "Pics")
            .await
            .unwrap();
        let view = NotFoundView {
            title: "Not found".to_string(),
            breadcrumb: build_breadcrumb("x"),
        };
        let html = renderer.render_not_found(&view).unwrap();
        assert!(html.contains("<p>Gone: 2</p>"));
        assert!(html.contains("class='body-sidebar'"));
    }
}
