use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod gallery;
pub mod startup_checks;
pub mod static_files;
pub mod templating;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub templates: TemplateConfig,
    pub static_files: StaticConfig,
    pub gallery: GalleryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory holding `layout`, `album`, `photo` and `not_found` templates.
    /// The built-in templates are used when unset.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticConfig {
    pub directory: PathBuf,
    pub stylesheet: String,
    pub logo: String,
    pub placeholder: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub source_directory: PathBuf,
    pub name_separator: char,
    pub show_hidden: bool,
    pub thumbnail: ThumbnailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub default_height: u32,
    pub max_height: u32,
    /// Wide images are scaled down further so no thumbnail exceeds this width.
    pub max_width: u32,
    pub preview_height: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Pics".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("static"),
            stylesheet: "main.css".to_string(),
            logo: "logo.png".to_string(),
            placeholder: "file.png".to_string(),
        }
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from("pics"),
            name_separator: '_',
            show_hidden: false,
            thumbnail: ThumbnailConfig::default(),
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            default_height: 256,
            max_height: 4096,
            max_width: 4096,
            preview_height: 512,
        }
    }
}

use axum::{
    Router,
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, Response, header},
    response::{IntoResponse, Redirect},
    routing::get,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::Span;

#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<dyn templating::PageRenderer>,
    pub static_handler: static_files::StaticFileHandler,
    pub gallery: gallery::SharedGallery,
    pub config: Config,
}

async fn stylesheet_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let name = app_state.config.static_files.stylesheet.clone();
    app_state.static_handler.serve(&name).await
}

async fn logo_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let name = app_state.config.static_files.logo.clone();
    app_state.static_handler.serve(&name).await
}

async fn root_handler() -> Redirect {
    Redirect::permanent("/pics/")
}

/// Builds the router. Fails only when configured templates cannot be loaded.
pub async fn create_app(config: Config) -> Result<Router, templating::TemplateError> {
    let renderer: Arc<dyn templating::PageRenderer> = Arc::new(
        templating::LiquidRenderer::load(config.templates.directory.as_deref(), &config.app.name)
            .await?,
    );

    let static_handler =
        static_files::StaticFileHandler::new(config.static_files.directory.clone());

    let gallery = Arc::new(gallery::Gallery::new(
        config.gallery.clone(),
        config
            .static_files
            .directory
            .join(&config.static_files.placeholder),
    ));

    Ok(create_app_with_renderer(config, gallery, static_handler, renderer))
}

pub fn create_app_with_renderer(
    config: Config,
    gallery: gallery::SharedGallery,
    static_handler: static_files::StaticFileHandler,
    renderer: Arc<dyn templating::PageRenderer>,
) -> Router {
    let app_state = AppState {
        renderer,
        static_handler,
        gallery,
        config,
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/pics", get(gallery::pics_root_handler))
        .route("/pics/", get(gallery::pics_root_handler))
        .route("/pics/{*path}", get(gallery::pics_handler))
        .route("/scale/{*path}", get(gallery::scale_handler))
        .route("/css", get(stylesheet_handler))
        .route("/logo", get(logo_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_request(log_request)
                .on_response(log_response),
        )
        .with_state(app_state)
}

fn request_span(request: &Request<Body>) -> Span {
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map(MatchedPath::as_str);

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        matched_path,
    )
}

fn header_or_dash<'a>(headers: &'a axum::http::HeaderMap, name: header::HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
}

fn log_request(request: &Request<Body>, _span: &Span) {
    let uri = request.uri();
    tracing::info!(
        target: "access_log",
        method = %request.method(),
        path = %uri.path(),
        query = ?uri.query(),
        user_agent = %header_or_dash(request.headers(), header::USER_AGENT),
        "request"
    );
}

fn log_response(response: &Response<Body>, latency: Duration, _span: &Span) {
    tracing::info!(
        target: "access_log",
        status = %response.status(),
        size = %header_or_dash(response.headers(), header::CONTENT_LENGTH),
        latency_ms = %latency.as_millis(),
        "response"
    );
}
