use super::{GalleryResponse, PicsQuery, ScaleQuery, Thumbnail, parse_height};
use crate::AppState;
use crate::templating::TemplateError;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use std::path::PathBuf;
use tokio_util::io::ReaderStream;
use tracing::error;

pub async fn pics_root_handler(
    State(app_state): State<AppState>,
    Query(query): Query<PicsQuery>,
) -> Response {
    render_pics(app_state, String::new(), query).await
}

pub async fn pics_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<PicsQuery>,
) -> Response {
    render_pics(app_state, path, query).await
}

async fn render_pics(app_state: AppState, path: String, query: PicsQuery) -> Response {
    let gallery = app_state.gallery.clone();
    let options = query.options();

    // Directory listing and decoding are blocking work.
    let response = match tokio::task::spawn_blocking(move || gallery.view(&path, options)).await
    {
        Ok(response) => response,
        Err(e) => {
            error!("Gallery task failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let renderer = &app_state.renderer;
    match response {
        GalleryResponse::Album(model) => html(StatusCode::OK, renderer.render_album(&model)),
        GalleryResponse::Photo(view) => html(StatusCode::OK, renderer.render_photo(&view)),
        GalleryResponse::NotFound(view) => {
            html(StatusCode::NOT_FOUND, renderer.render_not_found(&view))
        }
        GalleryResponse::File {
            path,
            file_name,
            attachment,
        } => serve_file(path, &file_name, attachment).await,
    }
}

fn html(status: StatusCode, rendered: Result<String, TemplateError>) -> Response {
    match rendered {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            error!("Template rendering error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn serve_file(path: PathBuf, file_name: &str, attachment: bool) -> Response {
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open file: {:?}: {}", path, e);
            return (StatusCode::NOT_FOUND, "File not found").into_response();
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Ok(metadata) = file.metadata().await {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    }
    if attachment {
        let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', "_"));
        let value = HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    let body = Body::from_stream(ReaderStream::new(file));
    (headers, body).into_response()
}

pub async fn scale_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<ScaleQuery>,
) -> Response {
    let gallery = app_state.gallery.clone();
    let height = parse_height(query.height.as_deref(), &gallery.config().thumbnail);

    let task_gallery = gallery.clone();
    let thumbnail =
        match tokio::task::spawn_blocking(move || task_gallery.thumbnail(&path, height)).await {
            Ok(thumbnail) => thumbnail,
            Err(e) => {
                error!("Thumbnail task failed, sending placeholder: {}", e);
                gallery.placeholder_thumbnail(height)
            }
        };

    png(thumbnail)
}

fn png(thumbnail: Thumbnail) -> Response {
    (
        [(header::CONTENT_TYPE, thumbnail.content_type)],
        thumbnail.bytes,
    )
        .into_response()
}
