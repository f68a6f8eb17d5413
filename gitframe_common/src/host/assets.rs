use std::path::Path;

use axum::{
    extract::Path as UrlPath,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use hyper::header::CONTENT_TYPE;
use tower_http::services::ServeDir;

use crate::proxy::mime::mime_for_filename;

/// Asset prefix used in `/chrome/<prefix>/<name>` URLs.
pub const CHROME_PREFIX: &str = "gitweb";

const EMBEDDED_ASSETS: &[(&str, &[u8])] = &[
    ("gitweb.css", include_bytes!("../../htdocs/gitweb.css")),
    ("gitweb-full.css", include_bytes!("../../htdocs/gitweb-full.css")),
    ("gitweb-trac.css", include_bytes!("../../htdocs/gitweb-trac.css")),
    ("git-logo.png", include_bytes!("../../htdocs/git-logo.png")),
];

pub fn embedded_asset(name: &str) -> Option<&'static [u8]> {
    EMBEDDED_ASSETS
        .iter()
        .find(|(asset, _)| *asset == name)
        .map(|(_, bytes)| *bytes)
}

pub fn asset_names() -> impl Iterator<Item = &'static str> {
    EMBEDDED_ASSETS.iter().map(|(name, _)| *name)
}

/// Routes for `/chrome/gitweb/*`, served from `htdocs_dir` when given.
pub fn service<S>(htdocs_dir: Option<&Path>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let mount = format!("/chrome/{CHROME_PREFIX}");
    match htdocs_dir {
        Some(dir) => Router::new().nest_service(&mount, ServeDir::new(dir)),
        None => Router::new().route(&format!("{mount}/:name"), get(chrome_asset)),
    }
}

async fn chrome_asset(UrlPath(name): UrlPath<String>) -> Response {
    match embedded_asset(&name) {
        Some(bytes) => (
            StatusCode::OK,
            [(CONTENT_TYPE, mime_for_filename(&name).unwrap_or("application/octet-stream"))],
            bytes,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
