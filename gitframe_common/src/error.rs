use core::fmt;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::host::{href::HrefError, perm::Capability, templates::render_error_page};

/// Failures that end a browser request before any proxied bytes are written.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("{0}")]
    Configuration(String),
    #[error("failed to fetch the upstream page: {0}")]
    UpstreamFetch(#[from] reqwest::Error),
    #[error("rewrite rule `{rule}` could not build its replacement: {source}")]
    Replacement {
        rule: &'static str,
        #[source]
        source: HrefError,
    },
    #[error("the {0} permission is required to view this page")]
    Forbidden(Capability),
    #[error("no template named `{0}`")]
    UnknownTemplate(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Forbidden(_) => StatusCode::FORBIDDEN,
            ProxyError::Configuration(_)
            | ProxyError::Replacement { .. }
            | ProxyError::UnknownTemplate(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Make our own error that wraps `anyhow::Error`.
#[derive(Debug)]
pub struct AppError(anyhow::Error);

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        self.0
            .downcast_ref::<ProxyError>()
            .map(ProxyError::status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Html(render_error_page(status, &self.0.to_string()))).into_response()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>` to turn them into
// `Result<_, AppError>`. That way you don't need to do that manually.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_the_wrapped_proxy_error() {
        let err: AppError = ProxyError::Configuration("no url".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = ProxyError::Forbidden(Capability::BrowserView).into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err: AppError = anyhow::anyhow!("something else").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn forbidden_becomes_a_403_page() {
        let err: AppError = ProxyError::Forbidden(Capability::BrowserView).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
