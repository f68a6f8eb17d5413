pub mod error;
pub mod host;
pub mod proxy;
pub mod rewriting;
pub mod state;

use std::{future::Future, sync::Arc};

use arc_swap::ArcSwap;
use axum::{routing::get, Router};
use error::Result;
use scorched::{logf, LogData, LogImportance};
use state::{validate_config, Config, ProxyState};

pub fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .zstd(true)
        .build()?)
}

/// The host application's routes. Anything not matched here goes to the browser proxy,
/// which declines paths outside `/browser`.
pub fn app(state: Arc<ProxyState>) -> Router {
    let htdocs_dir = state.config.load().chrome.htdocs_dir.clone();

    Router::new()
        .route(
            "/prefs/gitweb",
            get(host::prefs::render_panel).post(host::prefs::save_panel),
        )
        .merge(host::assets::service(htdocs_dir.as_deref()))
        .fallback(proxy::service::proxy)
        .with_state(state)
}

pub async fn serve<F>(config: Arc<ArcSwap<Config>>, graceful_shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let current = config.load_full();

    for warning in validate_config(&current) {
        logf!(Warning, "Configuration: {}", warning);
    }

    let state = Arc::new(ProxyState::new(config.clone(), build_client()?));

    let listener = tokio::net::TcpListener::bind(current.host).await?;
    logf!(
        Info,
        "Listening on {}, proxying {}",
        current.host,
        current.upstream.url
    );

    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    Ok(())
}
