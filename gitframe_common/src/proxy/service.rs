use std::sync::Arc;

use axum::{
    body::Body,
    debug_handler,
    extract::{Request, State},
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use hyper::header::CONTENT_TYPE;
use hyper::StatusCode;
use scorched::{logf, LogData, LogImportance};

use crate::{
    error::Result,
    host::{
        href::Href,
        nav::{navigation_items, ACTIVE_NAVIGATION_ITEM},
        perm::{Capability, ConfiguredPermissions, PermissionGate},
        session::Session,
        templates::Chrome,
    },
    proxy::rewriter::{Outcome, ProxyRewriter},
    rewriting::rewriter::RequestContext,
    state::ProxyState,
};

/// Fallback route: serves `/browser*` and declines everything else.
#[debug_handler]
pub async fn proxy(
    State(state): State<Arc<ProxyState>>,
    session: Session,
    req: Request,
) -> Result<Response> {
    if !ProxyRewriter::matches(req.uri().path()) {
        return Ok(session.attach(StatusCode::NOT_FOUND.into_response()));
    }

    // Loaded per request so a reload takes effect immediately.
    let config = state.config.load_full();
    let permissions = ConfiguredPermissions::from_config(&config.permissions);

    if let Err(e) = permissions.require(&session.principal, Capability::BrowserView) {
        logf!(
            Warning,
            "Denied {} to session {}: {}",
            req.uri(),
            session.principal.as_str(),
            e
        );
        return Err(e.into());
    }

    let href = Href::new(&config.base_path);
    let ctx = RequestContext::new(
        req.uri().query().unwrap_or(""),
        state.preferences.chrome_enabled(&session.principal),
        href.clone(),
    );

    let outcome = match state.rewriter.handle(&config.upstream, &ctx).await {
        Ok(outcome) => outcome,
        Err(e) => {
            logf!(Error, "Error serving {}: {}", req.uri(), e);
            return Err(e.into());
        }
    };

    let response = match outcome {
        Outcome::Raw { body, content_type } => {
            logf!(
                Info,
                "{} -> raw {} ({} bytes)",
                req.uri(),
                content_type,
                body.len()
            );
            raw_response(Body::from(body), &content_type)?
        }
        Outcome::Template {
            template,
            data,
            content_type,
            stylesheets,
        } => {
            let mut chrome = Chrome::new(&href);
            for stylesheet in stylesheets {
                chrome.add_stylesheet(stylesheet);
            }
            chrome.set_navigation(
                navigation_items(&permissions, &session.principal, &href),
                ACTIVE_NAVIGATION_ITEM,
            );

            let page = match state.templates.render(template, &data, &chrome) {
                Ok(page) => page,
                Err(e) => {
                    logf!(Error, "Error rendering {}: {}", template, e);
                    return Err(e.into());
                }
            };

            logf!(Info, "{} -> {} ({})", req.uri(), template, content_type);
            raw_response(Body::from(page), &content_type)?
        }
    };

    Ok(session.attach(response))
}

fn raw_response(body: Body, content_type: &str) -> Result<Response> {
    let mut response = Response::new(body);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
    Ok(response)
}
