//! The "Gitweb" preferences panel, where a principal turns chrome wrapping on or off.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use html_escape::encode_double_quoted_attribute;
use scorched::{logf, LogData, LogImportance};
use serde_json::json;

use crate::{
    error::Result,
    host::{
        assets::CHROME_PREFIX,
        href::Href,
        nav::navigation_items,
        perm::ConfiguredPermissions,
        session::Session,
        templates::Chrome,
    },
    state::ProxyState,
};

pub const PANEL_NAME: &str = "gitweb";

const PANEL_TEMPLATE: &str = "prefs_gitweb.html";

/// Panels this application adds to the preferences page, as `(name, label)`.
pub fn preference_panels() -> &'static [(&'static str, &'static str)] {
    &[(PANEL_NAME, "Gitweb")]
}

fn panel_tabs(href: &Href) -> String {
    preference_panels()
        .iter()
        .map(|(name, label)| {
            let class = if *name == PANEL_NAME {
                r#" class="active""#
            } else {
                ""
            };
            format!(
                r#"        <li{}><a href="{}">{}</a></li>"#,
                class,
                encode_double_quoted_attribute(&href.prefs(name)),
                encode_double_quoted_attribute(label)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn render_panel(
    State(state): State<Arc<ProxyState>>,
    session: Session,
) -> Result<Response> {
    let config = state.config.load_full();
    let href = Href::new(&config.base_path);
    let permissions = ConfiguredPermissions::from_config(&config.permissions);

    let mut chrome = Chrome::new(&href);
    chrome.add_stylesheet(href.chrome(CHROME_PREFIX, "gitweb-trac.css")?);
    chrome.set_navigation(
        navigation_items(&permissions, &session.principal, &href),
        "prefs",
    );

    let enabled = state.preferences.chrome_enabled(&session.principal);
    let data = json!({
        "panel_label": "Gitweb",
        "panels": panel_tabs(&href),
        "action": href.prefs(PANEL_NAME),
        "checked": if enabled { "checked" } else { "" },
    });

    let page = state.templates.render(PANEL_TEMPLATE, &data, &chrome)?;
    Ok(session.attach(Html(page).into_response()))
}

/// Stores the checkbox state and redirects back to the panel. An unchecked box is simply
/// absent from the form.
pub async fn save_panel(
    State(state): State<Arc<ProxyState>>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let config = state.config.load_full();
    let href = Href::new(&config.base_path);

    let enabled = form.contains_key("chrome_enabled");
    state
        .preferences
        .set_chrome_enabled(&session.principal, enabled);

    logf!(
        Info,
        "Session {} set chrome wrapping to {}",
        session.principal.as_str(),
        enabled
    );

    session.attach(Redirect::to(&href.prefs(PANEL_NAME)).into_response())
}
