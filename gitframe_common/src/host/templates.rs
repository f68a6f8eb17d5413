//! Template rendering.
//!
//! Templates are embedded at compile time and filled from a JSON object payload. `{{key}}`
//! inserts the HTML-escaped value, `{{{key}}}` inserts it verbatim and is reserved for
//! trusted markup. Substitution is a single pass, so placeholders inside inserted values
//! are never expanded.

use std::collections::HashMap;

use axum::http::StatusCode;
use html_escape::encode_double_quoted_attribute;
use serde_json::Value;

use crate::{
    error::ProxyError,
    host::{href::Href, nav::NavItem},
};

const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    ("gitweb.html", include_str!("../../templates/gitweb.html")),
    (
        "prefs_gitweb.html",
        include_str!("../../templates/prefs_gitweb.html"),
    ),
    ("error.html", include_str!("../../templates/error.html")),
];

/// Page-shell state collected while handling a request.
#[derive(Debug, Clone, Default)]
pub struct Chrome {
    stylesheets: Vec<String>,
    navigation: Vec<NavItem>,
    active: Option<&'static str>,
    base_path: String,
}

impl Chrome {
    pub fn new(href: &Href) -> Self {
        Self {
            base_path: href.base().to_string(),
            ..Self::default()
        }
    }

    /// Registers a stylesheet to be linked from the page head. Duplicates are dropped.
    pub fn add_stylesheet(&mut self, href: impl Into<String>) {
        let href = href.into();
        if !self.stylesheets.contains(&href) {
            self.stylesheets.push(href);
        }
    }

    pub fn stylesheets(&self) -> &[String] {
        &self.stylesheets
    }

    pub fn set_navigation(&mut self, items: Vec<NavItem>, active: &'static str) {
        self.navigation = items;
        self.active = Some(active);
    }

    fn stylesheet_links(&self) -> String {
        self.stylesheets
            .iter()
            .map(|href| {
                format!(
                    r#"    <link rel="stylesheet" type="text/css" href="{}"/>"#,
                    encode_double_quoted_attribute(href)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn mainnav(&self) -> String {
        self.navigation
            .iter()
            .filter(|item| item.category == "mainnav")
            .map(|item| {
                let class = if self.active == Some(item.name) {
                    r#" class="active""#
                } else {
                    ""
                };
                format!(
                    r#"        <li{}><a href="{}">{}</a></li>"#,
                    class,
                    encode_double_quoted_attribute(&item.href),
                    encode_double_quoted_attribute(&item.label)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct TemplateRenderer {
    templates: HashMap<&'static str, &'static str>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self {
            templates: EMBEDDED_TEMPLATES.iter().copied().collect(),
        }
    }

    pub fn template_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.templates.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Renders `name` with the fields of `data` plus the page-shell values from `chrome`
    /// (`stylesheets`, `mainnav`, `base_path`).
    pub fn render(&self, name: &str, data: &Value, chrome: &Chrome) -> Result<String, ProxyError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| ProxyError::UnknownTemplate(name.to_string()))?;

        let mut values: HashMap<String, String> = HashMap::new();
        values.insert("stylesheets".to_string(), chrome.stylesheet_links());
        values.insert("mainnav".to_string(), chrome.mainnav());
        values.insert("base_path".to_string(), chrome.base_path.clone());

        if let Value::Object(fields) = data {
            for (key, value) in fields {
                values.insert(key.clone(), value_to_string(value));
            }
        }

        Ok(fill(template, &values))
    }
}

/// Renders the standalone error page. Used where no renderer state is at hand.
pub fn render_error_page(status: StatusCode, message: &str) -> String {
    let mut values = HashMap::new();
    values.insert("status".to_string(), status.as_u16().to_string());
    values.insert("message".to_string(), message.to_string());

    let template = EMBEDDED_TEMPLATES
        .iter()
        .find(|(name, _)| *name == "error.html")
        .map(|(_, template)| *template)
        .unwrap_or("<h1>Error {{status}}</h1><p>{{message}}</p>");

    fill(template, &values)
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn fill(template: &str, values: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tag = &rest[start..];
        let (open, close) = if tag.starts_with("{{{") {
            ("{{{", "}}}")
        } else {
            ("{{", "}}")
        };

        let Some(end) = tag[open.len()..].find(close) else {
            out.push_str(tag);
            rest = "";
            break;
        };

        let key = tag[open.len()..open.len() + end].trim();
        if let Some(value) = values.get(key) {
            if open == "{{{" {
                out.push_str(value);
            } else {
                out.push_str(&encode_double_quoted_attribute(value));
            }
        }
        rest = &tag[open.len() + end + close.len()..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn double_braces_escape_and_triple_braces_do_not() {
        let out = fill(
            "<p>{{text}}</p>{{{html}}}",
            &values(&[("text", "<b>&"), ("html", "<b>bold</b>")]),
        );
        assert_eq!(out, "<p>&lt;b&gt;&amp;</p><b>bold</b>");
    }

    #[test]
    fn inserted_values_are_not_expanded_again() {
        let out = fill(
            "{{{page}}} {{title}}",
            &values(&[("page", "{{title}}"), ("title", "T")]),
        );
        assert_eq!(out, "{{title}} T");
    }

    #[test]
    fn unknown_keys_render_empty_and_unclosed_tags_stay() {
        assert_eq!(fill("a{{missing}}b", &HashMap::new()), "ab");
        assert_eq!(fill("a{{open", &HashMap::new()), "a{{open");
    }

    #[test]
    fn page_shell_includes_stylesheets_navigation_and_raw_page() {
        let renderer = TemplateRenderer::new();
        let href = Href::new("/trac");
        let mut chrome = Chrome::new(&href);
        chrome.add_stylesheet("/trac/chrome/gitweb/gitweb.css");
        chrome.add_stylesheet("/trac/chrome/gitweb/gitweb.css");
        chrome.set_navigation(
            vec![NavItem {
                category: "mainnav",
                name: "gitweb",
                label: "Browse Source".to_string(),
                href: href.browser(),
            }],
            "gitweb",
        );
        assert_eq!(chrome.stylesheets().len(), 1);

        let page = renderer
            .render(
                "gitweb.html",
                &json!({"title": "Browse Source", "gitweb_page": "<div class=\"page_body\">x</div>"}),
                &chrome,
            )
            .unwrap();

        assert!(page.contains(r#"href="/trac/chrome/gitweb/gitweb.css""#));
        assert!(page.contains(r#"<li class="active"><a href="/trac/browser">Browse Source</a></li>"#));
        assert!(page.contains(r#"<div class="page_body">x</div>"#));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let renderer = TemplateRenderer::new();
        let err = renderer
            .render("nope.html", &json!({}), &Chrome::default())
            .unwrap_err();
        assert!(matches!(err, ProxyError::UnknownTemplate(name) if name == "nope.html"));
    }

    #[test]
    fn lists_embedded_templates() {
        assert_eq!(
            TemplateRenderer::new().template_names(),
            vec!["error.html", "gitweb.html", "prefs_gitweb.html"]
        );
    }

    #[test]
    fn error_page_escapes_the_message() {
        let page = render_error_page(StatusCode::BAD_GATEWAY, "<script>");
        assert!(page.contains("Error 502"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
