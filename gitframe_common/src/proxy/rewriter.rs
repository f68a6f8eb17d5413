//! Fetch, classify and rewrite one gitweb page.

use std::sync::Arc;

use axum::body::Bytes;
use encoding_rs::{Encoding, UTF_8};
use hyper::header::CONTENT_TYPE;
use serde_json::json;

use crate::{
    error::ProxyError,
    host::assets::CHROME_PREFIX,
    proxy::mime::{blob_mime_type, DEFAULT_BLOB_MIME},
    rewriting::{
        rewriter::{RequestContext, Rewriter},
        rules::RuleChain,
    },
    state::UpstreamConfig,
};

/// Path prefix this handler serves.
pub const MOUNT_PREFIX: &str = "/browser";

/// Actions whose output is a feed or listing and goes out untouched.
pub const FEED_ACTIONS: &[&str] = &["rss", "opml", "project_index", "atom"];

/// Template used for pages wrapped in the site chrome.
pub const PAGE_TEMPLATE: &str = "gitweb.html";

/// Stylesheets registered with the page shell when wrapping.
pub const SHELL_STYLESHEETS: &[&str] = &["gitweb.css", "gitweb-trac.css"];

/// A fetched upstream page. Lives for one request.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub body: Bytes,
    /// `Content-Type` exactly as the upstream sent it
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Bytes sent as-is with an explicit MIME type.
    Raw { body: Bytes, content_type: String },
    /// A fragment handed to the page shell.
    Template {
        template: &'static str,
        data: serde_json::Value,
        content_type: String,
        stylesheets: Vec<String>,
    },
}

#[derive(Clone)]
pub struct ProxyRewriter {
    client: reqwest::Client,
    rules: Arc<RuleChain>,
}

impl ProxyRewriter {
    pub fn new(client: reqwest::Client, rules: Arc<RuleChain>) -> Self {
        Self { client, rules }
    }

    /// Whether a request path belongs to the browser.
    pub fn matches(path: &str) -> bool {
        path.starts_with(MOUNT_PREFIX)
    }

    /// Serves one browser request. The caller has already checked the `BROWSER_VIEW`
    /// permission. Every error is returned before any output exists.
    pub async fn handle(
        &self,
        upstream: &UpstreamConfig,
        ctx: &RequestContext,
    ) -> Result<Outcome, ProxyError> {
        if upstream.url.is_empty() {
            return Err(ProxyError::Configuration(
                "You must configure an upstream gitweb URL (upstream.url)".to_string(),
            ));
        }

        let url = format!("{}?{}", upstream.url, ctx.raw_query());
        let page = self.fetch(&url, upstream).await?;

        match ctx.args().action() {
            Some("blob_plain") => {
                let mime = blob_mime_type(upstream.send_mime_override, ctx.args().get("f"));
                return Ok(Outcome::Raw {
                    body: page.body,
                    content_type: mime.to_string(),
                });
            }
            Some(action) if FEED_ACTIONS.contains(&action) => {
                return Ok(Outcome::Raw {
                    body: page.body,
                    content_type: page.content_type,
                });
            }
            _ => {}
        }

        let (text, content_type) = decode_page(&page);
        let text = self.rules.rewrite(text, ctx)?;

        if !ctx.chrome_enabled() {
            return Ok(Outcome::Raw {
                body: Bytes::from(text),
                content_type,
            });
        }

        let stylesheets = SHELL_STYLESHEETS
            .iter()
            .map(|name| {
                ctx.href()
                    .chrome(CHROME_PREFIX, name)
                    .map_err(|source| ProxyError::Replacement {
                        rule: "shell-stylesheets",
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Outcome::Template {
            template: PAGE_TEMPLATE,
            data: json!({
                "title": "Browse Source",
                "gitweb_page": text,
                "content_type": content_type,
            }),
            content_type,
            stylesheets,
        })
    }

    async fn fetch(
        &self,
        url: &str,
        upstream: &UpstreamConfig,
    ) -> Result<UpstreamResponse, ProxyError> {
        let res = self
            .client
            .get(url)
            .timeout(upstream.timeout())
            .send()
            .await?
            .error_for_status()?;

        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(DEFAULT_BLOB_MIME)
            .to_string();

        let body = res.bytes().await?;

        Ok(UpstreamResponse { body, content_type })
    }
}

/// Decodes the page with the charset named in its content type, falling back to UTF-8.
/// Undecodable bytes become U+FFFD. The returned content type names the UTF-8 result.
pub fn decode_page(page: &UpstreamResponse) -> (String, String) {
    let (essence, charset) = split_content_type(&page.content_type);

    let encoding = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(&page.body);

    (text.into_owned(), format!("{essence}; charset=utf-8"))
}

fn split_content_type(content_type: &str) -> (&str, Option<&str>) {
    let mut params = content_type.split(';');
    let essence = params.next().unwrap_or("").trim();

    let charset = params.find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    });

    (essence, charset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &[u8], content_type: &str) -> UpstreamResponse {
        UpstreamResponse {
            body: Bytes::copy_from_slice(body),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn only_browser_paths_match() {
        assert!(ProxyRewriter::matches("/browser"));
        assert!(ProxyRewriter::matches("/browser/anything"));
        assert!(!ProxyRewriter::matches("/prefs/gitweb"));
        assert!(!ProxyRewriter::matches("/"));
    }

    #[test]
    fn content_type_parameters() {
        assert_eq!(
            split_content_type("text/html; charset=\"ISO-8859-1\""),
            ("text/html", Some("ISO-8859-1"))
        );
        assert_eq!(split_content_type("text/html"), ("text/html", None));
        assert_eq!(
            split_content_type("application/xhtml+xml;q=1;Charset=utf-8"),
            ("application/xhtml+xml", Some("utf-8"))
        );
    }

    #[test]
    fn declared_charset_is_honoured() {
        let (text, content_type) = decode_page(&page(b"caf\xe9", "text/html; charset=iso-8859-1"));
        assert_eq!(text, "caf\u{e9}");
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[test]
    fn undecodable_bytes_degrade_instead_of_failing() {
        let (text, content_type) = decode_page(&page(b"ok \xff\xfe done", "text/html"));
        assert!(text.starts_with("ok "));
        assert!(text.ends_with(" done"));
        assert!(text.contains('\u{fffd}'));
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[test]
    fn unknown_charset_falls_back_to_utf8() {
        let (text, _) = decode_page(&page("größe".as_bytes(), "text/html; charset=bogus"));
        assert_eq!(text, "größe");
    }

    #[tokio::test]
    async fn missing_url_fails_before_fetching() {
        let rewriter = ProxyRewriter::new(
            reqwest::Client::new(),
            Arc::new(RuleChain::default_chain()),
        );
        let ctx = RequestContext::new("a=summary", false, crate::host::href::Href::new(""));

        let err = rewriter
            .handle(&UpstreamConfig::default(), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Configuration(_)));
    }
}
