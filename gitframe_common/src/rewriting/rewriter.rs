use crate::{error::ProxyError, host::href::Href, proxy::query::QueryArgs};

/// Everything a rewrite needs to know about the request being served.
#[derive(Debug, Clone)]
pub struct RequestContext {
    raw_query: String,
    args: QueryArgs,
    chrome_enabled: bool,
    href: Href,
}

impl RequestContext {
    pub fn new(raw_query: &str, chrome_enabled: bool, href: Href) -> Self {
        Self {
            raw_query: raw_query.to_string(),
            args: QueryArgs::parse(raw_query),
            chrome_enabled,
            href,
        }
    }

    /// The query string exactly as the browser sent it.
    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    pub fn args(&self) -> &QueryArgs {
        &self.args
    }

    pub fn chrome_enabled(&self) -> bool {
        self.chrome_enabled
    }

    pub fn href(&self) -> &Href {
        &self.href
    }
}

pub trait Rewriter {
    fn rewrite(&self, page: String, ctx: &RequestContext) -> Result<String, ProxyError>;
}
