//! The gitweb rewrite chain.
//!
//! Rules run in table order, each on the output of the previous one. The first five always
//! run and cut the page down to a fragment whose links stay under the browser mount. The last
//! two only run when the page is wrapped in the site chrome and point the logo and
//! stylesheets at assets served by this application.

use regex::{NoExpand, Regex, RegexBuilder};

use crate::{
    error::ProxyError,
    host::{assets::CHROME_PREFIX, href::HrefError},
    rewriting::rewriter::{RequestContext, Rewriter},
};

pub type DynamicReplacement = fn(&RequestContext) -> Result<String, HrefError>;

#[derive(Clone)]
pub enum Replacement {
    /// Substituted with `$n` group expansion.
    Literal(&'static str),
    /// Resolved once per request, then substituted verbatim.
    Dynamic(DynamicReplacement),
}

#[derive(Clone)]
pub struct RewriteRule {
    name: &'static str,
    pattern: Regex,
    replacement: Replacement,
    always_apply: bool,
}

impl RewriteRule {
    /// Compiles `pattern` case-insensitively with `.` matching newlines.
    pub fn new(
        name: &'static str,
        pattern: &str,
        replacement: Replacement,
        always_apply: bool,
    ) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()?;

        Ok(Self {
            name,
            pattern,
            replacement,
            always_apply,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn always_apply(&self) -> bool {
        self.always_apply
    }

    fn apply(&self, page: &str, ctx: &RequestContext) -> Result<String, ProxyError> {
        let rewritten = match &self.replacement {
            Replacement::Literal(replacement) => {
                self.pattern.replace_all(page, *replacement).into_owned()
            }
            Replacement::Dynamic(resolve) => {
                let replacement = resolve(ctx).map_err(|source| ProxyError::Replacement {
                    rule: self.name,
                    source,
                })?;
                self.pattern
                    .replace_all(page, NoExpand(&replacement))
                    .into_owned()
            }
        };

        Ok(rewritten)
    }
}

const UPSTREAM_LOGO_TAG: &str =
    r#"<img src="git-logo.png" width="72" height="27" alt="git" class="logo"/>"#;

const UPSTREAM_STYLESHEET_TAG: &str =
    r#"<link rel="stylesheet" type="text/css" href="/pub/gitweb.css"/>"#;

fn chrome_logo(ctx: &RequestContext) -> Result<String, HrefError> {
    Ok(format!(
        r#"<img src="{}" width="72" height="27" alt="git" class="git-logo"/>"#,
        ctx.href().chrome(CHROME_PREFIX, "git-logo.png")?
    ))
}

fn chrome_stylesheets(ctx: &RequestContext) -> Result<String, HrefError> {
    let href = ctx.href();
    Ok(format!(
        "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>\n\
         <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>",
        href.chrome(CHROME_PREFIX, "gitweb-full.css")?,
        href.chrome(CHROME_PREFIX, "gitweb-trac.css")?
    ))
}

/// Ordered, immutable rule table. Built once and shared by every request.
#[derive(Clone)]
pub struct RuleChain {
    rules: Vec<RewriteRule>,
}

impl RuleChain {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// The gitweb rule table.
    ///
    /// # Panics
    ///
    /// Panics if one of the built-in patterns fails to compile, which cannot happen for the
    /// fixed table below.
    pub fn default_chain() -> Self {
        let table: [(&'static str, String, Replacement, bool); 7] = [
            (
                "strip-head",
                r"^.*?<div class".to_string(),
                Replacement::Literal("<div class"),
                true,
            ),
            (
                "strip-tail",
                r"</body.*".to_string(),
                Replacement::Literal(""),
                true,
            ),
            (
                "logo-asset",
                r"git\?{1,}a=git-logo.png".to_string(),
                Replacement::Literal("www/images/git.png"),
                true,
            ),
            (
                "relative-links",
                r#"['"]/git\?{0,}([^'"]*)"#.to_string(),
                Replacement::Literal(r#""?${1}"#),
                true,
            ),
            (
                "rss-links",
                r"git\.do\?(\S+)?;a=rss".to_string(),
                Replacement::Literal("git?${1};a=rss"),
                true,
            ),
            (
                "chrome-logo",
                regex::escape(UPSTREAM_LOGO_TAG),
                Replacement::Dynamic(chrome_logo),
                false,
            ),
            (
                "chrome-stylesheets",
                regex::escape(UPSTREAM_STYLESHEET_TAG),
                Replacement::Dynamic(chrome_stylesheets),
                false,
            ),
        ];

        let rules = table
            .into_iter()
            .map(|(name, pattern, replacement, always_apply)| {
                RewriteRule::new(name, &pattern, replacement, always_apply)
                    .expect("built-in rewrite pattern must compile")
            })
            .collect();

        Self::new(rules)
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }
}

impl Rewriter for RuleChain {
    fn rewrite(&self, page: String, ctx: &RequestContext) -> Result<String, ProxyError> {
        let mut page = page;

        for rule in self
            .rules
            .iter()
            .filter(|rule| ctx.chrome_enabled() || rule.always_apply)
        {
            page = rule.apply(&page, ctx)?;
        }

        Ok(page)
    }
}
