use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::{
    host::{
        perm::Capability,
        session::{MemoryPreferenceStore, PreferenceStore},
        templates::TemplateRenderer,
    },
    proxy::rewriter::ProxyRewriter,
    rewriting::rules::RuleChain,
};

const fn default_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Debug, Serialize, Deserialize)]
/// Where pages are fetched from and how raw blobs are typed.
pub struct UpstreamConfig {
    /// URL of the upstream gitweb script, e.g. `http://git.example.org/gitweb.cgi`
    #[serde(default)]
    pub url: String,
    /// Guess the MIME type of `blob_plain` pages from the file extension instead of always
    /// sending `text/plain`
    #[serde(default)]
    pub send_mime_override: bool,
    /// Upper bound for a single upstream fetch
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            url: String::new(),
            send_mime_override: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChromeConfig {
    /// Serve `/chrome/gitweb/*` from this directory instead of the built-in assets
    #[serde(default)]
    pub htdocs_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Capabilities held by every principal
    pub anonymous: Vec<Capability>,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        PermissionConfig {
            anonymous: vec![Capability::BrowserView],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// The listen address for the host application
    pub host: SocketAddr,
    /// Prefix prepended to every host-relative URL, e.g. `/trac`
    #[serde(default)]
    pub base_path: String,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub chrome: ChromeConfig,
    #[serde(default)]
    pub permissions: PermissionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: SocketAddr::from(([0, 0, 0, 0], 3069)),
            base_path: String::new(),
            upstream: UpstreamConfig::default(),
            chrome: ChromeConfig::default(),
            permissions: PermissionConfig::default(),
        }
    }
}

/// Problems worth reporting at startup. None of them stop the server: the upstream URL is
/// checked again on every request since a reload may fix it.
pub fn validate_config(config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.upstream.url.is_empty() {
        warnings.push("upstream.url is not set; every browser request will fail".to_string());
    } else if !(config.upstream.url.starts_with("http://")
        || config.upstream.url.starts_with("https://"))
    {
        warnings.push(format!(
            "upstream.url `{}` is not an absolute http(s) URL",
            config.upstream.url
        ));
    }

    if config.upstream.timeout_secs == 0 {
        warnings.push("upstream.timeout_secs is 0; every fetch will time out".to_string());
    }

    if config.base_path.ends_with('/') {
        warnings.push(format!(
            "base_path `{}` has a trailing slash which will be ignored",
            config.base_path
        ));
    }

    warnings
}

#[derive(Clone)]
/// The state that is passed to every route
pub struct ProxyState {
    /// Live configuration, swapped on reload
    pub config: Arc<ArcSwap<Config>>,
    pub rewriter: ProxyRewriter,
    pub preferences: Arc<dyn PreferenceStore>,
    pub templates: Arc<TemplateRenderer>,
}

impl ProxyState {
    pub fn new(config: Arc<ArcSwap<Config>>, client: reqwest::Client) -> Self {
        ProxyState {
            config,
            rewriter: ProxyRewriter::new(client, Arc::new(RuleChain::default_chain())),
            preferences: Arc::new(MemoryPreferenceStore::default()),
            templates: Arc::new(TemplateRenderer::new()),
        }
    }

    pub fn with_preferences(mut self, preferences: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = preferences;
        self
    }
}
