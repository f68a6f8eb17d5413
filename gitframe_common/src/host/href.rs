use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HrefError {
    #[error("chrome asset name is empty")]
    EmptyName,
    #[error("chrome asset path `{0}` leaves its asset directory")]
    OutsideChrome(String),
}

/// Builds host-relative URLs under the configured base path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Href {
    base: String,
}

impl Href {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Entry point of the source browser.
    pub fn browser(&self) -> String {
        format!("{}/browser", self.base)
    }

    pub fn prefs(&self, panel: &str) -> String {
        format!("{}/prefs/{}", self.base, panel)
    }

    /// URL of a static asset published under `/chrome/<prefix>/`.
    pub fn chrome(&self, prefix: &str, name: &str) -> Result<String, HrefError> {
        for part in [prefix, name] {
            if part.is_empty() {
                return Err(HrefError::EmptyName);
            }
            if part.starts_with('/') || part.contains('\\') || part.split('/').any(|s| s == "..")
            {
                return Err(HrefError::OutsideChrome(format!("{prefix}/{name}")));
            }
        }

        Ok(format!("{}/chrome/{}/{}", self.base, prefix, name))
    }
}
