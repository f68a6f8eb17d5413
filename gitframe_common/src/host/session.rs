//! Session identity and the per-principal chrome preference.
//!
//! A principal is identified by an opaque cookie value. Browsers without the cookie get a
//! fresh UUID, which is handed back in a `Set-Cookie` header on the next response.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderValue},
    response::Response,
};
use dashmap::DashMap;
use hyper::header::{COOKIE, SET_COOKIE};

pub const SESSION_COOKIE_NAME: &str = "gitframe_session";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Finds the session cookie among all `Cookie` headers.
pub fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| Principal::new(value))
}

pub fn format_set_cookie(name: &str, value: &str) -> String {
    format!("{name}={value}; HttpOnly; SameSite=Lax; Path=/")
}

/// The principal behind a request, and whether its cookie still has to be set.
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    fresh: bool,
}

impl Session {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match principal_from_headers(headers) {
            Some(principal) => Self {
                principal,
                fresh: false,
            },
            None => Self {
                principal: Principal::generate(),
                fresh: true,
            },
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Adds the session cookie to `response` if the browser did not send one.
    pub fn attach(&self, mut response: Response) -> Response {
        if self.fresh {
            let cookie = format_set_cookie(SESSION_COOKIE_NAME, self.principal.as_str());
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        response
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Session::from_headers(&parts.headers))
    }
}

/// Per-principal storage of the "wrap gitweb in the site chrome" toggle.
pub trait PreferenceStore: Send + Sync {
    /// Defaults to `false` for principals that never saved the panel.
    fn chrome_enabled(&self, principal: &Principal) -> bool;

    fn set_chrome_enabled(&self, principal: &Principal, enabled: bool);
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    chrome: DashMap<Principal, bool>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn chrome_enabled(&self, principal: &Principal) -> bool {
        self.chrome
            .get(principal)
            .map(|enabled| *enabled)
            .unwrap_or(false)
    }

    fn set_chrome_enabled(&self, principal: &Principal, enabled: bool) {
        self.chrome.insert(principal.clone(), enabled);
    }
}
