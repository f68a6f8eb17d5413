use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{error::ProxyError, host::session::Principal, state::PermissionConfig};

/// Permission strings declared by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "BROWSER_VIEW")]
    BrowserView,
}

impl Capability {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Capability::BrowserView => "BROWSER_VIEW",
        }
    }

    /// Every permission action this application declares.
    pub fn all() -> &'static [Capability] {
        &[Capability::BrowserView]
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait PermissionGate: Send + Sync {
    fn has(&self, principal: &Principal, capability: Capability) -> bool;

    fn require(&self, principal: &Principal, capability: Capability) -> Result<(), ProxyError> {
        if self.has(principal, capability) {
            Ok(())
        } else {
            Err(ProxyError::Forbidden(capability))
        }
    }
}

/// Grants the same capabilities to every principal, as listed in `permissions.anonymous`.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredPermissions {
    granted: HashSet<Capability>,
}

impl ConfiguredPermissions {
    pub fn from_config(config: &PermissionConfig) -> Self {
        Self {
            granted: config.anonymous.iter().copied().collect(),
        }
    }
}

impl PermissionGate for ConfiguredPermissions {
    fn has(&self, _principal: &Principal, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_permissions() {
        let names: Vec<_> = Capability::all().iter().map(Capability::as_str).collect();
        assert_eq!(names, vec!["BROWSER_VIEW"]);
        assert_eq!(Capability::BrowserView.to_string(), "BROWSER_VIEW");
    }

    #[test]
    fn capability_round_trips_through_its_permission_string() {
        let json = serde_json::to_string(&Capability::BrowserView).unwrap();
        assert_eq!(json, "\"BROWSER_VIEW\"");
        let parsed: Capability = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Capability::BrowserView);
    }

    #[test]
    fn configured_permissions_gate_access() {
        let principal = Principal::new("abc");
        let open = ConfiguredPermissions::from_config(&PermissionConfig::default());
        assert!(open.has(&principal, Capability::BrowserView));
        assert!(open.require(&principal, Capability::BrowserView).is_ok());

        let closed = ConfiguredPermissions::from_config(&PermissionConfig { anonymous: vec![] });
        assert!(matches!(
            closed.require(&principal, Capability::BrowserView),
            Err(ProxyError::Forbidden(Capability::BrowserView))
        ));
    }
}
