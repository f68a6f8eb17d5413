use crate::host::{
    href::Href,
    perm::{Capability, PermissionGate},
    session::Principal,
};

/// Name of the navigation entry highlighted while browsing.
pub const ACTIVE_NAVIGATION_ITEM: &str = "gitweb";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    /// Menu the entry belongs to, e.g. `mainnav`
    pub category: &'static str,
    pub name: &'static str,
    pub label: String,
    pub href: String,
}

/// Entries contributed to the host's menus for this principal.
pub fn navigation_items(
    permissions: &dyn PermissionGate,
    principal: &Principal,
    href: &Href,
) -> Vec<NavItem> {
    let mut items = Vec::new();

    if permissions.has(principal, Capability::BrowserView) {
        items.push(NavItem {
            category: "mainnav",
            name: ACTIVE_NAVIGATION_ITEM,
            label: "Browse Source".to_string(),
            href: href.browser(),
        });
    }

    items
}
