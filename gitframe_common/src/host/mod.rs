//! Collaborators the browser pipeline borrows from its host application: URL building,
//! permissions, per-principal preferences, navigation, templates and chrome assets.

pub mod assets;
pub mod href;
pub mod nav;
pub mod perm;
pub mod prefs;
pub mod session;
pub mod templates;
