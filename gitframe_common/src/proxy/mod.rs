pub mod mime;
pub mod query;
pub mod rewriter;
pub mod service;
