pub mod rewriter;
pub mod rules;
