/// State management module
///
/// This module handles all browsing state, including:
/// - Shared data structures (data.rs)
/// - Facet selections, options and their dependency graph (filters.rs)
/// - Deriving the displayed photo list (resolver.rs)
/// - "More like this" exploration and snapshot/restore (similarity.rs)
/// - The session tying them together (gallery.rs)

pub mod data;
pub mod filters;
pub mod gallery;
pub mod resolver;
pub mod similarity;
