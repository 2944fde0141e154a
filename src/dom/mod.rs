//! DOM snapshot module.
//!
//! Provides:
//! - An owned, shareable element tree parsed from page HTML
//! - Predicates for locating tweets and their media

pub mod selectors;
pub mod tree;

pub use tree::{DomTree, Element, NodeId};
