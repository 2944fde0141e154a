//! Built-in extraction strategies.

pub mod api;
pub mod dom;

pub use api::{ApiStrategy, API_STRATEGY_NAME};
pub use dom::{scan_container, DomScanStrategy, DOM_STRATEGY_NAME};
