//! Command line interface.

pub mod args;
pub mod source;

pub use args::{Args, ModeArg};
pub use source::{load_page, target_from_html, tweet_target, Target};
