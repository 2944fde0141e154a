//! Filesystem module.
//!
//! Provides:
//! - Filename sanitization and de-duplication
//! - The naming policy for saved media and archives

pub mod naming;

pub use naming::{
    make_unique_filename, make_unique_name, sanitize_filename, sanitize_path_component,
    FilenameResolver, TweetFilenameResolver,
};
