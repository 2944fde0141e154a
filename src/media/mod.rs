//! Media module for item representation, URL handling and parsing.

pub mod item;
pub mod parser;
pub mod url;

pub use item::{MediaItem, MediaType, TweetInfo};
pub use parser::{find_clicked_index, parse_media_info, parse_tweet_media};
