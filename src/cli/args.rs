//! Command-line argument definitions using clap.

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, ExtractionMode};

/// X/Twitter media gallery extractor and bulk downloader.
#[derive(Parser, Debug)]
#[command(
    name = "xcom-gallery",
    version,
    about = "Extract and download the media of an X/Twitter post",
    long_about = "Extract every photo, video and GIF of a post, either from a saved page \
                  or straight from the tweet API, and download them individually or as a \
                  single ZIP archive.\n\n\
                  Use --page with --click to simulate clicking a media element of a saved \
                  timeline, or --tweet with a status URL or id."
)]
#[command(group(ArgGroup::new("source").required(true).args(["page", "tweet"])))]
pub struct Args {
    /// Saved page HTML to extract from.
    #[arg(short, long)]
    pub page: Option<PathBuf>,

    /// CSS selector of the clicked element inside --page.
    /// Without it the first tweet of the page is used.
    #[arg(long, requires = "page")]
    pub click: Option<String>,

    /// Tweet status URL or numeric id.
    #[arg(short, long)]
    pub tweet: Option<String>,

    /// Extraction mode.
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Directory downloads are saved to.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Value of the auth_token session cookie.
    #[arg(long, env = "XCOM_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Value of the ct0 cookie.
    #[arg(long, env = "XCOM_CSRF_TOKEN", hide_env_values = true)]
    pub csrf_token: Option<String>,

    /// Browser user agent string.
    #[arg(short = 'a', long = "user-agent", env = "XCOM_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Package multiple items into one ZIP archive.
    #[arg(long, overrides_with = "no_zip")]
    pub zip: bool,

    /// Save every item as its own file.
    #[arg(long)]
    pub no_zip: bool,

    /// Name of the ZIP archive.
    #[arg(long)]
    pub zip_name: Option<String>,

    /// Concurrent fetches while building an archive.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Never use the native save hook.
    #[arg(long)]
    pub no_native_hook: bool,

    /// List the extracted media without downloading.
    #[arg(long)]
    pub list: bool,

    /// Print results as JSON.
    #[arg(long)]
    pub json: bool,

    /// Only print errors and the final result.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI extraction mode argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Only the clicked item.
    Single,
    /// Every item of the post.
    All,
}

impl From<ModeArg> for ExtractionMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Single => ExtractionMode::Single,
            ModeArg::All => ExtractionMode::AllFromPost,
        }
    }
}

impl Args {
    /// Per-call ZIP override: `Some` only when a flag was given.
    pub fn zip_override(&self) -> Option<bool> {
        if self.no_zip {
            Some(false)
        } else if self.zip {
            Some(true)
        } else {
            None
        }
    }

    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        // Account
        if let Some(ref token) = self.auth_token {
            config.account.auth_token = Some(token.clone());
        }

        if let Some(ref csrf) = self.csrf_token {
            config.account.csrf_token = Some(csrf.clone());
        }

        if let Some(ref user_agent) = self.user_agent {
            config.account.user_agent = user_agent.clone();
        }

        // Options
        if let Some(ref dir) = self.download_directory {
            config.options.download_directory = Some(dir.clone());
        }

        if let Some(mode) = self.mode {
            config.options.extraction_mode = mode.into();
        }

        if let Some(zip) = self.zip_override() {
            config.options.zip_enabled = zip;
        }

        if let Some(concurrency) = self.concurrency {
            config.options.concurrency = concurrency;
        }

        if self.no_native_hook {
            config.options.native_hook = false;
        }
    }
}
