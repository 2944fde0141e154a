//! xcom-gallery - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use xcom_gallery::{
    cli::{load_page, tweet_target, Args, Target},
    config::{validate_config, Config, ExtractionMode},
    download::{BulkOptions, DownloadResult, DownloadStatus},
    error::{exit_codes, Error, Result},
    extraction::{ExtractionOptions, ExtractionResult},
    output::{
        create_spinner, print_banner, print_config_summary, print_download_result, print_error,
        print_extraction_summary, print_info, print_media_list, print_warning,
        spawn_progress_listener,
    },
    Services,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Authentication(_) | Error::Api(_) | Error::RateLimited(_) => {
                    ExitCode::from(exit_codes::API_ERROR as u8)
                }
                Error::Extraction(_) | Error::TweetInfo(_) | Error::Dom(_) => {
                    ExitCode::from(exit_codes::EXTRACTION_ERROR as u8)
                }
                Error::Download(_) | Error::NoCapability | Error::Packaging(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                Error::Cancelled => ExitCode::from(exit_codes::ABORT as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();
    let chatty = !args.quiet && !args.json;

    // Set up logging
    let log_level = if args.debug {
        "debug"
    } else if chatty {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    if chatty {
        print_banner();
    }

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        if chatty {
            print_warning(&format!(
                "Configuration file not found: {}",
                args.config.display()
            ));
            print_info("Using default configuration with CLI arguments");
        }
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Validate configuration
    validate_config(&config)?;

    // Resolve what was "clicked"
    let (source, target) = match (&args.page, &args.tweet) {
        (Some(page), _) => (
            page.display().to_string(),
            load_page(page, args.click.as_deref())?,
        ),
        (None, Some(tweet)) => (tweet.clone(), tweet_target(tweet)?),
        (None, None) => return Err(Error::MissingConfig("--page or --tweet".into())),
    };
    if chatty {
        print_config_summary(
            &source,
            &config.options.extraction_mode.to_string(),
            &config.download_directory().display().to_string(),
            config.options.zip_enabled,
        );
    }

    let mode = config.options.extraction_mode;
    let services = Services::builder(config).build()?;

    let result = extract(&services, &target, mode, chatty).await;
    if !result.success {
        let reasons: Vec<String> = result.errors.iter().map(|e| e.to_string()).collect();
        return Err(Error::Extraction(if reasons.is_empty() {
            "no media found".to_string()
        } else {
            reasons.join("; ")
        }));
    }

    if args.json && args.list {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if chatty {
        let metrics = services.extraction.last_metrics().await;
        print_extraction_summary(&result, metrics.as_ref());
    }
    if args.list {
        print_media_list(&result.media_items, result.clicked_index);
        return Ok(());
    }

    let progress = chatty.then(|| spawn_progress_listener(&services.events));

    let download = tokio::select! {
        outcome = run_download(&services, &result, &args) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            print_warning("Interrupted, abandoning downloads in flight");
            return Err(Error::Cancelled);
        }
    };

    if let Some(handle) = progress {
        let _ = handle.await;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&download)?);
    } else {
        print_download_result(&download);
    }

    match download.status {
        DownloadStatus::Success | DownloadStatus::Partial => Ok(()),
        DownloadStatus::Error => Err(Error::Download(
            download
                .error
                .unwrap_or_else(|| "download failed".to_string()),
        )),
    }
}

async fn extract(
    services: &Services,
    target: &Target,
    mode: ExtractionMode,
    chatty: bool,
) -> ExtractionResult {
    let spinner = chatty.then(|| create_spinner("Extracting media..."));
    let options = ExtractionOptions::new(mode);

    let result = match target {
        Target::Clicked(element) => {
            services
                .extraction
                .extract_from_clicked_element(element, options)
                .await
        }
        Target::Container(container) => {
            services
                .extraction
                .extract_all_from_container(container, options)
                .await
        }
    };

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    result
}

async fn run_download(
    services: &Services,
    result: &ExtractionResult,
    args: &Args,
) -> Result<DownloadResult> {
    if let [item] = result.media_items.as_slice() {
        return services.downloads.download_single(item).await;
    }

    services
        .downloads
        .download_bulk(
            &result.media_items,
            BulkOptions {
                zip_filename: args.zip_name.clone(),
                zip: args.zip_override(),
            },
        )
        .await
}
