//! Service container wiring the pipeline together.

use std::sync::Arc;

use crate::api::{TweetMediaSource, TwitterApi};
use crate::config::Config;
use crate::download::{DownloadOrchestrator, HostEnvironment, LocalHost, OrchestratorSettings};
use crate::error::Result;
use crate::events::EventBus;
use crate::extraction::{
    with_retry, ApiStrategy, Backoff, DomScanStrategy, DomTweetInfoExtractor,
    MediaExtractionService, StrategyChain, TweetInfoExtractor,
};
use crate::fs::{FilenameResolver, TweetFilenameResolver};

/// The API first (with retries), then a scan of the tweet's DOM.
pub fn default_chain(source: Arc<dyn TweetMediaSource>, config: &Config) -> StrategyChain {
    StrategyChain::builder()
        .add(with_retry(
            ApiStrategy::new(source, config.api_timeout()),
            config.options.strategy_retries,
        ))
        .add(DomScanStrategy::new())
        .set_backoff(Backoff::linear(config.backoff_base()))
        .build()
}

/// Long-lived pipeline components sharing one config and event bus.
pub struct Services {
    pub config: Arc<Config>,
    pub events: EventBus,
    pub extraction: MediaExtractionService,
    pub downloads: DownloadOrchestrator,
}

impl Services {
    pub fn builder(config: Config) -> ServicesBuilder {
        ServicesBuilder::new(config)
    }
}

/// Builder for [`Services`]. Anything not supplied gets the production default.
pub struct ServicesBuilder {
    config: Config,
    host: Option<Arc<dyn HostEnvironment>>,
    media_source: Option<Arc<dyn TweetMediaSource>>,
    tweet_info: Option<Arc<dyn TweetInfoExtractor>>,
    filename_resolver: Option<Arc<dyn FilenameResolver>>,
    events: Option<EventBus>,
    chain: Option<StrategyChain>,
}

impl ServicesBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            host: None,
            media_source: None,
            tweet_info: None,
            filename_resolver: None,
            events: None,
            chain: None,
        }
    }

    pub fn host(mut self, host: Arc<dyn HostEnvironment>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn media_source(mut self, source: Arc<dyn TweetMediaSource>) -> Self {
        self.media_source = Some(source);
        self
    }

    pub fn tweet_info(mut self, extractor: Arc<dyn TweetInfoExtractor>) -> Self {
        self.tweet_info = Some(extractor);
        self
    }

    pub fn filename_resolver(mut self, resolver: Arc<dyn FilenameResolver>) -> Self {
        self.filename_resolver = Some(resolver);
        self
    }

    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Replace the default strategy chain entirely.
    pub fn chain(mut self, chain: StrategyChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn build(self) -> Result<Services> {
        let config = self.config;
        let events = self.events.unwrap_or_default();

        let host: Arc<dyn HostEnvironment> = match self.host {
            Some(host) => host,
            None => Arc::new(LocalHost::new(&config)?),
        };

        let chain = match self.chain {
            Some(chain) => chain,
            None => {
                let source: Arc<dyn TweetMediaSource> = match self.media_source {
                    Some(source) => source,
                    None => Arc::new(TwitterApi::from_config(&config)?),
                };
                default_chain(source, &config)
            }
        };

        let tweet_info = self
            .tweet_info
            .unwrap_or_else(|| Arc::new(DomTweetInfoExtractor::new()) as Arc<dyn TweetInfoExtractor>);
        let resolver = self.filename_resolver.unwrap_or_else(|| {
            Arc::new(TweetFilenameResolver::new(
                config.options.filename_prefix.clone(),
            )) as Arc<dyn FilenameResolver>
        });

        tracing::debug!("Strategy chain: {}", chain.strategy_names().join(" -> "));

        let extraction = MediaExtractionService::new(tweet_info, chain, events.clone());
        let downloads = DownloadOrchestrator::new(
            host,
            resolver,
            events.clone(),
            OrchestratorSettings::from_config(&config),
        );

        Ok(Services {
            config: Arc::new(config),
            events,
            extraction,
            downloads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TweetMedia;
    use crate::download::{AnchorDownloader, BlobStore, DownloadMethod, Fetcher, NativeDownloadHook};
    use crate::error::Error;
    use async_trait::async_trait;

    struct NoSource;

    #[async_trait]
    impl TweetMediaSource for NoSource {
        async fn fetch_tweet_media(&self, tweet_id: &str) -> Result<TweetMedia> {
            Err(Error::Api(format!("offline: {}", tweet_id)))
        }
    }

    struct AnchorOnly;

    #[async_trait]
    impl AnchorDownloader for AnchorOnly {
        async fn click(&self, _href: &str, _filename: &str) -> Result<()> {
            Ok(())
        }
    }

    impl HostEnvironment for AnchorOnly {
        fn native_download_hook(&self) -> Option<Arc<dyn NativeDownloadHook>> {
            None
        }
        fn fetcher(&self) -> Option<Arc<dyn Fetcher>> {
            None
        }
        fn blob_store(&self) -> Option<Arc<dyn BlobStore>> {
            None
        }
        fn anchor(&self) -> Arc<dyn AnchorDownloader> {
            Arc::new(AnchorOnly)
        }
    }

    #[test]
    fn test_default_chain_order() {
        let chain = default_chain(Arc::new(NoSource), &Config::default());
        assert_eq!(chain.strategy_names(), vec!["api-first", "dom-scan"]);
    }

    #[test]
    fn test_builder_uses_supplied_collaborators() {
        let events = EventBus::new();
        let _rx = events.subscribe();

        let services = Services::builder(Config::default())
            .host(Arc::new(AnchorOnly))
            .media_source(Arc::new(NoSource))
            .events(events)
            .build()
            .unwrap();

        assert_eq!(services.downloads.capabilities().method, None);
        assert_eq!(services.events.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_builder_defaults_to_local_host() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.options.download_directory = Some(dir.path().to_path_buf());

        let services = Services::builder(config)
            .media_source(Arc::new(NoSource))
            .build()
            .unwrap();

        assert_eq!(
            services.downloads.capabilities().method,
            Some(DownloadMethod::NativeHook)
        );
    }
}
