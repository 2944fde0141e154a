//! Extraction strategy trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::extraction::types::{ExtractionContext, ExtractionResult};

/// One way of turning a clicked element into media items.
///
/// Returning `Err` is treated exactly like returning a failed result.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap synchronous check; strategies that decline are skipped.
    fn can_handle(&self, context: &ExtractionContext) -> bool;

    async fn extract(&self, context: &ExtractionContext) -> Result<ExtractionResult>;
}

#[async_trait]
impl<T> ExtractionStrategy for Arc<T>
where
    T: ExtractionStrategy + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn can_handle(&self, context: &ExtractionContext) -> bool {
        (**self).can_handle(context)
    }

    async fn extract(&self, context: &ExtractionContext) -> Result<ExtractionResult> {
        (**self).extract(context).await
    }
}

/// A strategy registered in a chain, with its retry budget.
#[derive(Clone)]
pub struct ChainEntry {
    pub(crate) strategy: Arc<dyn ExtractionStrategy>,
    pub(crate) max_retries: u32,
}

impl ChainEntry {
    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl<S> From<S> for ChainEntry
where
    S: ExtractionStrategy + 'static,
{
    fn from(strategy: S) -> Self {
        Self {
            strategy: Arc::new(strategy),
            max_retries: 0,
        }
    }
}

/// Grant a strategy `max_retries` extra attempts after a failure.
pub fn with_retry<S>(strategy: S, max_retries: u32) -> ChainEntry
where
    S: ExtractionStrategy + 'static,
{
    ChainEntry {
        strategy: Arc::new(strategy),
        max_retries,
    }
}
