//! Ordered strategy chain with parallel groups and per-strategy retries.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::extraction::strategy::ChainEntry;
use crate::extraction::types::{
    ExtractionContext, ExtractionError, ExtractionErrorKind, ExtractionResult, SourceType,
};

/// Wait between retries when no backoff is configured.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Linear backoff: retry `n` waits `base * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
}

impl Backoff {
    pub fn linear(base: Duration) -> Self {
        Self { base }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base * attempt
    }
}

/// Per-run statistics of a chain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StrategyChainMetrics {
    /// Strategies started, in start order.
    pub attempted_strategies: Vec<String>,
    pub success_strategy: Option<String>,
    /// Strategies that finished without media.
    pub failed_strategies: Vec<String>,
    /// Retries performed, by strategy name.
    pub strategy_retries: BTreeMap<String, u32>,
    pub total_duration: Duration,
    /// Members of the winning parallel group.
    pub group_size: Option<usize>,
    /// Time from group start to the winner's result.
    pub winner_latency: Option<Duration>,
    /// Strategies skipped by the duplicate guard.
    pub duplicates_skipped: Vec<String>,
}

impl StrategyChainMetrics {
    pub fn total_retries(&self) -> u32 {
        self.strategy_retries.values().sum()
    }
}

/// Result of running a chain.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub result: ExtractionResult,
    pub metrics: StrategyChainMetrics,
}

enum ChainStep {
    Single(ChainEntry),
    Parallel(Vec<ChainEntry>),
}

/// Fluent builder for a [`StrategyChain`].
#[derive(Default)]
pub struct StrategyChainBuilder {
    steps: Vec<ChainStep>,
    backoff: Option<Backoff>,
    duplicate_guard: bool,
}

impl StrategyChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy tried on its own.
    pub fn add(mut self, entry: impl Into<ChainEntry>) -> Self {
        self.steps.push(ChainStep::Single(entry.into()));
        self
    }

    /// Append a group whose members run concurrently; the first success wins.
    pub fn add_parallel<I, E>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ChainEntry>,
    {
        let group: Vec<ChainEntry> = entries.into_iter().map(Into::into).collect();
        if !group.is_empty() {
            self.steps.push(ChainStep::Parallel(group));
        }
        self
    }

    pub fn set_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Drop strategies whose name was already added to the chain.
    pub fn enable_duplicate_guard(mut self) -> Self {
        self.duplicate_guard = true;
        self
    }

    pub fn build(self) -> StrategyChain {
        if !self.duplicate_guard {
            return StrategyChain {
                steps: self.steps,
                backoff: self.backoff,
                duplicates_skipped: Vec::new(),
            };
        }

        let mut added: HashSet<String> = HashSet::new();
        let mut skipped: Vec<String> = Vec::new();
        let mut keep = |entry: &ChainEntry| {
            if added.insert(entry.name().to_string()) {
                true
            } else {
                debug!(strategy = entry.name(), "Duplicate strategy dropped");
                skipped.push(entry.name().to_string());
                false
            }
        };

        let steps = self
            .steps
            .into_iter()
            .filter_map(|step| match step {
                ChainStep::Single(entry) => keep(&entry).then_some(ChainStep::Single(entry)),
                ChainStep::Parallel(group) => {
                    let group: Vec<ChainEntry> = group.into_iter().filter(|e| keep(e)).collect();
                    (!group.is_empty()).then_some(ChainStep::Parallel(group))
                }
            })
            .collect();

        StrategyChain {
            steps,
            backoff: self.backoff,
            duplicates_skipped: skipped,
        }
    }
}

/// Runs strategies in order until one produces media.
pub struct StrategyChain {
    steps: Vec<ChainStep>,
    backoff: Option<Backoff>,
    duplicates_skipped: Vec<String>,
}

impl StrategyChain {
    pub fn builder() -> StrategyChainBuilder {
        StrategyChainBuilder::new()
    }

    /// Names of all registered strategies, in order.
    pub fn strategy_names(&self) -> Vec<String> {
        self.steps
            .iter()
            .flat_map(|step| match step {
                ChainStep::Single(entry) => vec![entry.name().to_string()],
                ChainStep::Parallel(group) => group.iter().map(|e| e.name().to_string()).collect(),
            })
            .collect()
    }

    /// Run the chain against a context.
    ///
    /// Stops at the first successful strategy. Losers of a parallel group are
    /// dropped as soon as a winner is known; their in-flight work is cancelled.
    pub async fn run(&self, ctx: &ExtractionContext) -> ChainOutcome {
        let started = Instant::now();
        let mut metrics = StrategyChainMetrics {
            duplicates_skipped: self.duplicates_skipped.clone(),
            ..Default::default()
        };
        let mut errors: Vec<ExtractionError> = Vec::new();

        for step in &self.steps {
            match step {
                ChainStep::Single(entry) => {
                    if !admit(entry, ctx, &mut metrics) {
                        continue;
                    }

                    let (result, retries) = self.execute_with_retry(entry, ctx).await;
                    record_retries(&mut metrics, entry.name(), retries);

                    if result.success {
                        return finish(result, entry.name(), metrics, started, ctx);
                    }
                    metrics.failed_strategies.push(entry.name().to_string());
                    errors.extend(result.errors);
                }
                ChainStep::Parallel(group) => {
                    let members: Vec<&ChainEntry> = group
                        .iter()
                        .filter(|entry| admit(entry, ctx, &mut metrics))
                        .collect();
                    if members.is_empty() {
                        continue;
                    }

                    let group_started = Instant::now();
                    let group_size = members.len();
                    let mut pending: FuturesUnordered<_> = members
                        .into_iter()
                        .map(|entry| async move {
                            let (result, retries) = self.execute_with_retry(entry, ctx).await;
                            (entry, result, retries)
                        })
                        .collect();

                    while let Some((entry, result, retries)) = pending.next().await {
                        record_retries(&mut metrics, entry.name(), retries);

                        if result.success {
                            drop(pending);
                            metrics.group_size = Some(group_size);
                            metrics.winner_latency = Some(group_started.elapsed());
                            return finish(result, entry.name(), metrics, started, ctx);
                        }
                        metrics.failed_strategies.push(entry.name().to_string());
                        errors.extend(result.errors);
                    }
                }
            }
        }

        if errors.is_empty() {
            errors.push(ExtractionError::new(
                ExtractionErrorKind::NoStrategy,
                "no strategy could handle the clicked element",
            ));
        }

        metrics.total_duration = started.elapsed();
        warn!(
            correlation_id = %ctx.correlation_id,
            attempted = metrics.attempted_strategies.len(),
            "All extraction strategies failed"
        );

        let mut result = ExtractionResult::failed(SourceType::ChainExhausted, errors);
        result.metadata.attempts = metrics.attempted_strategies.len() as u32;
        result.metadata.retries = metrics.total_retries();
        ChainOutcome { result, metrics }
    }

    /// Run one strategy, retrying failures up to its budget.
    ///
    /// Returns the last result and the number of retries performed.
    async fn execute_with_retry(
        &self,
        entry: &ChainEntry,
        ctx: &ExtractionContext,
    ) -> (ExtractionResult, u32) {
        let name = entry.name();
        let mut retries = 0;

        loop {
            let mut result = match entry.strategy.extract(ctx).await {
                Ok(result) => result,
                Err(e) => {
                    debug!(strategy = name, error = %e, "Strategy returned an error");
                    ExtractionResult::failed(
                        SourceType::Custom(name.to_string()),
                        vec![ExtractionError::from_strategy(name, &e)],
                    )
                }
            };

            // A result only counts when it carries media and no errors.
            result.refresh_success();
            if !result.success && result.errors.is_empty() {
                result.errors.push(ExtractionError::no_media(name));
            }

            if result.success || retries >= entry.max_retries {
                return (result, retries);
            }

            retries += 1;
            let delay = self.retry_delay(retries);
            debug!(strategy = name, retry = retries, ?delay, "Retrying strategy");
            tokio::time::sleep(delay).await;
        }
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        match self.backoff {
            Some(backoff) => backoff.delay_for(attempt),
            None => DEFAULT_RETRY_DELAY,
        }
    }
}

/// Decide whether an entry runs, recording it as attempted when it does.
fn admit(entry: &ChainEntry, ctx: &ExtractionContext, metrics: &mut StrategyChainMetrics) -> bool {
    if !entry.strategy.can_handle(ctx) {
        debug!(strategy = entry.name(), "Strategy cannot handle context");
        return false;
    }

    metrics.attempted_strategies.push(entry.name().to_string());
    true
}

fn record_retries(metrics: &mut StrategyChainMetrics, name: &str, retries: u32) {
    if retries > 0 {
        *metrics.strategy_retries.entry(name.to_string()).or_insert(0) += retries;
    }
}

fn finish(
    mut result: ExtractionResult,
    winner: &str,
    mut metrics: StrategyChainMetrics,
    started: Instant,
    ctx: &ExtractionContext,
) -> ChainOutcome {
    metrics.success_strategy = Some(winner.to_string());
    metrics.total_duration = started.elapsed();

    result.metadata.strategy = Some(winner.to_string());
    result.metadata.attempts = metrics.attempted_strategies.len() as u32;
    result.metadata.retries = metrics.total_retries();

    info!(
        correlation_id = %ctx.correlation_id,
        strategy = winner,
        media = result.media_items.len(),
        elapsed_ms = metrics.total_duration.as_millis() as u64,
        "Extraction strategy succeeded"
    );

    ChainOutcome { result, metrics }
}
