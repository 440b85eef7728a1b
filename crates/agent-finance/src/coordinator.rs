//! Task coordinator: routing, agent caching, concurrent execution, aggregation
//!
//! A batch of named sub-tasks is executed through the worker pool. For each
//! sub-task the coordinator resolves the handler for its kind, obtains the
//! analyst from the per-instance cache (routing on first use), and calls it.
//! Failures are recorded per sub-task and never abort the batch.

use crate::aggregator::{consensus, summarize};
use crate::cache::{AgentCache, AgentKey, CachedAnalyst};
use crate::config::CoordinatorConfig;
use crate::error::{FinanceError, Result};
use crate::handlers::HandlerRegistry;
use crate::pool::WorkerPool;
use crate::result::{
    AggregatedAnalysis, AnalysisOutput, AssetComparison, AssetOutcome, BatchAnalysis,
    SubTaskResult,
};
use crate::task::{AssetType, CryptoAnalysisOptions, StockAnalysisOptions, SubTask, kinds};
use agent_llm::Router;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Coordinates analysis sub-tasks across LLM-backed analysts
///
/// Cloning is cheap and clones share the agent cache.
#[derive(Debug, Clone)]
pub struct TaskCoordinator {
    router: Arc<Router>,
    handlers: Arc<HandlerRegistry>,
    cache: Arc<AgentCache>,
    config: Arc<CoordinatorConfig>,
}

impl TaskCoordinator {
    /// Create a new coordinator
    pub fn new(
        router: Arc<Router>,
        handlers: HandlerRegistry,
        config: CoordinatorConfig,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            kinds = ?handlers.kinds(),
            max_concurrency = config.effective_concurrency(),
            "Task coordinator initialized"
        );

        Ok(Self {
            router,
            handlers: Arc::new(handlers),
            cache: Arc::new(AgentCache::new()),
            config: Arc::new(config),
        })
    }

    /// The router used for provider selection
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Registered handlers
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Active configuration
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Analysts built so far
    pub fn cache(&self) -> &AgentCache {
        &self.cache
    }

    fn pool(&self) -> WorkerPool {
        WorkerPool::new(self.config.effective_concurrency())
            .with_task_timeout(self.config.task_timeout)
            .with_batch_timeout(self.config.batch_timeout)
    }

    /// Outer pool for batch-of-batches
    ///
    /// Carries no timeouts of its own: the configured budgets apply to the
    /// sub-tasks inside each asset's batch, so finished sub-tasks are kept.
    fn asset_pool(&self) -> WorkerPool {
        WorkerPool::new(self.config.effective_concurrency())
    }

    /// Run a batch of sub-tasks and wait for every one to settle
    pub async fn run_batch(
        &self,
        subtasks: Vec<SubTask>,
    ) -> Result<BTreeMap<String, SubTaskResult>> {
        self.run_batch_with_cancel(subtasks, &CancellationToken::new()).await
    }

    /// Run a batch that stops early when `cancel` fires
    ///
    /// Items still pending at cancellation settle as failures.
    pub async fn run_batch_with_cancel(
        &self,
        subtasks: Vec<SubTask>,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, SubTaskResult>> {
        info!(count = subtasks.len(), "Starting sub-task batch");

        let items: Vec<_> = subtasks.into_iter().map(|task| (task.name.clone(), task)).collect();
        let this = self.clone();
        let outcomes = self
            .pool()
            .run(
                items,
                move |task: SubTask| {
                    let this = this.clone();
                    async move { this.execute(task).await }
                },
                cancel,
            )
            .await?;

        let results: BTreeMap<_, _> = outcomes
            .into_iter()
            .map(|(name, outcome)| {
                let result = match outcome {
                    Ok(output) => SubTaskResult::Success(output),
                    Err(err) => {
                        warn!(%name, error = %err, "Sub-task failed");
                        SubTaskResult::failure(name.clone(), failure_message(err))
                    }
                };
                (name, result)
            })
            .collect();

        let succeeded = results.values().filter(|r| r.is_success()).count();
        info!(succeeded, failed = results.len() - succeeded, "Sub-task batch finished");

        Ok(results)
    }

    async fn execute(&self, task: SubTask) -> Result<AnalysisOutput> {
        let handler = self
            .handlers
            .get(&task.kind)
            .ok_or_else(|| FinanceError::UnknownSubTaskType(task.kind.clone()))?;
        let tier = task.tier.unwrap_or(handler.tier);
        let key = AgentKey::new(task.kind.as_str(), tier);

        let cached = self
            .cache
            .get_or_try_init(&key, || async {
                let preferred = self.config.preferred_selection();
                let selection =
                    self.router
                        .select_provider(tier, self.config.cost_ceiling, preferred.as_ref())?;
                debug!(%key, %selection, "Building analyst");

                let analyst = handler
                    .factory
                    .create(&task.kind, &selection)
                    .await
                    .map_err(|e| FinanceError::SubTaskExecution {
                        name: task.name.clone(),
                        message: e.to_string(),
                    })?;
                Ok::<_, FinanceError>(CachedAnalyst { selection, analyst })
            })
            .await?;

        let report = cached
            .analyst
            .analyze(&task.asset, &task.args)
            .await
            .map_err(|e| FinanceError::SubTaskExecution {
                name: task.name.clone(),
                message: e.to_string(),
            })?;

        Ok(AnalysisOutput {
            analysis: report.analysis,
            data: report.data,
            provider: cached.selection.provider,
            model: cached.selection.model,
            timestamp: Utc::now(),
        })
    }

    /// Run one asset's sub-tasks and aggregate them
    pub async fn analyze_subtasks(
        &self,
        primary_key: &str,
        asset_type: AssetType,
        subtasks: Vec<SubTask>,
        cancel: &CancellationToken,
    ) -> Result<AggregatedAnalysis> {
        let analyses = self.run_batch_with_cancel(subtasks, cancel).await?;

        Ok(AggregatedAnalysis {
            primary_key: primary_key.to_string(),
            asset_type,
            timestamp: Utc::now(),
            summary: summarize(&analyses),
            consensus: consensus(&analyses),
            analyses,
        })
    }

    /// Fundamental, technical, and full stock analysis of one ticker
    pub async fn analyze_stock_comprehensive(
        &self,
        ticker: &str,
        options: StockAnalysisOptions,
    ) -> Result<AggregatedAnalysis> {
        info!(ticker, ?options, "Starting comprehensive stock analysis");
        self.analyze_subtasks(
            ticker,
            AssetType::Stock,
            options.subtasks(ticker),
            &CancellationToken::new(),
        )
        .await
    }

    /// Crypto and technical analysis of one symbol
    pub async fn analyze_crypto_comprehensive(
        &self,
        symbol: &str,
        options: CryptoAnalysisOptions,
    ) -> Result<AggregatedAnalysis> {
        info!(symbol, ?options, "Starting comprehensive crypto analysis");
        self.analyze_subtasks(
            symbol,
            AssetType::Crypto,
            options.subtasks(symbol),
            &CancellationToken::new(),
        )
        .await
    }

    /// Run the single-asset pipeline for every asset through the pool
    ///
    /// Each asset settles independently; a failed asset becomes an error
    /// entry. Timeouts and cancellation settle individual sub-tasks inside the
    /// asset's aggregate. Duplicate assets are rejected.
    pub async fn run_batch_of_batches<B>(
        &self,
        assets: Vec<String>,
        asset_type: AssetType,
        builder: B,
        cancel: &CancellationToken,
    ) -> Result<BatchAnalysis>
    where
        B: Fn(&str) -> Vec<SubTask> + Send + Sync + 'static,
    {
        let total_analyzed = assets.len();
        info!(total_analyzed, %asset_type, "Starting batch analysis");

        let items: Vec<_> = assets.into_iter().map(|asset| (asset.clone(), asset)).collect();
        let this = self.clone();
        let builder = Arc::new(builder);
        let inner_cancel = cancel.clone();

        let outcomes = self
            .asset_pool()
            .run(
                items,
                move |asset: String| {
                    let this = this.clone();
                    let builder = Arc::clone(&builder);
                    let cancel = inner_cancel.clone();
                    async move {
                        let subtasks = (*builder)(&asset);
                        this.analyze_subtasks(&asset, asset_type, subtasks, &cancel).await
                    }
                },
                cancel,
            )
            .await?;

        let results = outcomes
            .into_iter()
            .map(|(asset, outcome)| {
                let outcome = match outcome {
                    Ok(analysis) => AssetOutcome::Analysis(Box::new(analysis)),
                    Err(err) => {
                        warn!(%asset, error = %err, "Asset analysis failed");
                        AssetOutcome::Error {
                            error: err.to_string(),
                        }
                    }
                };
                (asset, outcome)
            })
            .collect();

        Ok(BatchAnalysis {
            batch: true,
            asset_type,
            total_analyzed,
            results,
            timestamp: Utc::now(),
        })
    }

    /// Comprehensive analysis of several assets with default options
    pub async fn batch_analyze(
        &self,
        assets: Vec<String>,
        asset_type: AssetType,
    ) -> Result<BatchAnalysis> {
        let builder = move |asset: &str| match asset_type {
            AssetType::Stock => StockAnalysisOptions::default().subtasks(asset),
            AssetType::Crypto => CryptoAnalysisOptions::default().subtasks(asset),
        };
        self.run_batch_of_batches(assets, asset_type, builder, &CancellationToken::new())
            .await
    }

    /// Compare assets with one sub-task per asset
    ///
    /// Stocks are compared on fundamentals, crypto through the crypto analyst.
    pub async fn compare_assets(
        &self,
        assets: Vec<String>,
        asset_type: AssetType,
    ) -> Result<AssetComparison> {
        let kind = match asset_type {
            AssetType::Stock => kinds::FUNDAMENTAL,
            AssetType::Crypto => kinds::CRYPTO_ANALYST,
        };
        info!(?assets, %asset_type, "Starting asset comparison");

        let subtasks = assets
            .iter()
            .map(|asset| SubTask::new(kind, asset.as_str()).named(asset.as_str()))
            .collect();
        let results = self.run_batch(subtasks).await?;

        Ok(AssetComparison {
            comparison_type: asset_type,
            assets,
            consensus: consensus(&results),
            results,
            timestamp: Utc::now(),
        })
    }
}

fn failure_message(err: FinanceError) -> String {
    match err {
        FinanceError::SubTaskExecution { message, .. } => message,
        other => other.to_string(),
    }
}
