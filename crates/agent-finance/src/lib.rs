//! Analysis coordination for agent-rs
//!
//! This crate fans named analysis sub-tasks out to LLM-backed analysts and
//! reduces their answers into a consensus verdict:
//!
//! - **Coordinator**: routes each sub-task kind once, caches the analyst, and
//!   runs the batch through a bounded worker pool
//! - **Worker pool**: semaphore-bounded `JoinSet` with per-item failure,
//!   timeout, and cancellation handling
//! - **Aggregator**: one-line digest plus BUY/SELL/HOLD consensus
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_finance::{CoordinatorConfig, HandlerRegistry, StockAnalysisOptions, TaskCoordinator};
//! use agent_llm::Router;
//! use std::sync::Arc;
//!
//! let coordinator = TaskCoordinator::new(
//!     Arc::new(Router::from_env()),
//!     HandlerRegistry::finance(my_factory),
//!     CoordinatorConfig::default().with_env()?,
//! )?;
//!
//! let analysis = coordinator
//!     .analyze_stock_comprehensive("AAPL", StockAnalysisOptions::default())
//!     .await?;
//! println!("{}", analysis.summary);
//! println!("{}", analysis.consensus);
//! ```

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod pool;
pub mod result;
pub mod task;

// Re-export main types
pub use aggregator::{Breakdown, ConsensusVerdict, Recommendation, consensus, summarize};
pub use cache::{AgentCache, AgentKey, CachedAnalyst};
pub use config::CoordinatorConfig;
pub use coordinator::TaskCoordinator;
pub use error::{FinanceError, Result};
pub use handlers::{AnalystFactory, FnFactory, Handler, HandlerRegistry, factory_fn};
pub use pool::WorkerPool;
pub use result::{
    AggregatedAnalysis, AnalysisOutput, AssetComparison, AssetOutcome, BatchAnalysis,
    SubTaskFailure, SubTaskResult,
};
pub use task::{AssetType, CryptoAnalysisOptions, StockAnalysisOptions, SubTask, kinds};
