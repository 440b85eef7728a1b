//! Sub-task descriptions and asset types

use crate::error::{FinanceError, Result};
use agent_core::TaskArgs;
use agent_core::args::keys;
use agent_llm::ComplexityTier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sub-task kinds known to the default handler registry
pub mod kinds {
    /// Full single-stock analysis
    pub const STOCK_ANALYST: &str = "stock_analyst";
    /// Full single-crypto analysis
    pub const CRYPTO_ANALYST: &str = "crypto_analyst";
    /// Chart and indicator analysis
    pub const TECHNICAL: &str = "technical";
    /// Valuation and financials
    pub const FUNDAMENTAL: &str = "fundamental";

    /// All bundled kinds
    pub const ALL: [&str; 4] = [STOCK_ANALYST, CRYPTO_ANALYST, TECHNICAL, FUNDAMENTAL];
}

/// Class of asset being analyzed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    /// Listed equity
    Stock,
    /// Cryptocurrency
    Crypto,
}

impl AssetType {
    /// Stable lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Crypto => "crypto",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stock" => Ok(Self::Stock),
            "crypto" => Ok(Self::Crypto),
            _ => Err(FinanceError::UnsupportedAssetType(s.to_string())),
        }
    }
}

/// One named unit of work in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    /// Unique name within the batch; keys the result mapping
    pub name: String,
    /// Handler kind, e.g. "technical"
    pub kind: String,
    /// Asset identifier (ticker or symbol)
    pub asset: String,
    /// Overrides the handler's default tier
    #[serde(default)]
    pub tier: Option<ComplexityTier>,
    /// Arguments passed through to the analyst
    #[serde(default)]
    pub args: TaskArgs,
}

impl SubTask {
    /// Create a sub-task named after its kind
    pub fn new(kind: impl Into<String>, asset: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            name: kind.clone(),
            kind,
            asset: asset.into(),
            tier: None,
            args: TaskArgs::new(),
        }
    }

    /// Set the name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the complexity tier
    pub fn with_tier(mut self, tier: ComplexityTier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Add an argument
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.args.insert(key, value);
        self
    }
}

/// Which sub-analyses a comprehensive stock analysis runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAnalysisOptions {
    /// Include fundamental analysis
    pub include_fundamental: bool,
    /// Include technical analysis
    pub include_technical: bool,
}

impl Default for StockAnalysisOptions {
    fn default() -> Self {
        Self {
            include_fundamental: true,
            include_technical: true,
        }
    }
}

impl StockAnalysisOptions {
    /// Sub-tasks for `ticker`; the stock analyst always runs
    pub fn subtasks(&self, ticker: &str) -> Vec<SubTask> {
        let mut tasks = Vec::with_capacity(3);
        if self.include_fundamental {
            tasks.push(SubTask::new(kinds::FUNDAMENTAL, ticker));
        }
        if self.include_technical {
            tasks.push(SubTask::new(kinds::TECHNICAL, ticker));
        }
        tasks.push(SubTask::new(kinds::STOCK_ANALYST, ticker));
        tasks
    }
}

/// Which sub-analyses a comprehensive crypto analysis runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoAnalysisOptions {
    /// Ask the crypto analyst for on-chain metrics
    pub include_onchain: bool,
    /// Include technical analysis
    pub include_technical: bool,
}

impl Default for CryptoAnalysisOptions {
    fn default() -> Self {
        Self {
            include_onchain: true,
            include_technical: true,
        }
    }
}

impl CryptoAnalysisOptions {
    /// Sub-tasks for `symbol`; the crypto analyst always runs
    pub fn subtasks(&self, symbol: &str) -> Vec<SubTask> {
        let mut tasks = vec![
            SubTask::new(kinds::CRYPTO_ANALYST, symbol)
                .with_arg(keys::INCLUDE_ONCHAIN, self.include_onchain),
        ];
        if self.include_technical {
            tasks.push(SubTask::new(kinds::TECHNICAL, symbol));
        }
        tasks
    }
}
