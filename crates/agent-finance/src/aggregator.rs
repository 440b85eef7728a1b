//! Reduction of sub-task results into a digest and a consensus verdict
//!
//! Every success is upper-cased and classified by keyword, checked in the
//! order BUY, SELL, HOLD. A class wins only with a strict majority over both
//! others; anything else is MIXED. Failures are skipped.

use crate::result::SubTaskResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Confidence used when no analysis states one
pub const DEFAULT_CONFIDENCE: f64 = 5.0;

static CONFIDENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CONFIDENCE[:\s]+([0-9]+)").expect("valid confidence pattern"));

/// Consensus recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
    /// No class holds a strict majority
    Mixed,
    /// No success carried a recognizable signal
    InsufficientData,
}

impl Recommendation {
    /// Stable uppercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
            Self::Mixed => "MIXED",
            Self::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tally of classified analyses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
}

impl Breakdown {
    /// Number of classified analyses
    pub fn total(&self) -> usize {
        self.buy + self.sell + self.hold
    }

    /// Largest class, ties resolved BUY > SELL > HOLD
    fn plurality(&self) -> (Recommendation, usize) {
        let mut best = (Recommendation::Buy, self.buy);
        for candidate in [(Recommendation::Sell, self.sell), (Recommendation::Hold, self.hold)] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best
    }
}

/// Verdict reduced from a set of sub-task results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusVerdict {
    /// Overall recommendation
    pub recommendation: Recommendation,
    /// Mean stated confidence (0-10), one decimal
    pub confidence: f64,
    /// Share of classified analyses in the largest class, percent, one decimal
    pub agreement: f64,
    /// Per-class counts
    pub breakdown: Breakdown,
    /// Largest class; set whenever anything was classified
    pub plurality: Option<Recommendation>,
}

impl ConsensusVerdict {
    fn insufficient() -> Self {
        Self {
            recommendation: Recommendation::InsufficientData,
            confidence: 0.0,
            agreement: 0.0,
            breakdown: Breakdown::default(),
            plurality: None,
        }
    }
}

impl fmt::Display for ConsensusVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (confidence {:.1}/10, agreement {:.1}%, buy {} / sell {} / hold {})",
            self.recommendation,
            self.confidence,
            self.agreement,
            self.breakdown.buy,
            self.breakdown.sell,
            self.breakdown.hold
        )
    }
}

/// One line per sub-task, in name order
///
/// Failures render as `name: Error - message`, successes as the text before
/// the first period, and empty successes as `name: No analysis`.
pub fn summarize(results: &BTreeMap<String, SubTaskResult>) -> String {
    results
        .iter()
        .map(|(name, result)| match result {
            SubTaskResult::Failure(failure) => format!("{name}: Error - {}", failure.error),
            SubTaskResult::Success(output) if output.analysis.is_empty() => {
                format!("{name}: No analysis")
            }
            SubTaskResult::Success(output) => {
                let first = output.analysis.split('.').next().unwrap_or_default();
                format!("{name}: {first}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reduce results into a consensus verdict
pub fn consensus(results: &BTreeMap<String, SubTaskResult>) -> ConsensusVerdict {
    let mut breakdown = Breakdown::default();
    let mut confidences = Vec::new();

    for text in results.values().filter_map(SubTaskResult::analysis) {
        let upper = text.to_uppercase();

        match classify(&upper) {
            Some(Recommendation::Buy) => breakdown.buy += 1,
            Some(Recommendation::Sell) => breakdown.sell += 1,
            Some(Recommendation::Hold) => breakdown.hold += 1,
            _ => {}
        }

        if let Some(confidence) = stated_confidence(&upper) {
            confidences.push(confidence);
        }
    }

    let total = breakdown.total();
    if total == 0 {
        return ConsensusVerdict::insufficient();
    }

    let (plurality, largest) = breakdown.plurality();
    let recommendation = if largest * 2 > total { plurality } else { Recommendation::Mixed };

    let confidence = if confidences.is_empty() {
        DEFAULT_CONFIDENCE
    } else {
        round1(confidences.iter().sum::<f64>() / confidences.len() as f64)
    };

    ConsensusVerdict {
        recommendation,
        confidence,
        agreement: round1(largest as f64 / total as f64 * 100.0),
        breakdown,
        plurality: Some(plurality),
    }
}

fn classify(upper: &str) -> Option<Recommendation> {
    if upper.contains("BUY") {
        Some(Recommendation::Buy)
    } else if upper.contains("SELL") {
        Some(Recommendation::Sell)
    } else if upper.contains("HOLD") {
        Some(Recommendation::Hold)
    } else {
        None
    }
}

/// Digits are parsed as `f64` so oversized values still count
fn stated_confidence(upper: &str) -> Option<f64> {
    if !upper.contains("CONFIDENCE") {
        return None;
    }
    CONFIDENCE_PATTERN
        .captures(upper)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// One decimal, halves to even
fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}
