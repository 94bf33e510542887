use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calculator::{MetricsCalculator, MetricsSnapshot};
use super::input::PropertyAnalysisInput;
use super::iptu::estimate_hidden_debt;
use super::optimizer::BidOptimizer;

/// Bid suggestion for a target ROI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BidSuggestion {
    pub target_roi: f64,
    pub max_bid: f64,
    pub metrics: Option<MetricsSnapshot>,
}

/// Live view of a property's feasibility: both analyst bids, the IPTU the previous owner
/// likely left behind and, optionally, the highest bid that clears a target ROI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub evaluated_on: NaiveDate,
    pub initial_bid: f64,
    pub initial: MetricsSnapshot,
    pub max_bid: f64,
    pub at_max_bid: MetricsSnapshot,
    pub estimated_hidden_iptu: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<BidSuggestion>,
}

impl FeasibilityReport {
    pub fn build(
        calculator: &MetricsCalculator,
        input: &PropertyAnalysisInput,
        today: NaiveDate,
        target_roi: Option<f64>,
    ) -> Self {
        let suggestion = target_roi
            .filter(|target| target.is_finite())
            .map(|target| suggest_bid(calculator, input, target));

        Self {
            evaluated_on: today,
            initial_bid: input.initial_bid,
            initial: calculator.compute(input, input.initial_bid),
            max_bid: input.max_bid,
            at_max_bid: calculator.compute(input, input.max_bid),
            estimated_hidden_iptu: estimate_hidden_debt(
                input.last_owner_registry_date,
                input.monthly_iptu,
                today,
            ),
            suggestion,
        }
    }
}

pub fn suggest_bid(
    calculator: &MetricsCalculator,
    input: &PropertyAnalysisInput,
    target_roi: f64,
) -> BidSuggestion {
    let max_bid =
        BidOptimizer::default().find_max_bid_for_target_roi(calculator, input, target_roi);
    let metrics = (max_bid > 0.0).then(|| calculator.compute(input, max_bid));

    BidSuggestion {
        target_roi,
        max_bid,
        metrics,
    }
}
