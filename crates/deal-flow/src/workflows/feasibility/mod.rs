//! Financial feasibility engine: market value, acquisition costs, financing, profit and ROI
//! for a candidate bid, plus the bid search and hidden IPTU estimate built on top of it.

mod assumptions;
mod calculator;
pub mod comparables;
pub mod input;
pub mod iptu;
pub mod lenient;
mod optimizer;
pub mod report;

pub use assumptions::FeasibilityAssumptions;
pub use calculator::{MetricsCalculator, MetricsSnapshot};
pub use comparables::{ComparablesImportError, ComparablesImporter};
pub use input::{
    Comparable, Financing, FinancingTier, Modality, PartialAnalysisInput, PaymentMethod,
    PropertyAnalysisInput,
};
pub use iptu::{estimate_hidden_debt, estimate_hidden_debt_today};
pub use optimizer::{find_max_bid_for_target_roi, BidOptimizer};
pub use report::{suggest_bid, BidSuggestion, FeasibilityReport};
