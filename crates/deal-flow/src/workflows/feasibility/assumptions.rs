use serde::{Deserialize, Serialize};

/// Market and regulatory constants applied by the calculator. Percentages are whole numbers
/// (6 means 6%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityAssumptions {
    /// Brokerage charged on the resale, over market value.
    pub brokerage_percent: f64,
    /// Auctioneer commission over the bid, where the modality requires one.
    pub auctioneer_percent: f64,
    /// Capital gains income tax over positive gross profit.
    pub income_tax_percent: f64,
    /// Share of the bank valuation above which condo debt is not the buyer's liability.
    pub condo_debt_cap_percent: f64,
    pub default_financing_rate: f64,
    pub default_financing_term: u32,
    pub default_sales_period: u32,
}

impl Default for FeasibilityAssumptions {
    fn default() -> Self {
        Self {
            brokerage_percent: 6.0,
            auctioneer_percent: 5.0,
            income_tax_percent: 15.0,
            condo_debt_cap_percent: 10.0,
            default_financing_rate: 11.75,
            default_financing_term: 360,
            default_sales_period: 12,
        }
    }
}

impl FeasibilityAssumptions {
    pub(crate) fn sales_period(&self, configured: Option<u32>) -> u32 {
        configured
            .filter(|months| *months > 0)
            .unwrap_or(self.default_sales_period)
    }

    pub(crate) fn financing_term(&self, configured: Option<u32>) -> u32 {
        configured
            .filter(|months| *months > 0)
            .unwrap_or(self.default_financing_term)
    }

    pub(crate) fn financing_rate(&self, configured: Option<f64>) -> f64 {
        configured
            .filter(|rate| rate.is_finite())
            .unwrap_or(self.default_financing_rate)
    }
}
