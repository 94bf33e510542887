use tracing::debug;

use super::calculator::MetricsCalculator;
use super::input::PropertyAnalysisInput;

/// Bisection search for the highest bid that still clears a target ROI.
///
/// ROI is non-increasing in the bid, so the qualifying bids form a prefix of `[1, market
/// value]` and halving the interval converges on its upper edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BidOptimizer {
    floor: f64,
    tolerance: f64,
    max_iterations: u32,
}

impl Default for BidOptimizer {
    fn default() -> Self {
        Self {
            floor: Self::FLOOR,
            tolerance: Self::TOLERANCE,
            max_iterations: Self::MAX_ITERATIONS,
        }
    }
}

impl BidOptimizer {
    pub const FLOOR: f64 = 1.0;
    /// Search stops once the bracket is this narrow, in currency units.
    pub const TOLERANCE: f64 = 10.0;
    pub const MAX_ITERATIONS: u32 = 50;

    pub fn with_limits(floor: f64, tolerance: f64, max_iterations: u32) -> Self {
        Self {
            floor,
            tolerance,
            max_iterations,
        }
    }

    /// Returns the best qualifying bid found, or 0 when no probed bid clears the target.
    pub fn find_max_bid_for_target_roi(
        &self,
        calculator: &MetricsCalculator,
        input: &PropertyAnalysisInput,
        target_roi: f64,
    ) -> f64 {
        let mut low = self.floor;
        let mut high = calculator.compute(input, 0.0).market_val;
        let mut best = 0.0;
        let mut iterations = 0;

        while high - low > self.tolerance && iterations < self.max_iterations {
            let mid = (low + high) / 2.0;
            let result = calculator.compute(input, mid);

            if result.roi > target_roi {
                best = mid;
                low = mid;
            } else {
                high = mid;
            }
            iterations += 1;
        }

        debug!(iterations, target_roi, best, "bid search finished");
        best
    }
}

/// Convenience wrapper using the default search limits.
pub fn find_max_bid_for_target_roi(
    calculator: &MetricsCalculator,
    input: &PropertyAnalysisInput,
    target_roi: f64,
) -> f64 {
    BidOptimizer::default().find_max_bid_for_target_roi(calculator, input, target_roi)
}
