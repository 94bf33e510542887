use serde::{Deserialize, Serialize};

use super::assumptions::FeasibilityAssumptions;
use super::input::{Comparable, PropertyAnalysisInput};

/// Derived figures for one property evaluated at one bid amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub market_val: f64,
    pub itbi: f64,
    pub broker: f64,
    pub auctioneer: f64,
    pub effective_condo_debt: f64,
    pub holding_cost: f64,
    pub total_expenses: f64,
    pub financed: f64,
    pub monthly_pmt: f64,
    pub total_pmt_cost: f64,
    pub gross_profit: f64,
    pub ir: f64,
    pub net_profit: f64,
    pub cash_required: f64,
    pub roi: f64,
    pub entry: f64,
}

/// Stateless evaluator turning an analysis form and a bid into a [`MetricsSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct MetricsCalculator {
    assumptions: FeasibilityAssumptions,
}

impl MetricsCalculator {
    pub fn new(assumptions: FeasibilityAssumptions) -> Self {
        Self { assumptions }
    }

    pub fn assumptions(&self) -> &FeasibilityAssumptions {
        &self.assumptions
    }

    pub fn compute(&self, input: &PropertyAnalysisInput, bid_amount: f64) -> MetricsSnapshot {
        let bid = finite_or_zero(bid_amount);
        let rules = &self.assumptions;
        let sales_period = f64::from(rules.sales_period(input.sales_period));

        let market_val = market_value(&input.comparables, input.private_area);

        let itbi = bid * percent(input.itbi_rate);
        let broker = market_val * percent(rules.brokerage_percent);
        let auctioneer = if input.modality.charges_auctioneer() {
            bid * percent(rules.auctioneer_percent)
        } else {
            0.0
        };
        let effective_condo_debt = self.effective_condo_debt(input);
        let holding_cost = (input.condo_fee + input.monthly_iptu) * sales_period;
        let total_expenses = itbi
            + broker
            + auctioneer
            + input.registry_value
            + input.renovation_value
            + effective_condo_debt
            + input.iptu_debt
            + holding_cost;

        let (financed, monthly_pmt, total_pmt_cost) = match input.financing.tier() {
            Some(tier) => {
                let financed = bid * tier.ratio();
                let monthly_rate = percent(rules.financing_rate(input.financing_rate)) / 12.0;
                let months = rules.financing_term(input.financing_term).max(1);
                let monthly_pmt = monthly_payment(financed, monthly_rate, months);
                (financed, monthly_pmt, monthly_pmt * sales_period)
            }
            None => (0.0, 0.0, 0.0),
        };

        let cost_basis = bid + total_expenses;
        let gross_profit = market_val - cost_basis;
        let ir = if gross_profit > 0.0 {
            gross_profit * percent(rules.income_tax_percent)
        } else {
            0.0
        };
        let net_profit = gross_profit - ir;

        let entry = bid - financed;
        let cash_required = entry + total_expenses + total_pmt_cost;
        let roi = if cash_required > 0.0 {
            net_profit / cash_required * 100.0
        } else {
            0.0
        };

        MetricsSnapshot {
            market_val,
            itbi,
            broker,
            auctioneer,
            effective_condo_debt,
            holding_cost,
            total_expenses,
            financed,
            monthly_pmt,
            total_pmt_cost,
            gross_profit,
            ir,
            net_profit,
            cash_required,
            roi,
            entry,
        }
    }

    /// Market value does not depend on the bid.
    pub fn market_value(&self, input: &PropertyAnalysisInput) -> f64 {
        market_value(&input.comparables, input.private_area)
    }

    fn effective_condo_debt(&self, input: &PropertyAnalysisInput) -> f64 {
        let debt = input.condo_debt;
        if !input.condo_debt_rule || input.bank_valuation <= 0.0 {
            return debt;
        }

        let cap = input.bank_valuation * percent(self.assumptions.condo_debt_cap_percent);
        if debt > cap {
            cap
        } else {
            debt
        }
    }
}

/// Mean of per-unit prices (not area weighted) scaled to the property's private area.
pub(crate) fn market_value(comparables: &[Comparable], private_area: f64) -> f64 {
    let (sum, count) = comparables
        .iter()
        .filter_map(Comparable::unit_price)
        .fold((0.0, 0usize), |(sum, count), price| (sum + price, count + 1));

    if count == 0 {
        return 0.0;
    }

    sum / count as f64 * private_area
}

/// Fixed-payment (Price table) installment; straight line when the rate is not positive.
///
/// Terms long enough to overflow the compound factor pay the perpetuity installment
/// `principal * monthly_rate`, which is the limit of the annuity formula.
pub(crate) fn monthly_payment(principal: f64, monthly_rate: f64, months: u32) -> f64 {
    let months = months.max(1);
    if !(monthly_rate > 0.0) {
        return principal / f64::from(months);
    }

    let growth = (1.0 + monthly_rate).powf(f64::from(months));
    if !growth.is_finite() {
        return principal * monthly_rate;
    }
    principal * monthly_rate * growth / (growth - 1.0)
}

fn percent(value: f64) -> f64 {
    value / 100.0
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
