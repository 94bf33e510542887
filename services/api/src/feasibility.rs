use chrono::{Local, NaiveDate};
use clap::Args;
use deal_flow::config::AppConfig;
use deal_flow::error::AppError;
use deal_flow::telemetry;
use deal_flow::workflows::feasibility::{
    suggest_bid, BidSuggestion, ComparablesImporter, FeasibilityReport, MetricsCalculator,
    MetricsSnapshot, PropertyAnalysisInput,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct ComputeArgs {
    /// JSON file holding the property analysis form
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Optional `link,value,area` CSV replacing the form's comparables
    #[arg(long)]
    pub(crate) comparables: Option<PathBuf>,
    /// Evaluation date for the hidden IPTU estimate (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Also suggest the highest bid clearing this ROI (percent)
    #[arg(long)]
    pub(crate) target_roi: Option<f64>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct MaxBidArgs {
    /// JSON file holding the property analysis form
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Optional `link,value,area` CSV replacing the form's comparables
    #[arg(long)]
    pub(crate) comparables: Option<PathBuf>,
    /// Target ROI in percent (defaults to DEAL_TARGET_ROI)
    #[arg(long)]
    pub(crate) target_roi: Option<f64>,
    /// Print the suggestion as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_compute(args: ComputeArgs) -> Result<(), AppError> {
    let ComputeArgs {
        input,
        comparables,
        today,
        target_roi,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let input = load_input(&input, comparables.as_deref())?;
    let calculator = MetricsCalculator::new(config.feasibility.assumptions);
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let report = FeasibilityReport::build(&calculator, &input, today, target_roi);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_report(&input, &report);
    }
    Ok(())
}

pub(crate) fn run_max_bid(args: MaxBidArgs) -> Result<(), AppError> {
    let MaxBidArgs {
        input,
        comparables,
        target_roi,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let input = load_input(&input, comparables.as_deref())?;
    let calculator = MetricsCalculator::new(config.feasibility.assumptions);
    let target_roi = target_roi.unwrap_or(config.feasibility.target_roi);
    let suggestion = suggest_bid(&calculator, &input, target_roi);

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestion)?);
    } else {
        render_suggestion(&suggestion);
    }
    Ok(())
}

pub(crate) fn load_input(
    path: &Path,
    comparables: Option<&Path>,
) -> Result<PropertyAnalysisInput, AppError> {
    let raw = fs::read_to_string(path)?;
    let mut input: PropertyAnalysisInput = serde_json::from_str(&raw)?;
    if let Some(csv) = comparables {
        input.comparables = ComparablesImporter::from_path(csv)?;
    }
    Ok(input)
}

fn render_report(input: &PropertyAnalysisInput, report: &FeasibilityReport) {
    let address = if input.address.trim().is_empty() {
        "(no address)"
    } else {
        input.address.as_str()
    };
    println!("Feasibility report for {address}");
    println!(
        "Modality: {} | evaluated on {}",
        input.modality.label(),
        report.evaluated_on
    );
    println!(
        "Payment: {:?} | financing: {}",
        input.payment_method,
        input.financing.label()
    );

    println!("\nAt initial bid {:.2}", report.initial_bid);
    render_snapshot(&report.initial);
    println!("\nAt max bid {:.2}", report.max_bid);
    render_snapshot(&report.at_max_bid);

    println!(
        "\nEstimated unpaid IPTU since last registration: {:.2}",
        report.estimated_hidden_iptu
    );
    if let Some(suggestion) = &report.suggestion {
        println!();
        render_suggestion(suggestion);
    }
}

fn render_snapshot(metrics: &MetricsSnapshot) {
    println!("  Market value   {:>14.2}", metrics.market_val);
    println!("  ITBI           {:>14.2}", metrics.itbi);
    println!("  Brokerage      {:>14.2}", metrics.broker);
    println!("  Auctioneer     {:>14.2}", metrics.auctioneer);
    println!("  Condo debt     {:>14.2}", metrics.effective_condo_debt);
    println!("  Holding cost   {:>14.2}", metrics.holding_cost);
    println!("  Total expenses {:>14.2}", metrics.total_expenses);
    if metrics.financed > 0.0 {
        println!("  Financed       {:>14.2}", metrics.financed);
        println!("  Monthly PMT    {:>14.2}", metrics.monthly_pmt);
        println!("  PMT in period  {:>14.2}", metrics.total_pmt_cost);
    }
    println!("  Gross profit   {:>14.2}", metrics.gross_profit);
    println!("  Income tax     {:>14.2}", metrics.ir);
    println!("  Net profit     {:>14.2}", metrics.net_profit);
    println!("  Cash required  {:>14.2}", metrics.cash_required);
    println!("  ROI            {:>13.2}%", metrics.roi);
}

fn render_suggestion(suggestion: &BidSuggestion) {
    match &suggestion.metrics {
        Some(metrics) => {
            println!(
                "Highest bid clearing {:.1}% ROI: {:.2}",
                suggestion.target_roi, suggestion.max_bid
            );
            render_snapshot(metrics);
        }
        None => println!(
            "No bid clears {:.1}% ROI with the current form",
            suggestion.target_roi
        ),
    }
}
