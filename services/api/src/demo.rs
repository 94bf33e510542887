use crate::infra::{InMemoryAnalysisRepository, InMemoryBlobStore, StructuredTextOracle};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use deal_flow::error::AppError;
use deal_flow::workflows::analysis::{
    ActorId, AnalysisRecord, AnalysisService, AnalysisServiceError, ClientId, EditContext,
    ExtractionSource, PropertyId, SaleOutcome,
};
use deal_flow::workflows::feasibility::{
    Comparable, FeasibilityAssumptions, Financing, FinancingTier, Modality, PaymentMethod,
    PropertyAnalysisInput,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

type DemoService =
    AnalysisService<InMemoryAnalysisRepository, InMemoryBlobStore, StructuredTextOracle>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date (YYYY-MM-DD or DD/MM/YYYY). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Target ROI in percent for the bid suggestion.
    #[arg(long, default_value_t = 30.0)]
    pub(crate) target_roi: f64,
    /// Optional document to attach to the analysis (content type guessed from the name).
    #[arg(long)]
    pub(crate) attach: Option<PathBuf>,
    /// Finance 80% of the bid instead of paying cash.
    #[arg(long)]
    pub(crate) financed: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        target_roi,
        attach,
        financed,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let blobs = Arc::new(InMemoryBlobStore::default());
    let service = AnalysisService::new(
        Arc::new(InMemoryAnalysisRepository::default()),
        blobs.clone(),
        Arc::new(StructuredTextOracle),
        FeasibilityAssumptions::default(),
    );

    let property_id = PropertyId("SP-2026-0042".to_string());
    let analyst = ActorId("ana.lima".to_string());
    let colleague = ActorId("bruno.reis".to_string());

    println!("Auction deal-flow demo ({today})");
    service.register(property_id.clone(), PropertyAnalysisInput::default())?;
    println!("- Registered listing {property_id}");

    let claimed = service.claim(&property_id, &analyst)?;
    print_record("Claimed", &claimed);

    match service.claim(&property_id, &colleague) {
        Err(AnalysisServiceError::AlreadyClaimed { assignee, .. }) => {
            let holder = assignee.map(|actor| actor.0).unwrap_or_default();
            println!("- {colleague} tried to claim it too; already held by {holder}");
        }
        Ok(_) => println!("- Unexpected: contested claim succeeded"),
        Err(err) => return Err(err.into()),
    }

    let context = EditContext::new(analyst.clone());
    let prefill = service.prefill(
        &property_id,
        &context,
        &ExtractionSource::Text {
            text: auction_notice(today),
        },
    )?;
    println!(
        "- Prefilled from the auction notice: {}",
        prefill.applied_fields.join(", ")
    );

    let input = analyst_form(prefill.record.input.clone(), today, financed);
    let context = context.at_revision(prefill.record.revision);
    let saved = service.save(&property_id, &context, input)?;
    print_record("Saved analysis", &saved);

    if let Some(path) = attach {
        attach_document(&service, &property_id, &analyst, &path, &blobs)?;
    }

    let report = service.report(&property_id, today, Some(target_roi))?;
    println!(
        "- Live ROI at initial bid {:.2}: {:.2}% | at max bid {:.2}: {:.2}%",
        report.initial_bid, report.initial.roi, report.max_bid, report.at_max_bid.roi
    );
    println!(
        "- Estimated unpaid IPTU left by the previous owner: {:.2}",
        report.estimated_hidden_iptu
    );
    if let Some(suggestion) = report.suggestion {
        if suggestion.max_bid > 0.0 {
            println!(
                "- Highest bid clearing {:.1}% ROI: {:.2}",
                suggestion.target_roi, suggestion.max_bid
            );
        } else {
            println!("- No bid clears {:.1}% ROI", suggestion.target_roi);
        }
    }

    let completed = service.complete(
        &property_id,
        &analyst,
        deal_flow::workflows::analysis::AnalysisStatus::Analyzed,
    )?;
    print_record("Completed", &completed);

    match service.save(&property_id, &EditContext::new(analyst.clone()), completed.input.clone()) {
        Err(AnalysisServiceError::ReadOnly { .. }) => {
            println!("- Further edits require edit mode once the analysis is closed");
        }
        Ok(_) => println!("- Unexpected: closed analysis accepted an edit"),
        Err(err) => return Err(err.into()),
    }

    let client = ClientId("horizonte-capital".to_string());
    let dispatched = service.dispatch(&property_id, client.clone())?;
    println!(
        "- Dispatched to {} investor client(s)",
        dispatched.dispatched_to.len()
    );

    let sold = service.record_sale(
        &property_id,
        SaleOutcome {
            client_id: client,
            sale_value: report.initial.market_val,
            sold_on: today,
        },
    )?;
    print_record("Sold", &sold);

    Ok(())
}

fn attach_document(
    service: &DemoService,
    property_id: &PropertyId,
    analyst: &ActorId,
    path: &Path,
    blobs: &InMemoryBlobStore,
) -> Result<(), AppError> {
    let bytes = std::fs::read(path)?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let record = service.attach_document(
        property_id,
        &EditContext::new(analyst.clone()),
        &name,
        &bytes,
        &content_type,
    )?;

    if let Some(document) = record.documents.last() {
        let size = blobs
            .get(&document.blob_id)
            .map(|blob| blob.bytes.len())
            .unwrap_or_default();
        println!(
            "- Attached {} ({}, {} bytes) as {}",
            document.name, document.content_type, size, document.blob_id.0
        );
    }
    Ok(())
}

/// What an upstream extractor would return for the auction notice.
fn auction_notice(today: NaiveDate) -> String {
    serde_json::json!({
        "address": "Rua Augusta, 1200 - apto 81, São Paulo/SP",
        "auction_date": (today + Duration::days(10)).format("%Y-%m-%d").to_string(),
        "modality": "Leilão Judicial",
        "private_area": "80,00",
        "bank_valuation": "R$ 250.000,00",
        "condo_debt": "R$ 32.000,00",
        "condo_fee": 650,
        "monthly_iptu": 95,
        "initial_bid": "100.000,00",
    })
    .to_string()
}

fn analyst_form(
    mut input: PropertyAnalysisInput,
    today: NaiveDate,
    financed: bool,
) -> PropertyAnalysisInput {
    input.modality = Modality::JudicialAuction;
    input.itbi_rate = 3.0;
    input.registry_value = 2_000.0;
    input.renovation_value = 8_000.0;
    input.condo_debt_rule = true;
    input.max_bid = 130_000.0;
    input.sales_period = Some(12);
    input.last_owner_registry_date = Some(today - Duration::days(548));
    input.comparables = vec![
        Comparable::new("https://example.com/listing/1", 310_000.0, 100.0),
        Comparable::new("https://example.com/listing/2", 285_000.0, 95.0),
        Comparable::new("https://example.com/listing/3", 0.0, 0.0),
    ];
    if financed {
        input.set_payment_method(PaymentMethod::Financing);
        input.financing = Financing::Financed(FinancingTier::Eighty);
    }
    input
}

fn print_record(step: &str, record: &AnalysisRecord) {
    let assignee = record
        .assignee
        .as_ref()
        .map(|actor| actor.0.as_str())
        .unwrap_or("unassigned");
    match (record.final_roi, record.final_net_profit) {
        (Some(roi), Some(net_profit)) => println!(
            "- {step}: {} | {assignee} | rev {} | frozen ROI {roi:.2}% | net profit {net_profit:.2}",
            record.status.label(),
            record.revision
        ),
        _ => println!(
            "- {step}: {} | {assignee} | rev {}",
            record.status.label(),
            record.revision
        ),
    }
}
