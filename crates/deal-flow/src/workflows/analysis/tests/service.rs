use super::common::*;
use std::sync::Arc;
use std::thread;

use crate::workflows::analysis::domain::{AnalysisStatus, ClientId, PropertyId, SaleOutcome};
use crate::workflows::analysis::lifecycle::LifecycleError;
use crate::workflows::analysis::repository::{
    AnalysisRecord, AnalysisRepository, BlobError, ExtractionSource, RepositoryError,
};
use crate::workflows::analysis::{AnalysisService, AnalysisServiceError, EditContext};
use crate::workflows::feasibility::{FeasibilityAssumptions, PartialAnalysisInput};

const EXPECTED_ROI: f64 = 98_260.0 / 124_400.0 * 100.0;

#[test]
fn register_then_get_returns_a_fresh_record() {
    let (service, _, _) = build_service();
    let record = service
        .register(property_id(), sample_input())
        .expect("register succeeds");

    assert_eq!(record.status, AnalysisStatus::NotStarted);
    let fetched = service.get(&property_id()).expect("record present");
    assert_eq!(fetched, record);
}

#[test]
fn get_propagates_not_found() {
    let (service, _, _) = build_service();
    match service.get(&PropertyId("missing".to_string())) {
        Err(AnalysisServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn claim_assigns_the_actor_and_starts_the_analysis() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::NotStarted, None);

    let claimed = service
        .claim(&property_id(), &analyst())
        .expect("claim succeeds");

    assert_eq!(claimed.status, AnalysisStatus::InProgress);
    assert_eq!(claimed.assignee, Some(analyst()));
    assert_eq!(claimed.revision, 1);
    assert_eq!(repository.stored(&property_id()), claimed);
}

#[test]
fn repeated_claim_by_the_assignee_is_a_no_op() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::NotStarted, None);

    service.claim(&property_id(), &analyst()).expect("first claim");
    let again = service.claim(&property_id(), &analyst()).expect("second claim");

    assert_eq!(again.revision, 1, "no second write");
}

#[test]
fn claim_by_another_analyst_reports_the_current_assignee() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    match service.claim(&property_id(), &rival()) {
        Err(AnalysisServiceError::AlreadyClaimed { assignee, .. }) => {
            assert_eq!(assignee, Some(analyst()));
        }
        other => panic!("expected already claimed, got {other:?}"),
    }
    assert_eq!(
        repository.stored(&property_id()).assignee,
        Some(analyst()),
        "assignment is untouched"
    );
}

#[test]
fn losing_a_claim_race_reports_the_winner_without_retrying() {
    let racing = Arc::new(RacingRepository {
        inner: MemoryRepository::default(),
        winner: rival(),
    });
    racing
        .insert(AnalysisRecord::new(property_id(), sample_input()))
        .expect("seed");
    let service = AnalysisService::new(
        racing.clone(),
        Arc::new(MemoryBlobs::default()),
        Arc::new(CannedOracle::default()),
        FeasibilityAssumptions::default(),
    );

    match service.claim(&property_id(), &analyst()) {
        Err(AnalysisServiceError::AlreadyClaimed { assignee, .. }) => {
            assert_eq!(assignee, Some(rival()));
        }
        other => panic!("expected already claimed, got {other:?}"),
    }

    let stored = racing.inner.stored(&property_id());
    assert_eq!(stored.assignee, Some(rival()));
    assert_eq!(stored.revision, 1, "only the rival claim was written");
}

#[test]
fn concurrent_claims_have_exactly_one_winner() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::NotStarted, None);
    let service = Arc::new(service);

    let handles: Vec<_> = (0..8)
        .map(|index| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let actor = crate::workflows::analysis::ActorId(format!("analyst-{index}"));
                service.claim(&property_id(), &actor)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("claim thread"))
        .collect();
    let winners = results.iter().filter(|result| result.is_ok()).count();

    assert_eq!(winners, 1);
    assert!(results.iter().all(|result| matches!(
        result,
        Ok(_) | Err(AnalysisServiceError::AlreadyClaimed { .. })
    )));
    assert_eq!(repository.stored(&property_id()).revision, 1);
}

#[test]
fn save_freezes_roi_and_net_profit_at_the_initial_bid() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    let mut input = sample_input();
    input.max_bid = 180_000.0;
    let saved = service
        .save(&property_id(), &EditContext::new(analyst()), input)
        .expect("save succeeds");

    assert_close(saved.final_roi.expect("roi frozen"), EXPECTED_ROI);
    assert_close(saved.final_net_profit.expect("profit frozen"), 98_260.0);
    assert_eq!(saved.input.max_bid, 180_000.0);
    assert_eq!(repository.stored(&property_id()), saved);
}

#[test]
fn save_on_a_fresh_record_claims_it_for_the_author() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::NotStarted, None);

    let saved = service
        .save(&property_id(), &EditContext::new(analyst()), sample_input())
        .expect("save succeeds");

    assert_eq!(saved.status, AnalysisStatus::InProgress);
    assert_eq!(saved.assignee, Some(analyst()));
    assert!(saved.final_roi.is_some());
}

#[test]
fn save_by_another_analyst_is_rejected_as_read_only() {
    let (service, repository, _) = build_service();
    let seeded = seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    match service.save(&property_id(), &EditContext::new(rival()), sample_input()) {
        Err(AnalysisServiceError::ReadOnly { status, .. }) => {
            assert_eq!(status, AnalysisStatus::InProgress);
        }
        other => panic!("expected read only, got {other:?}"),
    }
    assert_eq!(repository.stored(&property_id()), seeded);
}

#[test]
fn terminal_records_accept_saves_only_in_edit_mode() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::Analyzed, Some(analyst()));

    let mut input = sample_input();
    input.initial_bid = 120_000.0;

    assert!(matches!(
        service.save(&property_id(), &EditContext::new(analyst()), input.clone()),
        Err(AnalysisServiceError::ReadOnly { .. })
    ));

    let context = EditContext::new(analyst()).with_edit_mode(true);
    let saved = service
        .save(&property_id(), &context, input.clone())
        .expect("edit mode save");

    assert_eq!(saved.status, AnalysisStatus::Analyzed, "status is preserved");
    let expected = service.calculator().compute(&input, 120_000.0);
    assert_close(saved.final_roi.expect("roi"), expected.roi);
    assert_close(saved.final_net_profit.expect("profit"), expected.net_profit);
}

#[test]
fn save_with_a_stale_revision_is_a_conflict() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    let first = EditContext::new(analyst()).at_revision(0);
    service
        .save(&property_id(), &first, sample_input())
        .expect("first save");

    match service.save(&property_id(), &first, sample_input()) {
        Err(AnalysisServiceError::Repository(RepositoryError::Conflict)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(repository.stored(&property_id()).revision, 1);
}

#[test]
fn complete_requires_the_assignee() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    assert!(matches!(
        service.complete(&property_id(), &rival(), AnalysisStatus::Analyzed),
        Err(AnalysisServiceError::NotAssignee { .. })
    ));
}

#[test]
fn complete_freezes_metrics_and_closes_the_analysis() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    let completed = service
        .complete(&property_id(), &analyst(), AnalysisStatus::Analyzed)
        .expect("complete succeeds");

    assert_eq!(completed.status, AnalysisStatus::Analyzed);
    assert_close(completed.final_roi.expect("roi"), EXPECTED_ROI);
}

#[test]
fn complete_rejects_outcomes_other_than_analyzed_or_aborted() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    match service.complete(&property_id(), &analyst(), AnalysisStatus::Sold) {
        Err(AnalysisServiceError::Lifecycle(LifecycleError::InvalidTransition { from, to })) => {
            assert_eq!(from, AnalysisStatus::InProgress);
            assert_eq!(to, AnalysisStatus::Sold);
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }

    let aborted = service
        .complete(&property_id(), &analyst(), AnalysisStatus::Aborted)
        .expect("abort succeeds");
    assert_eq!(aborted.status, AnalysisStatus::Aborted);
}

#[test]
fn dispatch_requires_an_analyzed_record_and_ignores_duplicates() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));
    let client = ClientId("fundo-horizonte".to_string());

    assert!(matches!(
        service.dispatch(&property_id(), client.clone()),
        Err(AnalysisServiceError::Lifecycle(LifecycleError::NotDispatchable { .. }))
    ));

    service
        .complete(&property_id(), &analyst(), AnalysisStatus::Analyzed)
        .expect("complete");
    let first = service
        .dispatch(&property_id(), client.clone())
        .expect("dispatch");
    let second = service.dispatch(&property_id(), client).expect("re-dispatch");

    assert_eq!(first.dispatched_to.len(), 1);
    assert_eq!(second.revision, first.revision, "duplicate is not written");
}

#[test]
fn sale_is_recorded_on_analyzed_records() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::Analyzed, Some(analyst()));

    let sale = SaleOutcome {
        client_id: ClientId("fundo-horizonte".to_string()),
        sale_value: 265_000.0,
        sold_on: day(2026, 10, 10),
    };
    let sold = service
        .record_sale(&property_id(), sale.clone())
        .expect("sale recorded");

    assert_eq!(sold.status, AnalysisStatus::Sold);
    assert_eq!(sold.sale, Some(sale.clone()));
    assert!(matches!(
        service.record_sale(&property_id(), sale),
        Err(AnalysisServiceError::Lifecycle(LifecycleError::InvalidTransition { .. }))
    ));
}

#[test]
fn lost_requires_the_auction_date_to_have_passed() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::Analyzed, Some(analyst()));

    assert!(matches!(
        service.mark_lost(&property_id(), day(2026, 9, 30)),
        Err(AnalysisServiceError::Lifecycle(LifecycleError::AuctionNotPassed { .. }))
    ));

    let lost = service
        .mark_lost(&property_id(), day(2026, 10, 14))
        .expect("lost recorded");
    assert_eq!(lost.status, AnalysisStatus::Lost);
}

#[test]
fn prefill_fills_only_empty_fields() {
    let oracle = Arc::new(CannedOracle::returning(PartialAnalysisInput {
        address: Some("Rua Errada, 1".to_string()),
        condo_fee: Some(650.0),
        monthly_iptu: Some(95.0),
        ..PartialAnalysisInput::default()
    }));
    let (service, repository, _) = build_service_with_oracle(oracle.clone());
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    let source = ExtractionSource::Text {
        text: "Edital de leilão".to_string(),
    };
    let outcome = service
        .prefill(&property_id(), &EditContext::new(analyst()), &source)
        .expect("prefill succeeds");

    assert_eq!(outcome.applied_fields, vec!["condo_fee", "monthly_iptu"]);
    assert_eq!(outcome.record.input.address, sample_input().address);
    assert_eq!(outcome.record.input.condo_fee, 650.0);
    assert_eq!(outcome.record.revision, 1);
    assert!(outcome.record.final_roi.is_some());
    assert_eq!(oracle.calls(), 1);
}

#[test]
fn prefill_without_extracted_data_writes_nothing() {
    let (service, repository, _) = build_service();
    let seeded = seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    let source = ExtractionSource::Url {
        url: "https://example.com/edital.pdf".to_string(),
    };
    let outcome = service
        .prefill(&property_id(), &EditContext::new(analyst()), &source)
        .expect("prefill succeeds");

    assert!(outcome.applied_fields.is_empty());
    assert_eq!(repository.stored(&property_id()), seeded);
}

#[test]
fn prefill_respects_read_only_records() {
    let oracle = Arc::new(CannedOracle::returning(PartialAnalysisInput {
        condo_fee: Some(650.0),
        ..PartialAnalysisInput::default()
    }));
    let (service, repository, _) = build_service_with_oracle(oracle.clone());
    seed(&repository, AnalysisStatus::Sold, Some(analyst()));

    let source = ExtractionSource::Text {
        text: "matrícula".to_string(),
    };
    assert!(matches!(
        service.prefill(&property_id(), &EditContext::new(analyst()), &source),
        Err(AnalysisServiceError::ReadOnly { .. })
    ));
    assert_eq!(oracle.calls(), 0, "oracle is not consulted");
}

#[test]
fn attach_document_stores_the_blob_and_references_it() {
    let (service, repository, blobs) = build_service();
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    let record = service
        .attach_document(
            &property_id(),
            &EditContext::new(analyst()),
            "matricula.pdf",
            b"%PDF-1.7",
            &mime::APPLICATION_PDF,
        )
        .expect("attach succeeds");

    assert_eq!(record.documents.len(), 1);
    assert_eq!(record.documents[0].name, "matricula.pdf");
    assert_eq!(record.documents[0].content_type, "application/pdf");
    assert_eq!(blobs.stored()[0].0, record.documents[0].blob_id);
}

#[test]
fn attach_document_propagates_blob_errors() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    assert!(matches!(
        service.attach_document(
            &property_id(),
            &EditContext::new(analyst()),
            "vazio.pdf",
            b"",
            &mime::APPLICATION_PDF,
        ),
        Err(AnalysisServiceError::Blob(BlobError::Empty))
    ));
}

#[test]
fn failed_attach_discards_the_stored_blob() {
    let racing = Arc::new(RacingRepository {
        inner: MemoryRepository::default(),
        winner: rival(),
    });
    racing
        .insert(AnalysisRecord::new(property_id(), sample_input()))
        .expect("seed");
    let blobs = Arc::new(MemoryBlobs::default());
    let service = AnalysisService::new(
        racing.clone(),
        blobs.clone(),
        Arc::new(CannedOracle::default()),
        FeasibilityAssumptions::default(),
    );

    let result = service.attach_document(
        &property_id(),
        &EditContext::new(analyst()),
        "edital.pdf",
        b"%PDF-1.7",
        &mime::APPLICATION_PDF,
    );

    assert!(matches!(
        result,
        Err(AnalysisServiceError::Repository(RepositoryError::Conflict))
    ));
    assert!(blobs.stored().is_empty(), "no blob outlives the failed write");
    assert!(racing.inner.stored(&property_id()).documents.is_empty());
}

#[test]
fn list_filters_by_status() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::Analyzed, Some(analyst()));
    service
        .register(PropertyId("RJ-0007".to_string()), sample_input())
        .expect("register");

    let analyzed = service.list(Some(AnalysisStatus::Analyzed)).expect("list");
    assert_eq!(analyzed.len(), 1);
    assert_eq!(analyzed[0].property_id, property_id());
    assert_eq!(service.list(None).expect("list all").len(), 2);
}

#[test]
fn repository_outages_surface_as_unavailable() {
    let service = AnalysisService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemoryBlobs::default()),
        Arc::new(CannedOracle::default()),
        FeasibilityAssumptions::default(),
    );

    assert!(matches!(
        service.claim(&property_id(), &analyst()),
        Err(AnalysisServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}

#[test]
fn report_uses_the_stored_form() {
    let (service, repository, _) = build_service();
    seed(&repository, AnalysisStatus::InProgress, Some(analyst()));

    let report = service
        .report(&property_id(), day(2026, 10, 14), Some(40.0))
        .expect("report");

    assert_close(report.initial.roi, EXPECTED_ROI);
    let suggestion = report.suggestion.expect("suggestion");
    assert!(suggestion.max_bid > report.initial_bid);
}
