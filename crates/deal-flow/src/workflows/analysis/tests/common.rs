use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::NaiveDate;
use mime::Mime;
use serde_json::Value;

use crate::workflows::analysis::domain::{ActorId, AnalysisStatus, BlobId, PropertyId};
use crate::workflows::analysis::repository::{
    AnalysisRecord, AnalysisRepository, BlobError, BlobStore, ExtractionOracle, ExtractionSource,
    RepositoryError,
};
use crate::workflows::analysis::{analysis_router, AnalysisService};
use crate::workflows::feasibility::{
    Comparable, FeasibilityAssumptions, Modality, PartialAnalysisInput, PropertyAnalysisInput,
};

pub(super) type MemoryService = AnalysisService<MemoryRepository, MemoryBlobs, CannedOracle>;

pub(super) fn property_id() -> PropertyId {
    PropertyId("SP-0042".to_string())
}

pub(super) fn analyst() -> ActorId {
    ActorId("ana".to_string())
}

pub(super) fn rival() -> ActorId {
    ActorId("bruno".to_string())
}

pub(super) fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Judicial auction of 80 m² at 3 000/m², 3% ITBI, 2 000 registry, bid 100 000.
pub(super) fn sample_input() -> PropertyAnalysisInput {
    PropertyAnalysisInput {
        address: "Rua Augusta, 1200 - São Paulo".to_string(),
        auction_date: Some(day(2026, 10, 1)),
        modality: Modality::JudicialAuction,
        private_area: 80.0,
        itbi_rate: 3.0,
        comparables: vec![Comparable::new(
            "https://example.com/listing/1",
            300_000.0,
            100.0,
        )],
        registry_value: 2_000.0,
        initial_bid: 100_000.0,
        max_bid: 130_000.0,
        ..PropertyAnalysisInput::default()
    }
}

pub(super) fn build_service() -> (MemoryService, Arc<MemoryRepository>, Arc<MemoryBlobs>) {
    build_service_with_oracle(Arc::new(CannedOracle::default()))
}

pub(super) fn build_service_with_oracle(
    oracle: Arc<CannedOracle>,
) -> (MemoryService, Arc<MemoryRepository>, Arc<MemoryBlobs>) {
    let repository = Arc::new(MemoryRepository::default());
    let blobs = Arc::new(MemoryBlobs::default());
    let service = AnalysisService::new(
        repository.clone(),
        blobs.clone(),
        oracle,
        FeasibilityAssumptions::default(),
    );
    (service, repository, blobs)
}

/// Seeds a record directly in the store, bypassing the lifecycle.
pub(super) fn seed(
    repository: &MemoryRepository,
    status: AnalysisStatus,
    assignee: Option<ActorId>,
) -> AnalysisRecord {
    let mut record = AnalysisRecord::new(property_id(), sample_input());
    record.status = status;
    record.assignee = assignee;
    repository.insert(record).expect("seed record")
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<BTreeMap<PropertyId, AnalysisRecord>>>,
}

impl MemoryRepository {
    pub(super) fn stored(&self, id: &PropertyId) -> AnalysisRecord {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
            .expect("record present")
    }
}

impl AnalysisRepository for MemoryRepository {
    fn insert(&self, record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.property_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.property_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<AnalysisRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, mut record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let current = guard
            .get(&record.property_id)
            .ok_or(RepositoryError::NotFound)?;
        if current.revision != record.revision {
            return Err(RepositoryError::Conflict);
        }
        record.revision += 1;
        guard.insert(record.property_id.clone(), record.clone());
        Ok(record)
    }

    fn list(&self, status: Option<AnalysisStatus>) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| status.map_or(true, |status| record.status == status))
            .cloned()
            .collect())
    }
}

/// Lets a rival claim land between the service's read and its conditional write.
pub(super) struct RacingRepository {
    pub(super) inner: MemoryRepository,
    pub(super) winner: ActorId,
}

impl AnalysisRepository for RacingRepository {
    fn insert(&self, record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<AnalysisRecord>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update(&self, record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        let current = self.inner.stored(&record.property_id);
        if current.assignee.is_none() {
            let mut rival_claim = current;
            rival_claim.status = AnalysisStatus::InProgress;
            rival_claim.assignee = Some(self.winner.clone());
            self.inner.update(rival_claim)?;
        }
        self.inner.update(record)
    }

    fn list(&self, status: Option<AnalysisStatus>) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        self.inner.list(status)
    }
}

pub(super) struct UnavailableRepository;

impl AnalysisRepository for UnavailableRepository {
    fn insert(&self, _record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &PropertyId) -> Result<Option<AnalysisRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _status: Option<AnalysisStatus>) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryBlobs {
    stored: Mutex<Vec<(BlobId, Vec<u8>, String)>>,
    issued: AtomicUsize,
}

impl MemoryBlobs {
    pub(super) fn stored(&self) -> Vec<(BlobId, Vec<u8>, String)> {
        self.stored.lock().expect("blob mutex poisoned").clone()
    }
}

impl BlobStore for MemoryBlobs {
    fn store(&self, bytes: &[u8], content_type: &Mime) -> Result<BlobId, BlobError> {
        if bytes.is_empty() {
            return Err(BlobError::Empty);
        }
        let issued = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let id = BlobId(format!("blob-{issued}"));
        self.stored
            .lock()
            .expect("blob mutex poisoned")
            .push((id.clone(), bytes.to_vec(), content_type.to_string()));
        Ok(id)
    }

    fn discard(&self, id: &BlobId) -> Result<(), BlobError> {
        self.stored
            .lock()
            .expect("blob mutex poisoned")
            .retain(|(stored, _, _)| stored != id);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct CannedOracle {
    response: Option<PartialAnalysisInput>,
    calls: AtomicUsize,
}

impl CannedOracle {
    pub(super) fn returning(response: PartialAnalysisInput) -> Self {
        Self {
            response: Some(response),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExtractionOracle for CannedOracle {
    fn extract(&self, _source: &ExtractionSource) -> Option<PartialAnalysisInput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn analysis_router_with_service(service: MemoryService) -> axum::Router {
    analysis_router(Arc::new(service))
}
