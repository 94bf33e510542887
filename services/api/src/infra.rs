use chrono::NaiveDate;
use deal_flow::workflows::analysis::{
    AnalysisRecord, AnalysisRepository, AnalysisStatus, BlobError, BlobId, BlobStore,
    ExtractionOracle, ExtractionSource, PropertyId, RepositoryError,
};
use deal_flow::workflows::feasibility::{lenient, MetricsCalculator, PartialAnalysisInput};
use metrics_exporter_prometheus::PrometheusHandle;
use mime::Mime;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) calculator: Arc<MetricsCalculator>,
    pub(crate) target_roi: f64,
}

/// Record store keyed by property, with the revision check and write under one lock.
#[derive(Default, Clone)]
pub(crate) struct InMemoryAnalysisRepository {
    records: Arc<Mutex<BTreeMap<PropertyId, AnalysisRecord>>>,
}

impl InMemoryAnalysisRepository {
    fn records(
        &self,
    ) -> Result<MutexGuard<'_, BTreeMap<PropertyId, AnalysisRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("record store lock poisoned".to_string()))
    }
}

impl AnalysisRepository for InMemoryAnalysisRepository {
    fn insert(&self, record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        let mut guard = self.records()?;
        if guard.contains_key(&record.property_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.property_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &PropertyId) -> Result<Option<AnalysisRecord>, RepositoryError> {
        Ok(self.records()?.get(id).cloned())
    }

    fn update(&self, mut record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        let mut guard = self.records()?;
        let stored_revision = guard
            .get(&record.property_id)
            .map(|current| current.revision)
            .ok_or(RepositoryError::NotFound)?;
        if stored_revision != record.revision {
            return Err(RepositoryError::Conflict);
        }

        record.revision += 1;
        guard.insert(record.property_id.clone(), record.clone());
        Ok(record)
    }

    fn list(&self, status: Option<AnalysisStatus>) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        Ok(self
            .records()?
            .values()
            .filter(|record| status.map_or(true, |status| record.status == status))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StoredBlob {
    pub(crate) bytes: Vec<u8>,
    pub(crate) content_type: String,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBlobStore {
    blobs: Arc<Mutex<HashMap<BlobId, StoredBlob>>>,
    issued: Arc<AtomicU64>,
}

impl InMemoryBlobStore {
    pub(crate) fn get(&self, id: &BlobId) -> Option<StoredBlob> {
        self.blobs.lock().ok()?.get(id).cloned()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn store(&self, bytes: &[u8], content_type: &Mime) -> Result<BlobId, BlobError> {
        if bytes.is_empty() {
            return Err(BlobError::Empty);
        }
        let mut guard = self
            .blobs
            .lock()
            .map_err(|_| BlobError::Unavailable("blob store lock poisoned".to_string()))?;

        let id = BlobId(format!(
            "blob-{:06}",
            self.issued.fetch_add(1, Ordering::Relaxed) + 1
        ));
        guard.insert(
            id.clone(),
            StoredBlob {
                bytes: bytes.to_vec(),
                content_type: content_type.essence_str().to_string(),
            },
        );
        Ok(id)
    }

    fn discard(&self, id: &BlobId) -> Result<(), BlobError> {
        self.blobs
            .lock()
            .map_err(|_| BlobError::Unavailable("blob store lock poisoned".to_string()))?
            .remove(id);
        Ok(())
    }
}

/// Accepts text sources carrying the JSON an upstream extractor produced. URLs and images
/// need a real extraction backend and yield nothing here.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StructuredTextOracle;

impl ExtractionOracle for StructuredTextOracle {
    fn extract(&self, source: &ExtractionSource) -> Option<PartialAnalysisInput> {
        match source {
            ExtractionSource::Text { text } => serde_json::from_str(text).ok(),
            ExtractionSource::Url { .. } | ExtractionSource::Image { .. } => None,
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    lenient::parse_date(raw)
        .ok_or_else(|| format!("failed to parse '{raw}' as YYYY-MM-DD or DD/MM/YYYY"))
}
