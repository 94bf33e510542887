use mime::Mime;
use serde::{Deserialize, Serialize};

use super::domain::{
    ActorId, AnalysisStatus, BlobId, ClientId, DocumentDescriptor, PropertyId, SaleOutcome,
};
use crate::workflows::feasibility::{
    MetricsCalculator, MetricsSnapshot, PartialAnalysisInput, PropertyAnalysisInput,
};

/// Stored analysis of one property: the raw form plus the two frozen metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub property_id: PropertyId,
    pub status: AnalysisStatus,
    pub assignee: Option<ActorId>,
    pub input: PropertyAnalysisInput,
    pub final_roi: Option<f64>,
    pub final_net_profit: Option<f64>,
    pub dispatched_to: Vec<ClientId>,
    pub sale: Option<SaleOutcome>,
    pub documents: Vec<DocumentDescriptor>,
    /// Bumped by the store on every successful update.
    pub revision: u64,
}

impl AnalysisRecord {
    pub fn new(property_id: PropertyId, input: PropertyAnalysisInput) -> Self {
        Self {
            property_id,
            status: AnalysisStatus::NotStarted,
            assignee: None,
            input,
            final_roi: None,
            final_net_profit: None,
            dispatched_to: Vec::new(),
            sale: None,
            documents: Vec::new(),
            revision: 0,
        }
    }

    /// Editable when fresh, when the assigned analyst is still working on it, or when a
    /// terminal record has edit mode engaged.
    pub fn is_editable(&self, actor: &ActorId, edit_mode: bool) -> bool {
        match self.status {
            AnalysisStatus::NotStarted => true,
            status if status.is_terminal() => edit_mode,
            _ => self.assignee.as_ref() == Some(actor),
        }
    }

    pub fn view(&self, calculator: &MetricsCalculator) -> AnalysisRecordView {
        AnalysisRecordView {
            property_id: self.property_id.clone(),
            status: self.status.label(),
            assignee: self.assignee.clone(),
            final_roi: self.final_roi,
            final_net_profit: self.final_net_profit,
            live_metrics: calculator.compute(&self.input, self.input.initial_bid),
            input: self.input.clone(),
            dispatched_to: self.dispatched_to.clone(),
            sale: self.sale.clone(),
            documents: self.documents.clone(),
            revision: self.revision,
        }
    }
}

/// Record store seam. `update` is a compare-and-set on `revision`.
pub trait AnalysisRepository: Send + Sync {
    fn insert(&self, record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError>;
    fn fetch(&self, id: &PropertyId) -> Result<Option<AnalysisRecord>, RepositoryError>;
    /// Persists `record` only if the stored revision equals `record.revision`, returning the
    /// stored copy with the next revision. A stale revision yields `Conflict` and writes nothing.
    fn update(&self, record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError>;
    fn list(&self, status: Option<AnalysisStatus>) -> Result<Vec<AnalysisRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record was modified concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Opaque document storage.
pub trait BlobStore: Send + Sync {
    fn store(&self, bytes: &[u8], content_type: &Mime) -> Result<BlobId, BlobError>;
    /// Removes a blob that no record references. Unknown ids are not an error.
    fn discard(&self, id: &BlobId) -> Result<(), BlobError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("blob storage unavailable: {0}")]
    Unavailable(String),
    #[error("refusing to store an empty document")]
    Empty,
}

/// Input handed to the extraction oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionSource {
    Text { text: String },
    Url { url: String },
    Image { bytes: Vec<u8>, content_type: String },
}

/// Best-effort structured extraction; `None` means nothing usable was found.
pub trait ExtractionOracle: Send + Sync {
    fn extract(&self, source: &ExtractionSource) -> Option<PartialAnalysisInput>;
}

/// Serialized view returned to API callers, with live metrics next to the frozen ones.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecordView {
    pub property_id: PropertyId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<ActorId>,
    pub final_roi: Option<f64>,
    pub final_net_profit: Option<f64>,
    pub live_metrics: MetricsSnapshot,
    pub input: PropertyAnalysisInput,
    pub dispatched_to: Vec<ClientId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale: Option<SaleOutcome>,
    pub documents: Vec<DocumentDescriptor>,
    pub revision: u64,
}
