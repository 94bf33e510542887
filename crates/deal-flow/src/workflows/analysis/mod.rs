//! Analysis record lifecycle: claiming a listing, saving the form with frozen metrics,
//! completing the analysis and the manager-side dispatch, sale and loss bookkeeping.

pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ActorId, AnalysisStatus, BlobId, ClientId, DocumentDescriptor, PropertyId, SaleOutcome,
};
pub use lifecycle::{ensure_transition, LifecycleError};
pub use repository::{
    AnalysisRecord, AnalysisRecordView, AnalysisRepository, BlobError, BlobStore,
    ExtractionOracle, ExtractionSource, RepositoryError,
};
pub use router::analysis_router;
pub use service::{AnalysisService, AnalysisServiceError, EditContext, PrefillOutcome};
