use std::sync::Arc;

use chrono::{Local, NaiveDate};
use mime::Mime;
use tracing::{info, warn};

use super::domain::{
    ActorId, AnalysisStatus, ClientId, DocumentDescriptor, PropertyId, SaleOutcome,
};
use super::lifecycle::{ensure_transition, LifecycleError};
use super::repository::{
    AnalysisRecord, AnalysisRepository, BlobError, BlobStore, ExtractionOracle, ExtractionSource,
    RepositoryError,
};
use crate::workflows::feasibility::{
    FeasibilityAssumptions, FeasibilityReport, MetricsCalculator, PropertyAnalysisInput,
};

/// Who is editing, and under which guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditContext {
    pub actor: ActorId,
    pub edit_mode: bool,
    /// Revision the caller last read; a mismatch is reported as a conflict.
    pub expected_revision: Option<u64>,
}

impl EditContext {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            edit_mode: false,
            expected_revision: None,
        }
    }

    pub fn with_edit_mode(mut self, edit_mode: bool) -> Self {
        self.edit_mode = edit_mode;
        self
    }

    pub fn at_revision(mut self, revision: u64) -> Self {
        self.expected_revision = Some(revision);
        self
    }
}

/// Result of an oracle prefill.
#[derive(Debug, Clone)]
pub struct PrefillOutcome {
    pub record: AnalysisRecord,
    pub applied_fields: Vec<&'static str>,
}

/// Service composing the record store, blob store, extraction oracle and calculator.
pub struct AnalysisService<R, B, X> {
    repository: Arc<R>,
    blobs: Arc<B>,
    oracle: Arc<X>,
    calculator: Arc<MetricsCalculator>,
}

impl<R, B, X> AnalysisService<R, B, X>
where
    R: AnalysisRepository + 'static,
    B: BlobStore + 'static,
    X: ExtractionOracle + 'static,
{
    pub fn new(
        repository: Arc<R>,
        blobs: Arc<B>,
        oracle: Arc<X>,
        assumptions: FeasibilityAssumptions,
    ) -> Self {
        Self {
            repository,
            blobs,
            oracle,
            calculator: Arc::new(MetricsCalculator::new(assumptions)),
        }
    }

    pub fn calculator(&self) -> &MetricsCalculator {
        &self.calculator
    }

    /// Register a fresh listing with an empty (or pre-seeded) form.
    pub fn register(
        &self,
        property_id: PropertyId,
        input: PropertyAnalysisInput,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        let stored = self
            .repository
            .insert(AnalysisRecord::new(property_id, input))?;
        info!(property_id = %stored.property_id, "property registered for analysis");
        Ok(stored)
    }

    pub fn get(&self, property_id: &PropertyId) -> Result<AnalysisRecord, AnalysisServiceError> {
        let record = self
            .repository
            .fetch(property_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Opportunities by status, e.g. analyzed records a manager is curating.
    pub fn list(
        &self,
        status: Option<AnalysisStatus>,
    ) -> Result<Vec<AnalysisRecord>, AnalysisServiceError> {
        Ok(self.repository.list(status)?)
    }

    /// Assign the property to `actor` if nobody holds it yet.
    pub fn claim(
        &self,
        property_id: &PropertyId,
        actor: &ActorId,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        let mut record = self.get(property_id)?;

        match &record.assignee {
            Some(current) if current == actor => return Ok(record),
            Some(current) => {
                warn!(%property_id, assignee = %current, claimant = %actor, "claim rejected");
                return Err(AnalysisServiceError::AlreadyClaimed {
                    property_id: property_id.clone(),
                    assignee: Some(current.clone()),
                });
            }
            None => {}
        }

        ensure_transition(record.status, AnalysisStatus::InProgress, None, today())?;
        record.assignee = Some(actor.clone());
        record.status = AnalysisStatus::InProgress;

        let stored = self.commit_claim(record)?;
        info!(%property_id, assignee = %actor, "property claimed");
        Ok(stored)
    }

    /// Persist the form together with the ROI and net profit frozen at the initial bid.
    pub fn save(
        &self,
        property_id: &PropertyId,
        context: &EditContext,
        input: PropertyAnalysisInput,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        let record = self.editable_record(property_id, context)?;
        self.persist_input(record, context, input)
    }

    /// Close the analysis as `Analyzed` or `Aborted`. Only the assignee can do this.
    pub fn complete(
        &self,
        property_id: &PropertyId,
        actor: &ActorId,
        outcome: AnalysisStatus,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        let mut record = self.get(property_id)?;
        if record.assignee.as_ref() != Some(actor) {
            return Err(AnalysisServiceError::NotAssignee {
                property_id: property_id.clone(),
                actor: actor.clone(),
            });
        }
        if !matches!(outcome, AnalysisStatus::Analyzed | AnalysisStatus::Aborted) {
            return Err(LifecycleError::InvalidTransition {
                from: record.status,
                to: outcome,
            }
            .into());
        }

        ensure_transition(record.status, outcome, record.input.auction_date, today())?;
        self.freeze_metrics(&mut record);
        record.status = outcome;

        let stored = self.repository.update(record)?;
        info!(%property_id, status = outcome.label(), "analysis completed");
        Ok(stored)
    }

    /// Offer an analyzed opportunity to an investor client.
    pub fn dispatch(
        &self,
        property_id: &PropertyId,
        client_id: ClientId,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        let mut record = self.get(property_id)?;
        if record.status != AnalysisStatus::Analyzed {
            return Err(LifecycleError::NotDispatchable {
                status: record.status,
            }
            .into());
        }

        if record.dispatched_to.contains(&client_id) {
            return Ok(record);
        }
        record.dispatched_to.push(client_id);

        let stored = self.repository.update(record)?;
        info!(%property_id, clients = stored.dispatched_to.len(), "opportunity dispatched");
        Ok(stored)
    }

    pub fn record_sale(
        &self,
        property_id: &PropertyId,
        sale: SaleOutcome,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        let mut record = self.get(property_id)?;
        ensure_transition(
            record.status,
            AnalysisStatus::Sold,
            record.input.auction_date,
            sale.sold_on,
        )?;
        record.status = AnalysisStatus::Sold;
        record.sale = Some(sale);

        let stored = self.repository.update(record)?;
        info!(%property_id, "sale recorded");
        Ok(stored)
    }

    /// Mark an analyzed opportunity as lost once its auction date has passed.
    pub fn mark_lost(
        &self,
        property_id: &PropertyId,
        today: NaiveDate,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        let mut record = self.get(property_id)?;
        ensure_transition(
            record.status,
            AnalysisStatus::Lost,
            record.input.auction_date,
            today,
        )?;
        record.status = AnalysisStatus::Lost;

        let stored = self.repository.update(record)?;
        info!(%property_id, "opportunity marked lost");
        Ok(stored)
    }

    /// Ask the extraction oracle for data and fill only the fields the analyst left empty.
    pub fn prefill(
        &self,
        property_id: &PropertyId,
        context: &EditContext,
        source: &ExtractionSource,
    ) -> Result<PrefillOutcome, AnalysisServiceError> {
        let record = self.editable_record(property_id, context)?;

        let Some(partial) = self.oracle.extract(source) else {
            info!(%property_id, "extraction returned no data");
            return Ok(PrefillOutcome {
                record,
                applied_fields: Vec::new(),
            });
        };

        let mut input = record.input.clone();
        let applied_fields = input.merge_missing(partial);
        if applied_fields.is_empty() {
            return Ok(PrefillOutcome {
                record,
                applied_fields,
            });
        }

        let record = self.persist_input(record, context, input)?;
        info!(%property_id, fields = applied_fields.len(), "form prefilled from extraction");
        Ok(PrefillOutcome {
            record,
            applied_fields,
        })
    }

    /// Store a supporting document and reference it from the record. If the record write
    /// fails the blob is discarded again, so a failed attach leaves nothing behind.
    pub fn attach_document(
        &self,
        property_id: &PropertyId,
        context: &EditContext,
        name: &str,
        bytes: &[u8],
        content_type: &Mime,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        let mut record = self.editable_record(property_id, context)?;
        let blob_id = self.blobs.store(bytes, content_type)?;

        record.documents.push(DocumentDescriptor {
            name: name.to_string(),
            blob_id: blob_id.clone(),
            content_type: content_type.essence_str().to_string(),
        });

        let stored = match self.repository.update(record) {
            Ok(stored) => stored,
            Err(error) => {
                if let Err(discard_error) = self.blobs.discard(&blob_id) {
                    warn!(
                        %property_id,
                        blob_id = %blob_id.0,
                        %discard_error,
                        "orphaned document blob"
                    );
                }
                return Err(error.into());
            }
        };
        info!(%property_id, document = name, "document attached");
        Ok(stored)
    }

    pub fn report(
        &self,
        property_id: &PropertyId,
        today: NaiveDate,
        target_roi: Option<f64>,
    ) -> Result<FeasibilityReport, AnalysisServiceError> {
        let record = self.get(property_id)?;
        Ok(FeasibilityReport::build(
            &self.calculator,
            &record.input,
            today,
            target_roi,
        ))
    }

    fn editable_record(
        &self,
        property_id: &PropertyId,
        context: &EditContext,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        let record = self.get(property_id)?;

        if let Some(expected) = context.expected_revision {
            if expected != record.revision {
                return Err(RepositoryError::Conflict.into());
            }
        }

        if !record.is_editable(&context.actor, context.edit_mode) {
            warn!(
                %property_id,
                actor = %context.actor,
                status = record.status.label(),
                "write to read-only analysis rejected"
            );
            return Err(AnalysisServiceError::ReadOnly {
                property_id: property_id.clone(),
                status: record.status,
            });
        }

        Ok(record)
    }

    /// Single conditional write of the form plus frozen metrics. A fresh record is claimed by
    /// the author in the same write.
    fn persist_input(
        &self,
        mut record: AnalysisRecord,
        context: &EditContext,
        input: PropertyAnalysisInput,
    ) -> Result<AnalysisRecord, AnalysisServiceError> {
        record.input = input;
        self.freeze_metrics(&mut record);

        let claiming = record.status == AnalysisStatus::NotStarted;
        if claiming {
            ensure_transition(record.status, AnalysisStatus::InProgress, None, today())?;
            record.status = AnalysisStatus::InProgress;
            record.assignee = Some(context.actor.clone());
        }

        let property_id = record.property_id.clone();
        let stored = if claiming {
            self.commit_claim(record)?
        } else {
            self.repository.update(record)?
        };

        info!(
            %property_id,
            actor = %context.actor,
            final_roi = ?stored.final_roi,
            "analysis saved"
        );
        Ok(stored)
    }

    fn freeze_metrics(&self, record: &mut AnalysisRecord) {
        let snapshot = self
            .calculator
            .compute(&record.input, record.input.initial_bid);
        record.final_roi = Some(snapshot.roi);
        record.final_net_profit = Some(snapshot.net_profit);
    }

    /// Conditional write that reports a lost race as `AlreadyClaimed` instead of retrying.
    fn commit_claim(&self, record: AnalysisRecord) -> Result<AnalysisRecord, AnalysisServiceError> {
        let property_id = record.property_id.clone();
        match self.repository.update(record) {
            Ok(stored) => Ok(stored),
            Err(RepositoryError::Conflict) => {
                let current = self.repository.fetch(&property_id)?;
                match current.and_then(|record| record.assignee) {
                    Some(assignee) => {
                        warn!(%property_id, %assignee, "claim lost to a concurrent writer");
                        Err(AnalysisServiceError::AlreadyClaimed {
                            property_id,
                            assignee: Some(assignee),
                        })
                    }
                    None => Err(RepositoryError::Conflict.into()),
                }
            }
            Err(other) => Err(other.into()),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Error raised by the analysis service.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisServiceError {
    #[error("property {property_id} is already claimed")]
    AlreadyClaimed {
        property_id: PropertyId,
        assignee: Option<ActorId>,
    },
    #[error("analysis for property {property_id} is read-only ({})", .status.label())]
    ReadOnly {
        property_id: PropertyId,
        status: AnalysisStatus,
    },
    #[error("{actor} is not the analyst assigned to property {property_id}")]
    NotAssignee {
        property_id: PropertyId,
        actor: ActorId,
    },
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Blob(#[from] BlobError),
}
