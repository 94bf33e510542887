use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an auction listing under analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Analyst or manager acting on a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

/// Investor client an opportunity can be dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

/// Opaque identifier returned by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobId(pub String);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    NotStarted,
    InProgress,
    Analyzed,
    Aborted,
    Sold,
    Lost,
}

impl AnalysisStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Analyzed => "analyzed",
            Self::Aborted => "aborted",
            Self::Sold => "sold",
            Self::Lost => "lost",
        }
    }

    /// Terminal records are read-only unless edit mode is engaged.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Analyzed | Self::Aborted | Self::Sold | Self::Lost)
    }
}

/// Outcome recorded when a manager closes a sale with an investor client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleOutcome {
    pub client_id: ClientId,
    pub sale_value: f64,
    pub sold_on: NaiveDate,
}

/// Supporting document (registry certificate, auction notice) attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub name: String,
    pub blob_id: BlobId,
    pub content_type: String,
}
