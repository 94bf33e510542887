use chrono::NaiveDate;

use super::domain::AnalysisStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot move analysis from {} to {}", .from.label(), .to.label())]
    InvalidTransition {
        from: AnalysisStatus,
        to: AnalysisStatus,
    },
    #[error("auction date {auction_date:?} has not passed yet")]
    AuctionNotPassed { auction_date: Option<NaiveDate> },
    #[error("only analyzed opportunities can be dispatched (status {})", .status.label())]
    NotDispatchable { status: AnalysisStatus },
}

/// Validates a status change. `Lost` additionally requires the auction to be in the past.
pub fn ensure_transition(
    from: AnalysisStatus,
    to: AnalysisStatus,
    auction_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(), LifecycleError> {
    use AnalysisStatus::*;

    match (from, to) {
        (NotStarted, InProgress)
        | (InProgress, Analyzed)
        | (InProgress, Aborted)
        | (Analyzed, Sold) => Ok(()),
        (Analyzed, Lost) => match auction_date {
            Some(date) if date < today => Ok(()),
            _ => Err(LifecycleError::AuctionNotPassed { auction_date }),
        },
        _ => Err(LifecycleError::InvalidTransition { from, to }),
    }
}
