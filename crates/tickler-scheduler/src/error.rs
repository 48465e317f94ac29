use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The reminder store failed; the tick is abandoned and retried next period.
    #[error("store error: {0}")]
    Store(#[from] tickler_store::StoreError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
