use thiserror::Error;

use tickler_core::transport::TransportError;

/// Errors that abort handling of one inbound event.
///
/// User mistakes (bad dates, unknown buttons) are not errors: they get a reply.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("store error: {0}")]
    Store(#[from] tickler_store::StoreError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] tickler_scheduler::SchedulerError),

    #[error("reply failed: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, RouterError>;
