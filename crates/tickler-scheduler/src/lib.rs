//! `tickler-scheduler`: polling scanner, job registry and notification dispatch.
//!
//! # Overview
//!
//! The [`engine::Scheduler`] scans the reminder table every few seconds and arms
//! reminders that are due or about to be due. Arming spawns two tokio tasks per
//! reminder, tracked together in the [`registry::JobRegistry`]:
//!
//! | Job         | Fires                                         | Message suffix         |
//! |-------------|-----------------------------------------------|------------------------|
//! | initial     | once, at the due time (immediately if past)   | `Reminder (id)`        |
//! | follow-up   | every `follow_up_secs`, starting one interval after arming | `Reminder (id) Follow-Up` |
//!
//! Both stop when the reminder is acknowledged, deleted, or found missing at
//! fire time. Nothing about armed jobs is persisted: after a restart the next
//! scan re-arms whatever is still in the table.

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod policy;
pub mod registry;

pub use dispatch::{DeliveryMode, DeliveryOutcome, Dispatcher};
pub use engine::{AckOutcome, ScanReport, Scheduler};
pub use error::{Result, SchedulerError};
pub use registry::JobRegistry;
