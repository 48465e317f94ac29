//! Notification dispatcher: turns a fired job into a transport message.

use std::sync::Arc;

use tracing::{info, warn};

use tickler_core::action::Action;
use tickler_core::transport::{Button, Transport};
use tickler_core::{OwnerId, ReminderId};
use tickler_store::ReminderStore;

/// Which of the two jobs is firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Initial,
    FollowUp,
}

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    /// The reminder no longer exists; nothing was sent.
    Retired,
    /// The transport refused the message. `terminal` means retrying is pointless.
    Failed { terminal: bool },
}

/// Sends initial and follow-up notifications with a `Done` button.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    store: Arc<ReminderStore>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<ReminderStore>) -> Self {
        Self { transport, store }
    }

    pub fn store(&self) -> &ReminderStore {
        &self.store
    }

    /// Deliver one notification.
    ///
    /// Re-reads the store first so a job that outlived its reminder sends
    /// nothing. A store error does not block delivery: a duplicate nag is
    /// better than a missed one.
    pub async fn deliver(
        &self,
        reminder_id: ReminderId,
        owner: OwnerId,
        text: &str,
        mode: DeliveryMode,
    ) -> DeliveryOutcome {
        match self.store.get(reminder_id) {
            Ok(Some(_)) => {}
            Ok(None) => return DeliveryOutcome::Retired,
            Err(e) => {
                warn!(reminder_id = %reminder_id, error = %e, "fire-time store check failed; delivering anyway");
            }
        }

        let body = render(reminder_id, text, mode);
        let buttons = [Button::action("Done", Action::Done(reminder_id).encode())];

        match self.transport.send(owner, &body, &buttons).await {
            Ok(_) => {
                info!(reminder_id = %reminder_id, owner = %owner, ?mode, "reminder delivered");
                DeliveryOutcome::Sent
            }
            Err(e) => {
                warn!(reminder_id = %reminder_id, owner = %owner, ?mode, error = %e, "reminder delivery failed");
                DeliveryOutcome::Failed {
                    terminal: e.is_terminal(),
                }
            }
        }
    }
}

/// Notification body: the reminder text plus an id line.
pub fn render(reminder_id: ReminderId, text: &str, mode: DeliveryMode) -> String {
    match mode {
        DeliveryMode::Initial => format!("{text}\nReminder ({reminder_id})"),
        DeliveryMode::FollowUp => format!("{text}\nReminder ({reminder_id}) Follow-Up"),
    }
}
