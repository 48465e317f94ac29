use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use tickler_core::config::SchedulerConfig;
use tickler_core::transport::Transport;
use tickler_core::{OwnerId, Reminder, ReminderId};
use tickler_store::ReminderStore;

use crate::{
    dispatch::{DeliveryMode, DeliveryOutcome, Dispatcher},
    error::Result,
    policy::{decide, ArmDecision},
    registry::JobRegistry,
};

/// Counters for one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Newly armed this scan.
    pub armed: usize,
    /// Inside the window but already armed by an earlier scan.
    pub already_armed: usize,
    /// Outside the arming window.
    pub deferred: usize,
    /// Stored row could not be scheduled: unparseable due time or unreadable columns.
    pub faulted: usize,
}

/// Result of an acknowledgment (`done_<id>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The reminder was armed; it is now deleted and disarmed.
    Acknowledged,
    /// No armed job for this id; nothing was touched.
    NotArmed,
}

/// Owns the job registry and drives the periodic scan.
///
/// Every registry mutation goes through this type: the scan path arms, and
/// [`acknowledge`](Self::acknowledge) / [`retire`](Self::retire) disarm. Callers
/// outside the crate can only ask whether an id is armed.
pub struct Scheduler {
    store: Arc<ReminderStore>,
    registry: Arc<JobRegistry>,
    dispatcher: Arc<Dispatcher>,
    config: SchedulerConfig,
    /// Reminders that cannot be scheduled, with the reason.
    faults: Mutex<HashMap<ReminderId, String>>,
}

impl Scheduler {
    pub fn new(
        store: Arc<ReminderStore>,
        transport: Arc<dyn Transport>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        let dispatcher = Arc::new(Dispatcher::new(transport, Arc::clone(&store)));
        Arc::new(Self {
            store,
            registry: Arc::new(JobRegistry::new()),
            dispatcher,
            config,
            faults: Mutex::new(HashMap::new()),
        })
    }

    pub fn store(&self) -> &Arc<ReminderStore> {
        &self.store
    }

    pub fn is_armed(&self, id: ReminderId) -> bool {
        self.registry.is_armed(id)
    }

    pub fn armed_count(&self) -> usize {
        self.registry.len()
    }

    /// Reminders the scanner cannot schedule because their stored row is corrupt.
    pub fn faults(&self) -> Vec<ReminderId> {
        let faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<ReminderId> = faults.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Scan the store once and arm every reminder that is due or inside the window.
    pub fn scan(&self, now: NaiveDateTime) -> Result<ScanReport> {
        let pending = self.store.all_pending()?;
        let window = Duration::from_secs(self.config.arming_window_secs);
        let mut report = ScanReport::default();
        let mut seen_faults = Vec::new();

        for corrupt in &pending.corrupt {
            self.record_fault(corrupt.id, None, &corrupt.reason);
            seen_faults.push(corrupt.id);
            report.faulted += 1;
        }

        for reminder in &pending.reminders {
            let due = match reminder.due_time() {
                Ok(due) => due,
                Err(e) => {
                    self.record_fault(reminder.id, Some(reminder.owner), &e.to_string());
                    seen_faults.push(reminder.id);
                    report.faulted += 1;
                    continue;
                }
            };

            match decide(due, now, window) {
                ArmDecision::Defer => report.deferred += 1,
                ArmDecision::Arm { delay } => {
                    if self.arm(reminder, delay) {
                        report.armed += 1;
                        // A concurrent acknowledgment may have deleted the row
                        // after it was read above.
                        if self.store.get(reminder.id)?.is_none() {
                            self.registry.disarm(reminder.id);
                            report.armed -= 1;
                        }
                    } else {
                        report.already_armed += 1;
                    }
                }
            }
        }

        // Forget faults whose rows were fixed or deleted.
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, _| seen_faults.contains(id));

        Ok(report)
    }

    /// Acknowledge a delivered reminder: delete it and stop its follow-ups.
    ///
    /// Only armed reminders can be acknowledged; anything else is reported
    /// back untouched.
    pub fn acknowledge(&self, id: ReminderId) -> Result<AckOutcome> {
        if !self.registry.is_armed(id) {
            debug!(reminder_id = %id, "acknowledge: no armed job");
            return Ok(AckOutcome::NotArmed);
        }
        self.retire(id)?;
        info!(reminder_id = %id, "reminder acknowledged");
        Ok(AckOutcome::Acknowledged)
    }

    /// Delete a reminder and disarm it if armed. Returns `false` when the row
    /// was already gone.
    ///
    /// The row is deleted before the entry is disarmed: a scan that slips in
    /// between re-checks the store after arming, and a job that fires in
    /// between finds the row missing and sends nothing.
    pub fn retire(&self, id: ReminderId) -> Result<bool> {
        let deleted = self.store.delete(id)?;
        let disarmed = self.registry.disarm(id);
        debug!(reminder_id = %id, deleted, disarmed, "reminder retired");
        Ok(deleted)
    }

    /// Main loop. Scans every `tick_secs` until `shutdown` broadcasts `true`.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            tick_secs = self.config.tick_secs,
            arming_window_secs = self.config.arming_window_secs,
            follow_up_secs = self.config.follow_up_secs,
            "scheduler started"
        );

        let mut interval = tokio::time::interval(Duration::from_secs(self.config.tick_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.scan(Local::now().naive_local()) {
                        Ok(report) if report.armed > 0 || report.faulted > 0 => {
                            debug!(?report, "scan complete");
                        }
                        Ok(_) => {}
                        Err(e) => error!("scheduler tick error: {e}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let armed = self.registry.len();
        self.registry.clear();
        info!(disarmed = armed, "scheduler stopped");
    }

    // --- private helpers ---------------------------------------------------

    fn record_fault(&self, id: ReminderId, owner: Option<OwnerId>, reason: &str) {
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        if faults.insert(id, reason.to_string()).is_none() {
            error!(
                reminder_id = %id,
                owner = ?owner.map(|o| o.0),
                "cannot schedule reminder: {reason}"
            );
        } else {
            debug!(reminder_id = %id, "skipping unschedulable reminder");
        }
    }

    /// Arm one reminder. Returns `false` if it was already armed.
    fn arm(&self, reminder: &Reminder, delay: Duration) -> bool {
        let every = Duration::from_secs(self.config.follow_up_secs);
        let armed = self.registry.arm(reminder.id, |generation| {
            let job = Arc::new(FiringJob {
                reminder_id: reminder.id,
                owner: reminder.owner,
                text: reminder.text.clone(),
                generation,
                registry: Arc::clone(&self.registry),
                dispatcher: Arc::clone(&self.dispatcher),
            });

            let initial_job = Arc::clone(&job);
            let initial = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                initial_job.fire(DeliveryMode::Initial).await;
            });

            let follow_up = tokio::spawn(async move {
                let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if !job.fire(DeliveryMode::FollowUp).await {
                        break;
                    }
                }
            });

            (initial, follow_up)
        });

        if armed {
            info!(
                reminder_id = %reminder.id,
                owner = %reminder.owner,
                delay_secs = delay.as_secs(),
                "reminder armed"
            );
        }
        armed
    }
}

/// Payload shared by the initial and follow-up tasks of one armed reminder.
struct FiringJob {
    reminder_id: ReminderId,
    owner: OwnerId,
    text: String,
    generation: u64,
    registry: Arc<JobRegistry>,
    dispatcher: Arc<Dispatcher>,
}

impl FiringJob {
    /// Deliver once. Returns `false` when the schedule should stop.
    async fn fire(&self, mode: DeliveryMode) -> bool {
        match self
            .dispatcher
            .deliver(self.reminder_id, self.owner, &self.text, mode)
            .await
        {
            DeliveryOutcome::Sent | DeliveryOutcome::Failed { terminal: false } => true,
            DeliveryOutcome::Retired => {
                debug!(reminder_id = %self.reminder_id, "reminder gone at fire time; disarming");
                self.registry
                    .disarm_generation(self.reminder_id, self.generation);
                false
            }
            DeliveryOutcome::Failed { terminal: true } => {
                warn!(
                    reminder_id = %self.reminder_id,
                    owner = %self.owner,
                    "recipient unreachable; retiring reminder"
                );
                if let Err(e) = self.dispatcher.store().delete(self.reminder_id) {
                    error!(reminder_id = %self.reminder_id, error = %e, "failed to retire unreachable reminder");
                }
                self.registry
                    .disarm_generation(self.reminder_id, self.generation);
                false
            }
        }
    }
}
