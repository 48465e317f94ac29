use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};

/// What a scan should do with one reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmDecision {
    /// Arm now; the initial notification fires after `delay`.
    Arm { delay: Duration },
    /// Too far in the future; a later scan will pick it up.
    Defer,
}

/// Decide whether a reminder due at `due` should be armed at `now`.
///
/// Past-due reminders arm with a zero delay. Reminders due within `window`
/// arm with the remaining time as delay. Everything else is deferred.
pub fn decide(due: NaiveDateTime, now: NaiveDateTime, window: Duration) -> ArmDecision {
    let delta = due - now;
    if delta <= TimeDelta::zero() {
        return ArmDecision::Arm {
            delay: Duration::ZERO,
        };
    }
    let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
    if delta <= window {
        ArmDecision::Arm {
            delay: delta.to_std().unwrap_or_default(),
        }
    } else {
        ArmDecision::Defer
    }
}
