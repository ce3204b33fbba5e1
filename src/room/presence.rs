use std::time::Duration;

use tokio::time::Instant;

use super::participant::ParticipantStatus;

/// Debounce window after the last edit before `coding` settles into
/// `working`
pub const TYPING_SETTLE: Duration = Duration::from_secs(2);
/// Inactivity window after the last activity signal before falling back
/// to `idle`
pub const IDLE_AFTER: Duration = Duration::from_secs(10);

/// Single-slot cancellable deadline. Each qualifying signal cancels and
/// restarts the window, so at most one deadline per purpose is ever
/// outstanding.
#[derive(Debug)]
struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Clears and reports an expired deadline
    fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Local participant status state machine: idle -> coding -> working ->
/// idle, plus a per-question terminal `submitted`.
///
/// The tracker is write-only toward the gateway: every returned
/// transition is meant to be published, and the tracker never reads
/// remote participant records back.
#[derive(Debug)]
pub struct PresenceTracker {
    status: ParticipantStatus,
    typing: Debounce,
    inactivity: Debounce,
    /// Set after a successful submission; suppresses automatic
    /// transitions until navigation to a not-yet-completed question
    suppressed: bool,
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self {
            status: ParticipantStatus::Idle,
            typing: Debounce::new(TYPING_SETTLE),
            inactivity: Debounce::new(IDLE_AFTER),
            suppressed: false,
        }
    }

    pub fn status(&self) -> ParticipantStatus {
        self.status
    }

    /// A code-edit event. Transitions to `coding` immediately if not
    /// already there, and restarts the typing settle window.
    pub fn on_edit(&mut self, now: Instant) -> Option<ParticipantStatus> {
        if self.suppressed {
            return None;
        }
        self.typing.arm(now);
        if self.status != ParticipantStatus::Coding {
            self.status = ParticipantStatus::Coding;
            return Some(self.status);
        }
        None
    }

    /// Any non-edit activity signal (pointer move, scroll). Restarts the
    /// inactivity window and surfaces `working` unless the participant is
    /// already coding or working.
    pub fn on_activity(&mut self, now: Instant) -> Option<ParticipantStatus> {
        if self.suppressed {
            return None;
        }
        self.inactivity.arm(now);
        if self.status != ParticipantStatus::Coding && self.status != ParticipantStatus::Working {
            self.status = ParticipantStatus::Working;
            return Some(self.status);
        }
        None
    }

    /// Fires any expired debounce windows. Returns the transitions to
    /// publish, in firing order.
    pub fn poll(&mut self, now: Instant) -> Vec<ParticipantStatus> {
        let mut transitions = Vec::new();
        if self.suppressed {
            return transitions;
        }

        if self.typing.fire_if_due(now) && self.status == ParticipantStatus::Coding {
            self.status = ParticipantStatus::Working;
            transitions.push(self.status);
        }
        if self.inactivity.fire_if_due(now) && self.status != ParticipantStatus::Idle {
            self.status = ParticipantStatus::Idle;
            transitions.push(self.status);
        }
        transitions
    }

    /// Earliest pending deadline, for the event loop's sleep
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.typing.deadline(), self.inactivity.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Forces `submitted` after a successful submission and suppresses
    /// automatic transitions until `resume` is called.
    pub fn mark_submitted(&mut self) -> ParticipantStatus {
        self.typing.cancel();
        self.inactivity.cancel();
        self.status = ParticipantStatus::Submitted;
        self.suppressed = true;
        self.status
    }

    /// Re-enables the coding/working/idle cycle after navigating to a
    /// not-yet-completed question
    pub fn resume(&mut self) {
        self.suppressed = false;
    }
}
