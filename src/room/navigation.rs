use crate::error::{Result, RoomError};

use super::session::CompletionSet;
use super::timer::TimerBank;

/// Navigation is strictly adjacent-index. Forward movement requires the
/// current question's clock to have run out or the question to have been
/// submitted; backward movement may only revisit a not-yet-completed
/// earlier question.
pub fn can_advance(timers: &TimerBank, completed: &CompletionSet, index: usize) -> bool {
    timers.is_expired(index) || completed.contains(index)
}

pub fn can_go_back(completed: &CompletionSet, index: usize) -> bool {
    index > 0 && !completed.contains(index - 1)
}

/// Guard for `handle_next`: a denial is a user-facing rejection, never a
/// crash, and mutates nothing.
pub fn check_advance(timers: &TimerBank, completed: &CompletionSet, index: usize) -> Result<()> {
    if can_advance(timers, completed, index) {
        Ok(())
    } else {
        Err(RoomError::CannotAdvance)
    }
}

/// Guard for `handle_previous`
pub fn check_go_back(completed: &CompletionSet, index: usize) -> Result<()> {
    if can_go_back(completed, index) {
        Ok(())
    } else {
        Err(RoomError::CannotGoBack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::question::Difficulty;

    #[test]
    fn test_forward_blocked_while_timer_running() {
        let mut timers = TimerBank::new();
        let completed = CompletionSet::new();
        timers.start(0, Difficulty::Easy);

        assert!(!can_advance(&timers, &completed, 0));
        assert!(matches!(
            check_advance(&timers, &completed, 0),
            Err(RoomError::CannotAdvance)
        ));
    }

    #[test]
    fn test_forward_allowed_on_expiry() {
        let mut timers = TimerBank::new();
        let completed = CompletionSet::new();
        timers.start(0, Difficulty::Easy);
        timers.freeze(0);

        assert!(can_advance(&timers, &completed, 0));
    }

    #[test]
    fn test_forward_allowed_on_completion() {
        let mut timers = TimerBank::new();
        let mut completed = CompletionSet::new();
        timers.start(0, Difficulty::Hard);
        completed.insert(0);

        assert!(can_advance(&timers, &completed, 0));
    }

    #[test]
    fn test_backward_from_first_question_rejected() {
        let completed = CompletionSet::new();
        assert!(!can_go_back(&completed, 0));
        assert!(matches!(
            check_go_back(&completed, 0),
            Err(RoomError::CannotGoBack)
        ));
    }

    #[test]
    fn test_backward_into_completed_question_rejected() {
        let mut completed = CompletionSet::new();
        completed.insert(0);
        assert!(!can_go_back(&completed, 1));
    }

    #[test]
    fn test_backward_into_open_question_allowed() {
        let completed = CompletionSet::new();
        assert!(can_go_back(&completed, 1));
        assert!(check_go_back(&completed, 1).is_ok());
    }
}
