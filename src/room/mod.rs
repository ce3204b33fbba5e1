pub mod navigation;
pub mod participant;
pub mod presence;
pub mod question;
pub mod scoring;
pub mod session;
pub mod timer;

pub use participant::{Participant, ParticipantSnapshot, ParticipantStatus};
pub use presence::PresenceTracker;
pub use question::{Difficulty, Question, TestCase};
pub use session::{CompletionSet, RunReport, RunRequest, SessionController, SessionNotice};
pub use timer::TimerBank;
