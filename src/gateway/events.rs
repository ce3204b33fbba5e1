use serde::{Deserialize, Serialize};

use crate::room::participant::{ParticipantSnapshot, ParticipantStatus};
use crate::room::question::Question;

/// Messages emitted by this client toward the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String, username: String },

    #[serde(rename_all = "camelCase")]
    UpdateStatus {
        room_id: String,
        username: String,
        status: ParticipantStatus,
    },

    /// Canonical submission tuple; the gateway computes the
    /// authoritative score from it
    #[serde(rename_all = "camelCase")]
    UpdateScore {
        room_id: String,
        question_index: usize,
        passed_test_cases: u32,
        wrong_attempts: u32,
        elapsed_minutes: u32,
    },

    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: String, username: String },
}

/// Messages pushed by the gateway to this client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    RoomQuestions { questions: Vec<Question> },

    ParticipantsUpdate {
        participants: Vec<ParticipantSnapshot>,
    },

    ScoreUpdated { scores: Vec<ScoreUpdate> },

    UserJoined { username: String },

    UserLeft { username: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub id: String,
    pub score: u32,
}
