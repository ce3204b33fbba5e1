use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Coarse live status of a participant, published to the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Idle,
    Coding,
    Working,
    Submitted,
}

impl ParticipantStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ParticipantStatus::Idle => "Idle",
            ParticipantStatus::Coding => "Coding...",
            ParticipantStatus::Working => "Working on it...",
            ParticipantStatus::Submitted => "Submitted",
        }
    }
}

/// One participant's record as held locally. The gateway owns the volatile
/// fields (`status`, `score`); `time_spent` and `local_estimate` are
/// local-only display state preserved across gateway snapshots.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub status: ParticipantStatus,
    /// Authoritative cumulative score, written only from gateway pushes
    pub score: u32,
    /// Advisory local scoring estimate, never merged into `score`
    pub local_estimate: Option<u32>,
    /// Join timestamp in epoch milliseconds, as reported by the gateway
    pub join_time: Option<u64>,
    /// Locally derived elapsed-time display string (mm:ss)
    pub time_spent: String,
    pub scores_per_question: HashMap<String, u32>,
}

/// Volatile participant fields as pushed by the gateway in a
/// `participants-update` snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSnapshot {
    pub id: String,
    pub name: String,
    pub status: ParticipantStatus,
    #[serde(default)]
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_time: Option<u64>,
    #[serde(default)]
    pub scores_per_question: HashMap<String, u32>,
}

impl Participant {
    /// Builds a record from a gateway snapshot, carrying over local-only
    /// display state from the previous record for the same id
    pub fn from_snapshot(snapshot: ParticipantSnapshot, previous: Option<&Participant>) -> Self {
        Participant {
            id: snapshot.id,
            name: snapshot.name,
            status: snapshot.status,
            score: snapshot.score,
            local_estimate: previous.and_then(|p| p.local_estimate),
            join_time: snapshot.join_time,
            time_spent: previous
                .map(|p| p.time_spent.clone())
                .unwrap_or_else(|| "00:00".to_string()),
            scores_per_question: snapshot.scores_per_question,
        }
    }

    /// Refreshes the elapsed-time display from the join timestamp
    pub fn refresh_time_spent(&mut self, now_ms: u64) {
        self.time_spent = match self.join_time {
            Some(joined) if now_ms >= joined => format_elapsed((now_ms - joined) / 1000),
            _ => "00:00".to_string(),
        };
    }

    /// Whole minutes elapsed since this participant joined
    pub fn elapsed_minutes(&self, now_ms: u64) -> u32 {
        match self.join_time {
            Some(joined) if now_ms >= joined => ((now_ms - joined) / 60_000) as u32,
            _ => 0,
        }
    }
}

/// Formats whole seconds as mm:ss
pub fn format_elapsed(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, score: u32) -> ParticipantSnapshot {
        ParticipantSnapshot {
            id: id.to_string(),
            name: id.to_string(),
            status: ParticipantStatus::Idle,
            score,
            join_time: Some(0),
            scores_per_question: HashMap::new(),
        }
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(59), "00:59");
        assert_eq!(format_elapsed(60), "01:00");
        assert_eq!(format_elapsed(3 * 60 + 7), "03:07");
    }

    #[test]
    fn test_snapshot_preserves_local_state() {
        let mut first = Participant::from_snapshot(snapshot("a", 0), None);
        assert_eq!(first.time_spent, "00:00");
        first.time_spent = "02:30".to_string();
        first.local_estimate = Some(100);

        let merged = Participant::from_snapshot(snapshot("a", 50), Some(&first));
        assert_eq!(merged.score, 50);
        assert_eq!(merged.time_spent, "02:30");
        assert_eq!(merged.local_estimate, Some(100));
    }

    #[test]
    fn test_refresh_and_elapsed_minutes() {
        let mut p = Participant::from_snapshot(snapshot("a", 0), None);
        p.join_time = Some(10_000);
        p.refresh_time_spent(10_000 + 3 * 60_000 + 5_000);
        assert_eq!(p.time_spent, "03:05");
        assert_eq!(p.elapsed_minutes(10_000 + 3 * 60_000 + 5_000), 3);

        // Clock skew: join timestamp in the future yields zero, not underflow
        p.join_time = Some(u64::MAX);
        p.refresh_time_spent(0);
        assert_eq!(p.time_spent, "00:00");
        assert_eq!(p.elapsed_minutes(0), 0);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ParticipantStatus::Working).unwrap(),
            "\"working\""
        );
        let status: ParticipantStatus = serde_json::from_str("\"submitted\"").unwrap();
        assert_eq!(status, ParticipantStatus::Submitted);
    }
}
