use std::collections::{BTreeSet, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::{Result, RoomError};
use crate::gateway::events::{ClientEvent, ServerEvent};
use crate::judge::{Language, RunVerdict};

use super::navigation;
use super::participant::{Participant, ParticipantStatus};
use super::presence::PresenceTracker;
use super::question::{sort_by_difficulty, Question, TestCase};
use super::scoring;
use super::timer::TimerBank;

/// Question indices the local participant has successfully submitted.
/// Append-only: the type exposes no removal.
#[derive(Debug, Default)]
pub struct CompletionSet(BTreeSet<usize>);

impl CompletionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize) {
        self.0.insert(index);
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Transient room happenings the UI may surface as a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    QuestionsLoaded(usize),
    UserJoined(String),
    UserLeft(String),
}

/// One execution request handed to the judge adapter
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source_code: String,
    pub language: Language,
    pub question_index: usize,
}

/// Result of applying a finished run to the session
#[derive(Debug)]
pub struct RunReport {
    pub passed: usize,
    pub total: usize,
    /// Judge-reported or connectivity failure, reported verbatim
    pub failure: Option<RoomError>,
    /// True when the result arrived for a question that is no longer
    /// current and was dropped without touching state
    pub discarded: bool,
}

/// Owner of all mutable cross-cutting session state: question list,
/// current index, per-question timers, completion set, cached test
/// results, presence, and the reconciled participant roster.
///
/// The controller is the only writer of this state. Gateway pushes are
/// applied atomically per event type; local operations are transactional,
/// fully applied or rejected without mutation.
pub struct SessionController {
    room_id: String,
    username: String,
    questions: Vec<Question>,
    current: usize,
    timers: TimerBank,
    completed: CompletionSet,
    /// Cached evaluation results for the current question only
    results: Vec<TestCase>,
    language: Language,
    wrong_attempts: HashMap<usize, u32>,
    in_flight_question: Option<usize>,
    presence: PresenceTracker,
    participants: Vec<Participant>,
    editor_code: String,
    initialized: bool,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    joined_at_ms: u64,
}

impl SessionController {
    pub fn new(
        room_id: String,
        username: String,
        language: Language,
        outbound: mpsc::UnboundedSender<ClientEvent>,
    ) -> Self {
        Self {
            room_id,
            username,
            questions: Vec::new(),
            current: 0,
            timers: TimerBank::new(),
            completed: CompletionSet::new(),
            results: Vec::new(),
            language,
            wrong_attempts: HashMap::new(),
            in_flight_question: None,
            presence: PresenceTracker::new(),
            participants: Vec::new(),
            editor_code: String::new(),
            initialized: false,
            outbound,
            joined_at_ms: now_ms(),
        }
    }

    // --- accessors -------------------------------------------------------

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Result<&Question> {
        if !self.initialized {
            return Err(RoomError::RoomNotInitialized);
        }
        self.questions
            .get(self.current)
            .ok_or_else(|| RoomError::internal("current index out of range"))
    }

    pub fn code(&self) -> &str {
        &self.editor_code
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn status(&self) -> ParticipantStatus {
        self.presence.status()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Participants ordered by authoritative score, highest first
    pub fn leaderboard(&self) -> Vec<&Participant> {
        let mut ranked: Vec<&Participant> = self.participants.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    pub fn results(&self) -> &[TestCase] {
        &self.results
    }

    pub fn completed(&self) -> &CompletionSet {
        &self.completed
    }

    pub fn remaining_secs(&self) -> Option<u32> {
        self.timers.remaining(self.current)
    }

    pub fn run_in_flight(&self) -> bool {
        self.in_flight_question.is_some()
    }

    pub fn next_presence_deadline(&self) -> Option<Instant> {
        self.presence.next_deadline()
    }

    // --- gateway push handling -------------------------------------------

    /// Applies one pushed gateway event as an atomic merge
    pub fn apply_server_event(&mut self, event: ServerEvent) -> Result<Option<SessionNotice>> {
        match event {
            ServerEvent::RoomQuestions { questions } => self.apply_room_questions(questions),
            ServerEvent::ParticipantsUpdate { participants } => {
                let previous = std::mem::take(&mut self.participants);
                self.participants = participants
                    .into_iter()
                    .map(|snapshot| {
                        let earlier = previous.iter().find(|p| p.id == snapshot.id);
                        Participant::from_snapshot(snapshot, earlier)
                    })
                    .collect();
                Ok(None)
            }
            ServerEvent::ScoreUpdated { scores } => {
                for update in scores {
                    if let Some(p) = self.participants.iter_mut().find(|p| p.id == update.id) {
                        p.score = update.score;
                    }
                }
                Ok(None)
            }
            ServerEvent::UserJoined { username } => Ok(Some(SessionNotice::UserJoined(username))),
            ServerEvent::UserLeft { username } => Ok(Some(SessionNotice::UserLeft(username))),
        }
    }

    /// Accepts the room's question set once; later `room-questions`
    /// pushes are ignored so an errant resend cannot wipe timers or the
    /// completion set mid-session.
    fn apply_room_questions(&mut self, mut questions: Vec<Question>) -> Result<Option<SessionNotice>> {
        if self.initialized {
            tracing::info!(
                room_id = %self.room_id,
                "Ignoring repeated room-questions event after initialization"
            );
            return Ok(None);
        }
        if questions.is_empty() {
            return Ok(None);
        }

        sort_by_difficulty(&mut questions);
        self.questions = questions;
        self.current = 0;
        let first = &self.questions[0];
        self.timers.start(0, first.difficulty);
        self.editor_code = first.boilerplate(self.language);
        self.results.clear();
        self.initialized = true;

        tracing::info!(
            room_id = %self.room_id,
            count = self.questions.len(),
            "Session initialized with question set"
        );
        Ok(Some(SessionNotice::QuestionsLoaded(self.questions.len())))
    }

    // --- timers ----------------------------------------------------------

    /// One-second cadence: advances the current question's countdown and
    /// refreshes every participant's elapsed-time display.
    pub fn tick(&mut self) -> Option<u32> {
        let now = now_ms();
        for p in &mut self.participants {
            p.refresh_time_spent(now);
        }

        if !self.initialized {
            return None;
        }
        Some(self.timers.tick(self.current, &self.completed))
    }

    // --- navigation ------------------------------------------------------

    pub fn handle_next(&mut self) -> Result<&Question> {
        if !self.initialized {
            return Err(RoomError::RoomNotInitialized);
        }
        navigation::check_advance(&self.timers, &self.completed, self.current)?;
        if self.current + 1 >= self.questions.len() {
            return Err(RoomError::internal("already at the last question"));
        }
        self.move_to(self.current + 1);
        self.current_question()
    }

    pub fn handle_previous(&mut self) -> Result<&Question> {
        if !self.initialized {
            return Err(RoomError::RoomNotInitialized);
        }
        navigation::check_go_back(&self.completed, self.current)?;
        self.move_to(self.current - 1);
        self.current_question()
    }

    fn move_to(&mut self, index: usize) {
        self.current = index;
        self.results.clear();

        let question = &self.questions[index];
        if !self.completed.contains(index) {
            self.timers.start(index, question.difficulty);
            self.presence.resume();
        }
        self.editor_code = question.boilerplate(self.language);
    }

    // --- editing and presence --------------------------------------------

    /// Switches the execution language and re-derives the editor
    /// boilerplate for the current question
    pub fn set_language(&mut self, language: Language) -> Result<()> {
        self.language = language;
        if self.initialized && !self.completed.contains(self.current) {
            self.editor_code = self.current_question()?.boilerplate(language);
            self.results.clear();
        }
        Ok(())
    }

    /// Appends a line of code. Editing is locked once the question is
    /// submitted.
    pub fn edit(&mut self, line: &str, now: Instant) -> Result<()> {
        if !self.initialized {
            return Err(RoomError::RoomNotInitialized);
        }
        if self.completed.contains(self.current) {
            return Err(RoomError::AlreadySubmitted(self.current));
        }
        if !self.editor_code.is_empty() {
            self.editor_code.push('\n');
        }
        self.editor_code.push_str(line);

        if let Some(status) = self.presence.on_edit(now) {
            self.publish_status(status);
        }
        Ok(())
    }

    /// Replaces the whole editor buffer (same locking as `edit`)
    pub fn set_code(&mut self, code: String, now: Instant) -> Result<()> {
        if !self.initialized {
            return Err(RoomError::RoomNotInitialized);
        }
        if self.completed.contains(self.current) {
            return Err(RoomError::AlreadySubmitted(self.current));
        }
        self.editor_code = code;
        if let Some(status) = self.presence.on_edit(now) {
            self.publish_status(status);
        }
        Ok(())
    }

    /// Non-edit user activity (navigation through the UI, scrolling)
    pub fn activity(&mut self, now: Instant) {
        if let Some(status) = self.presence.on_activity(now) {
            self.publish_status(status);
        }
    }

    /// Fires due presence debounces and publishes the transitions
    pub fn poll_presence(&mut self, now: Instant) -> Vec<ParticipantStatus> {
        let transitions = self.presence.poll(now);
        for status in &transitions {
            self.publish_status(*status);
        }
        transitions
    }

    fn publish_status(&self, status: ParticipantStatus) {
        let event = ClientEvent::UpdateStatus {
            room_id: self.room_id.clone(),
            username: self.username.clone(),
            status,
        };
        if self.outbound.send(event).is_err() {
            tracing::warn!("Gateway channel closed, dropping status update");
        }
    }

    // --- running code ----------------------------------------------------

    /// Starts an execution run for the current question. At most one run
    /// may be in flight at a time.
    pub fn begin_run(&mut self) -> Result<RunRequest> {
        let index = self.current;
        let question = self.current_question()?;
        if self.completed.contains(index) {
            return Err(RoomError::AlreadySubmitted(index));
        }
        if self.in_flight_question.is_some() {
            return Err(RoomError::RunInFlight);
        }
        if question.test_cases.is_empty() {
            return Err(RoomError::MalformedQuestion(index));
        }

        self.in_flight_question = Some(index);
        Ok(RunRequest {
            source_code: self.editor_code.clone(),
            language: self.language,
            question_index: index,
        })
    }

    /// Applies a finished run: caches per-test-case results for the
    /// current question, or drops them if the participant has since moved
    /// on. A completed run that is not a full pass counts as one wrong
    /// attempt; transport failures do not.
    pub fn apply_run(&mut self, verdict: RunVerdict) -> Result<RunReport> {
        let index = self
            .in_flight_question
            .take()
            .ok_or_else(|| RoomError::internal("no run in flight"))?;

        if index != self.current {
            tracing::info!(
                question_index = index,
                current = self.current,
                "Dropping run result for a question that is no longer current"
            );
            return Ok(RunReport {
                passed: 0,
                total: 0,
                failure: None,
                discarded: true,
            });
        }

        let question = &self.questions[index];
        let total = question.test_cases.len();

        let (flags, failure) = match verdict {
            RunVerdict::Accepted { passed } => {
                let flags: Vec<bool> = (0..total)
                    .map(|i| passed.get(i).copied().unwrap_or(false))
                    .collect();
                (flags, None)
            }
            RunVerdict::CompileError(diag) => {
                (vec![false; total], Some(RoomError::CompileError(diag)))
            }
            RunVerdict::RuntimeError(diag) => {
                (vec![false; total], Some(RoomError::RuntimeError(diag)))
            }
            RunVerdict::Rejected(diag) => (vec![false; total], Some(RoomError::JudgeRejected(diag))),
            RunVerdict::Unreachable(diag) => {
                tracing::warn!(error = %diag, "Run failed before reaching the judge");
                (vec![false; total], Some(RoomError::JudgeUnreachable(diag)))
            }
        };

        let passed_count = flags.iter().filter(|&&p| p).count();
        let full_pass = total > 0 && passed_count == total;
        let connectivity = matches!(failure, Some(RoomError::JudgeUnreachable(_)));
        if !full_pass && !connectivity {
            *self.wrong_attempts.entry(index).or_insert(0) += 1;
        }

        self.results = question
            .test_cases
            .iter()
            .zip(flags.iter())
            .map(|(case, &passed)| TestCase {
                input: case.input.clone(),
                expected_output: case.expected_output.clone(),
                passed: Some(passed),
            })
            .collect();

        Ok(RunReport {
            passed: passed_count,
            total,
            failure,
            discarded: false,
        })
    }

    // --- submission ------------------------------------------------------

    /// Submits the current question. Requires every cached test result to
    /// be passing; on acceptance the canonical submission tuple goes to
    /// the gateway, the question joins the completion set, its timer is
    /// frozen, and presence becomes `submitted`. Returns the advisory
    /// local score estimate.
    pub fn submit_code(&mut self) -> Result<u32> {
        let index = self.current;
        let difficulty = self.current_question()?.difficulty;
        if self.completed.contains(index) {
            return Err(RoomError::AlreadySubmitted(index));
        }
        if self.in_flight_question.is_some() {
            return Err(RoomError::RunInFlight);
        }
        let all_passed =
            !self.results.is_empty() && self.results.iter().all(|tc| tc.passed == Some(true));
        if !all_passed {
            return Err(RoomError::TestsNotPassing);
        }

        let passed_count = self.results.len() as u32;
        let total = passed_count;
        let wrong_attempts = self.wrong_attempts.get(&index).copied().unwrap_or(0);
        let elapsed_minutes = self.local_elapsed_minutes();

        let estimate = scoring::score(
            difficulty,
            passed_count,
            total,
            wrong_attempts,
            elapsed_minutes,
        );
        tracing::info!(
            question_index = index,
            local_estimate = estimate,
            elapsed_minutes,
            wrong_attempts,
            "Submitting question"
        );

        let event = ClientEvent::UpdateScore {
            room_id: self.room_id.clone(),
            question_index: index,
            passed_test_cases: passed_count,
            wrong_attempts,
            elapsed_minutes,
        };
        if self.outbound.send(event).is_err() {
            tracing::warn!("Gateway channel closed, dropping score submission");
        }

        self.completed.insert(index);
        self.timers.freeze(index);
        let status = self.presence.mark_submitted();
        self.publish_status(status);

        // Advisory display value only; the authoritative score arrives
        // from the gateway via score-updated
        let username = self.username.clone();
        if let Some(me) = self.participants.iter_mut().find(|p| p.name == username) {
            me.local_estimate = Some(estimate);
        }

        Ok(estimate)
    }

    /// Whole minutes since this participant joined, from the gateway's
    /// join timestamp when available, else the local join clock
    fn local_elapsed_minutes(&self) -> u32 {
        let now = now_ms();
        self.participants
            .iter()
            .find(|p| p.name == self.username)
            .map(|p| p.elapsed_minutes(now))
            .unwrap_or_else(|| ((now.saturating_sub(self.joined_at_ms)) / 60_000) as u32)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
