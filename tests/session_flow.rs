// End-to-end session controller scenarios, driven purely through gateway
// events and local operations

use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::Instant;

use coderoom::error::RoomError;
use coderoom::gateway::{ClientEvent, ScoreUpdate, ServerEvent};
use coderoom::judge::{Language, RunVerdict};
use coderoom::room::participant::ParticipantSnapshot;
use coderoom::room::{Difficulty, ParticipantStatus, Question, SessionController, SessionNotice};

fn question(title: &str, difficulty: Difficulty, cases: usize) -> Question {
    serde_json::from_value(json!({
        "_id": title,
        "title": title,
        "description": "d",
        "difficulty": format!("{:?}", difficulty),
        "testCases": (0..cases)
            .map(|i| json!({"input": [i], "expectedOutput": i}))
            .collect::<Vec<_>>(),
    }))
    .unwrap()
}

fn controller() -> (SessionController, mpsc::UnboundedReceiver<ClientEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session =
        SessionController::new("123456".to_string(), "ada".to_string(), Language::Python, tx);
    (session, rx)
}

fn init(session: &mut SessionController, questions: Vec<Question>) {
    let notice = session
        .apply_server_event(ServerEvent::RoomQuestions { questions })
        .unwrap();
    assert!(matches!(notice, Some(SessionNotice::QuestionsLoaded(_))));
}

fn drain(rx: &mut mpsc::UnboundedReceiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn run_all_passing(session: &mut SessionController, cases: usize) {
    session.begin_run().unwrap();
    let report = session
        .apply_run(RunVerdict::Accepted {
            passed: vec![true; cases],
        })
        .unwrap();
    assert_eq!(report.passed, cases);
    assert!(report.failure.is_none());
}

#[tokio::test]
async fn questions_arrive_sorted_and_initialize_once() {
    let (mut session, _rx) = controller();
    init(
        &mut session,
        vec![
            question("hard", Difficulty::Hard, 2),
            question("easy", Difficulty::Easy, 2),
            question("medium", Difficulty::Medium, 2),
        ],
    );

    assert_eq!(session.current_index(), 0);
    assert_eq!(session.current_question().unwrap().title, "easy");
    assert_eq!(
        session.remaining_secs(),
        Some(Difficulty::Easy.duration_secs())
    );
    assert_eq!(session.code(), "# Write your solution here");

    // A repeated push must not reset the running session
    session.tick();
    let notice = session
        .apply_server_event(ServerEvent::RoomQuestions {
            questions: vec![question("replacement", Difficulty::Easy, 1)],
        })
        .unwrap();
    assert!(notice.is_none());
    assert_eq!(session.current_question().unwrap().title, "easy");
    assert_eq!(
        session.remaining_secs(),
        Some(Difficulty::Easy.duration_secs() - 1)
    );
}

#[tokio::test]
async fn full_pass_submission_locks_question_and_publishes_score() {
    let (mut session, mut rx) = controller();
    init(&mut session, vec![question("easy", Difficulty::Easy, 3)]);
    drain(&mut rx);

    run_all_passing(&mut session, 3);
    assert!(session.results().iter().all(|tc| tc.passed == Some(true)));

    // Full pass at minute zero with no wrong attempts scores the base
    let estimate = session.submit_code().unwrap();
    assert_eq!(estimate, 100);

    assert!(session.completed().contains(0));
    assert_eq!(session.remaining_secs(), Some(0));
    assert_eq!(session.status(), ParticipantStatus::Submitted);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        ClientEvent::UpdateScore {
            question_index: 0,
            passed_test_cases: 3,
            wrong_attempts: 0,
            ..
        }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        ClientEvent::UpdateStatus {
            status: ParticipantStatus::Submitted,
            ..
        }
    )));

    // Resubmitting the same question is rejected
    assert!(matches!(
        session.submit_code(),
        Err(RoomError::AlreadySubmitted(0))
    ));
}

#[tokio::test]
async fn forward_navigation_blocked_until_completion_or_expiry() {
    let (mut session, _rx) = controller();
    init(
        &mut session,
        vec![
            question("q1", Difficulty::Easy, 1),
            question("q2", Difficulty::Easy, 1),
        ],
    );

    assert!(matches!(
        session.handle_next(),
        Err(RoomError::CannotAdvance)
    ));
    assert_eq!(session.current_index(), 0);

    run_all_passing(&mut session, 1);
    session.submit_code().unwrap();

    let next = session.handle_next().unwrap();
    assert_eq!(next.title, "q2");
    assert_eq!(session.current_index(), 1);
    // The new question gets its own fresh clock and a clean result cache
    assert_eq!(
        session.remaining_secs(),
        Some(Difficulty::Easy.duration_secs())
    );
    assert!(session.results().is_empty());
}

#[tokio::test]
async fn backward_navigation_refuses_completed_questions() {
    let (mut session, _rx) = controller();
    init(
        &mut session,
        vec![
            question("q1", Difficulty::Easy, 1),
            question("q2", Difficulty::Easy, 1),
        ],
    );

    assert!(matches!(
        session.handle_previous(),
        Err(RoomError::CannotGoBack)
    ));

    run_all_passing(&mut session, 1);
    session.submit_code().unwrap();
    session.handle_next().unwrap();

    assert!(matches!(
        session.handle_previous(),
        Err(RoomError::CannotGoBack)
    ));
    assert_eq!(session.current_index(), 1);
}

#[tokio::test]
async fn failed_run_blocks_submission_and_counts_a_wrong_attempt() {
    let (mut session, _rx) = controller();
    init(&mut session, vec![question("easy", Difficulty::Easy, 2)]);

    session.begin_run().unwrap();
    let report = session
        .apply_run(RunVerdict::RuntimeError("segfault".to_string()))
        .unwrap();
    assert_eq!(report.passed, 0);
    assert!(matches!(report.failure, Some(RoomError::RuntimeError(_))));
    assert!(session.results().iter().all(|tc| tc.passed == Some(false)));

    assert!(matches!(
        session.submit_code(),
        Err(RoomError::TestsNotPassing)
    ));

    // The wrong attempt shows up as a 10% penalty on the next full pass
    run_all_passing(&mut session, 2);
    assert_eq!(session.submit_code().unwrap(), 90);
}

#[tokio::test]
async fn unreachable_judge_is_not_a_wrong_attempt() {
    let (mut session, _rx) = controller();
    init(&mut session, vec![question("easy", Difficulty::Easy, 2)]);

    session.begin_run().unwrap();
    let report = session
        .apply_run(RunVerdict::Unreachable("connection refused".to_string()))
        .unwrap();
    assert!(matches!(
        report.failure,
        Some(RoomError::JudgeUnreachable(_))
    ));

    run_all_passing(&mut session, 2);
    assert_eq!(session.submit_code().unwrap(), 100);
}

#[tokio::test]
async fn partial_pass_blocks_submission() {
    let (mut session, _rx) = controller();
    init(&mut session, vec![question("easy", Difficulty::Easy, 3)]);

    session.begin_run().unwrap();
    let report = session
        .apply_run(RunVerdict::Accepted {
            passed: vec![true, false, true],
        })
        .unwrap();
    assert_eq!(report.passed, 2);
    assert!(report.failure.is_none());

    assert!(matches!(
        session.submit_code(),
        Err(RoomError::TestsNotPassing)
    ));
}

#[tokio::test]
async fn only_one_run_in_flight() {
    let (mut session, _rx) = controller();
    init(&mut session, vec![question("easy", Difficulty::Easy, 1)]);

    session.begin_run().unwrap();
    assert!(matches!(session.begin_run(), Err(RoomError::RunInFlight)));
    assert!(matches!(session.submit_code(), Err(RoomError::RunInFlight)));

    session
        .apply_run(RunVerdict::Accepted { passed: vec![true] })
        .unwrap();
    assert!(session.begin_run().is_ok());
}

#[tokio::test]
async fn participants_merge_preserves_local_display_state() {
    let (mut session, _rx) = controller();
    init(&mut session, vec![question("easy", Difficulty::Easy, 1)]);

    let snapshot = |score: u32| ParticipantSnapshot {
        id: "p1".to_string(),
        name: "ada".to_string(),
        status: ParticipantStatus::Idle,
        score,
        join_time: Some(0),
        scores_per_question: Default::default(),
    };

    session
        .apply_server_event(ServerEvent::ParticipantsUpdate {
            participants: vec![snapshot(0)],
        })
        .unwrap();

    run_all_passing(&mut session, 1);
    session.submit_code().unwrap();
    assert!(session.participants()[0].local_estimate.is_some());

    // A later roster snapshot carries the estimate forward
    session
        .apply_server_event(ServerEvent::ParticipantsUpdate {
            participants: vec![snapshot(80)],
        })
        .unwrap();
    assert_eq!(session.participants()[0].score, 80);
    assert!(session.participants()[0].local_estimate.is_some());

    // score-updated patches the authoritative score in place
    session
        .apply_server_event(ServerEvent::ScoreUpdated {
            scores: vec![ScoreUpdate {
                id: "p1".to_string(),
                score: 100,
            }],
        })
        .unwrap();
    assert_eq!(session.participants()[0].score, 100);
}

#[tokio::test]
async fn stale_run_result_is_discarded() {
    let (mut session, _rx) = controller();
    init(
        &mut session,
        vec![
            question("q1", Difficulty::Easy, 1),
            question("q2", Difficulty::Easy, 1),
        ],
    );

    session.begin_run().unwrap();
    // The timer runs out while the judge is busy, and the participant
    // moves on before the verdict lands
    for _ in 0..Difficulty::Easy.duration_secs() {
        session.tick();
    }
    session.handle_next().unwrap();

    let report = session
        .apply_run(RunVerdict::Accepted { passed: vec![true] })
        .unwrap();
    assert!(report.discarded);
    assert!(session.results().is_empty());
    assert!(!session.completed().contains(0));
}

#[tokio::test]
async fn presence_transitions_publish_status_updates() {
    let (mut session, mut rx) = controller();
    init(&mut session, vec![question("easy", Difficulty::Easy, 1)]);
    drain(&mut rx);

    let t0 = Instant::now();
    session.edit("x = 1", t0).unwrap();
    assert_eq!(session.status(), ParticipantStatus::Coding);

    let transitions = session.poll_presence(t0 + std::time::Duration::from_secs(2));
    assert_eq!(transitions, vec![ParticipantStatus::Working]);

    let events = drain(&mut rx);
    let statuses: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ClientEvent::UpdateStatus { status, .. } => Some(*status),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![ParticipantStatus::Coding, ParticipantStatus::Working]
    );
}

#[tokio::test]
async fn editing_locked_after_submission() {
    let (mut session, _rx) = controller();
    init(&mut session, vec![question("easy", Difficulty::Easy, 1)]);

    run_all_passing(&mut session, 1);
    session.submit_code().unwrap();

    assert!(matches!(
        session.edit("more = 1", Instant::now()),
        Err(RoomError::AlreadySubmitted(0))
    ));
    assert!(matches!(
        session.begin_run(),
        Err(RoomError::AlreadySubmitted(0))
    ));
}

#[tokio::test]
async fn language_switch_rederives_boilerplate() {
    let (mut session, _rx) = controller();
    init(&mut session, vec![question("easy", Difficulty::Easy, 1)]);

    assert_eq!(session.code(), "# Write your solution here");
    session.edit("x = 1", Instant::now()).unwrap();

    session.set_language(Language::Cpp).unwrap();
    assert_eq!(session.language(), Language::Cpp);
    assert_eq!(session.code(), "// Write your solution here");
}
