// tests/exam_flow_tests.rs

use std::sync::Arc;

use cbt_exam::{
    AppState, ExamSession, SessionEnd, SessionHandle, StartOutcome, TickOutcome,
    config::Config,
    models::{
        attempt::{AttemptStatus, Grade, SubmitTrigger},
        exam::Exam,
        question::{Difficulty, OptionLabel, Question},
    },
    store::{MemoryStore, ResultStore},
};

fn exam(id: &str, duration_minutes: u32, correct: &[OptionLabel]) -> Exam {
    Exam {
        id: id.to_string(),
        title: format!("Exam {}", id),
        description: String::new(),
        subject: "GNS101".to_string(),
        duration_minutes,
        instructions: "Read each question carefully.".to_string(),
        questions: correct
            .iter()
            .enumerate()
            .map(|(i, c)| Question {
                id: format!("q{}", i + 1),
                text: format!("Question {}", i + 1),
                options: ["A1", "B1", "C1", "D1", "E1"].map(String::from),
                correct_option: *c,
                difficulty: Difficulty::Easy,
                points: 1,
            })
            .collect(),
    }
}

/// State backed by one in-memory store holding the given exams.
fn spawn_state(exams: Vec<Exam>) -> (AppState, MemoryStore) {
    let store = MemoryStore::with_exams(exams);
    let shared = Arc::new(store.clone());
    (
        AppState::new(shared.clone(), shared, Config::default()),
        store,
    )
}

async fn start(state: &AppState, exam_id: &str, student_id: &str) -> ExamSession {
    let mut session = state.open_session(exam_id, student_id).await.unwrap();
    assert_eq!(session.status(), AttemptStatus::NotStarted);
    assert_eq!(session.overview().id, exam_id);
    assert_eq!(session.start(), StartOutcome::ConfirmationRequired);
    assert!(matches!(session.start(), StartOutcome::Started { .. }));
    session
}

#[tokio::test]
async fn one_of_two_correct_fails() {
    let (state, _) = spawn_state(vec![exam("a", 10, &[OptionLabel::B, OptionLabel::B])]);
    let mut session = start(&state, "a", "stu").await;

    session.answer("q1", "B");
    session.answer("q2", "A");
    let outcome = session.submit().await.unwrap();

    assert_eq!(outcome.record.correct_count, 1);
    assert_eq!(outcome.record.total_questions, 2);
    assert_eq!(outcome.record.percentage, 50);
    assert_eq!(outcome.record.grade, Grade::F);
}

#[tokio::test]
async fn all_four_correct_gets_top_grade() {
    let correct = [OptionLabel::E, OptionLabel::D, OptionLabel::C, OptionLabel::B];
    let (state, _) = spawn_state(vec![exam("b", 10, &correct)]);
    let mut session = start(&state, "b", "stu").await;

    for (i, c) in correct.iter().enumerate() {
        session.answer(&format!("q{}", i + 1), c.as_str());
    }
    let outcome = session.submit().await.unwrap();

    assert_eq!(outcome.record.percentage, 100);
    assert_eq!(outcome.record.grade, Grade::A);
}

#[tokio::test]
async fn unanswered_exam_expires_after_one_minute() {
    let (state, store) = spawn_state(vec![exam("c", 1, &[OptionLabel::A, OptionLabel::B])]);
    let mut session = start(&state, "c", "stu").await;

    let mut expired = None;
    let mut previous = session.remaining_secs();
    while expired.is_none() {
        match session.tick().await {
            TickOutcome::Running { remaining_secs } => {
                assert!(remaining_secs < previous);
                previous = remaining_secs;
            }
            TickOutcome::Expired(outcome) => expired = Some(outcome),
            TickOutcome::Idle => panic!("session stopped before expiry"),
        }
    }
    let outcome = expired.unwrap();

    assert_eq!(session.remaining_secs(), 0);
    assert_eq!(outcome.record.percentage, 0);
    assert_eq!(outcome.record.grade, Grade::F);
    assert_eq!(outcome.record.time_spent_minutes, 1);
    assert_eq!(outcome.record.trigger, SubmitTrigger::Timeout);
    assert!(store.find_submitted("c", "stu").await.unwrap().is_some());
}

#[tokio::test]
async fn navigation_out_of_range_keeps_index() {
    let (state, _) = spawn_state(vec![exam(
        "d",
        10,
        &[OptionLabel::A, OptionLabel::A, OptionLabel::A],
    )]);
    let mut session = start(&state, "d", "stu").await;
    session.goto_question(1);

    let total = session.exam().questions.len() as i64;
    assert!(!session.goto_question(-1));
    assert_eq!(session.current_question_index(), 1);
    assert!(!session.goto_question(total));
    assert_eq!(session.current_question_index(), 1);
}

#[tokio::test]
async fn repeated_submit_has_no_effect() {
    let (state, store) = spawn_state(vec![exam("e", 10, &[OptionLabel::C])]);
    let mut session = start(&state, "e", "stu").await;
    session.answer("q1", "C");

    let first = session.submit().await.unwrap();
    assert!(session.submit().await.is_none());
    assert!(!session.answer("q1", "A"));

    let stored = store.find_submitted("e", "stu").await.unwrap().unwrap();
    assert_eq!(stored, first.record);
    assert_eq!(store.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn driven_session_times_out_with_answers_so_far() {
    let (state, store) = spawn_state(vec![exam("f", 1, &[OptionLabel::A, OptionLabel::B])]);
    let session = start(&state, "f", "stu").await;

    let handle = SessionHandle::spawn(session, state.config.tick_interval);
    assert!(handle.answer("q2", "B").await);
    assert!(handle.answer("q1", "nonsense").await);

    let end = handle.finished().await.unwrap();
    let SessionEnd::Submitted { session, outcome } = end else {
        panic!("expected timeout submission");
    };
    assert_eq!(session.status(), AttemptStatus::Submitted);
    assert_eq!(outcome.record.trigger, SubmitTrigger::Timeout);
    assert_eq!(outcome.record.correct_count, 1);
    assert_eq!(outcome.record.time_spent_seconds, 60);
    assert_eq!(store.attempt_count(), 1);

    let board = state.leaderboard("f", 5).await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].percentage, 50);
}
