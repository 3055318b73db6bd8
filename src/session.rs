// src/session.rs

//! Exam session controller: one student's attempt at one exam.
//!
//! NOT_STARTED -> IN_PROGRESS -> SUBMITTED. SUBMITTED is terminal and frozen.
//! Every method returns immediately; the countdown advances only through `tick`.

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use crate::{
    config::ScoringPolicy,
    error::AppError,
    grading::{grade_answers, minutes_rounded},
    models::{
        attempt::{Attempt, AttemptResult, AttemptStatus, SubmitTrigger},
        exam::{Exam, ExamOverview},
        exam_record::AttemptRecord,
        question::{OptionLabel, PublicQuestion},
    },
    store::{ExamRepository, ResultStore},
};

/// Result of calling `start()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// First call: the student must confirm by calling `start()` again.
    ConfirmationRequired,
    Started { remaining_secs: u32 },
    /// The attempt is already running or finished.
    Ignored,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_secs: u32 },
    /// Time ran out and the attempt was submitted.
    Expired(SubmitOutcome),
    /// Not IN_PROGRESS; nothing changed.
    Idle,
}

/// Whether the finalized attempt reached the Result Store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Saved,
    /// Non-fatal. The result stays available; `retry_persist` may be called.
    Failed { warning: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub record: AttemptRecord,
    pub persistence: Persistence,
}

impl SubmitOutcome {
    pub fn warning(&self) -> Option<&str> {
        match &self.persistence {
            Persistence::Saved => None,
            Persistence::Failed { warning } => Some(warning.as_str()),
        }
    }
}

pub struct ExamSession {
    exam: Exam,
    attempt: Attempt,
    results: Arc<dyn ResultStore>,
    policy: ScoringPolicy,
    current_index: usize,
    confirm_pending: bool,
    persistence: Option<Persistence>,
}

impl ExamSession {
    /// Loads the exam and prepares a NOT_STARTED attempt.
    ///
    /// Fails with `NotFound` for a missing exam, `InvalidInput` for a malformed one,
    /// and `Conflict` when the student already has a submitted attempt for it.
    pub async fn open(
        exams: &dyn ExamRepository,
        results: Arc<dyn ResultStore>,
        exam_id: &str,
        student_id: &str,
        policy: ScoringPolicy,
    ) -> Result<Self, AppError> {
        let exam = exams.get_exam(exam_id).await.map_err(|e| {
            tracing::warn!("Cannot open session for exam '{}': {}", exam_id, e);
            e
        })?;
        exam.validate()?;

        if results.find_submitted(exam_id, student_id).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Student '{}' has already submitted exam '{}'",
                student_id, exam_id
            )));
        }

        Ok(Self::new(exam, student_id, results, policy))
    }

    /// Wraps an already loaded exam.
    pub fn new(
        exam: Exam,
        student_id: &str,
        results: Arc<dyn ResultStore>,
        policy: ScoringPolicy,
    ) -> Self {
        let attempt = Attempt::new(exam.id.clone(), student_id);
        Self {
            exam,
            attempt,
            results,
            policy,
            current_index: 0,
            confirm_pending: false,
            persistence: None,
        }
    }

    pub fn exam(&self) -> &Exam {
        &self.exam
    }

    pub fn overview(&self) -> ExamOverview {
        ExamOverview::from(&self.exam)
    }

    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    pub fn status(&self) -> AttemptStatus {
        self.attempt.status
    }

    pub fn remaining_secs(&self) -> u32 {
        self.attempt.remaining_secs
    }

    pub fn current_question_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<PublicQuestion> {
        self.exam.questions.get(self.current_index).map(PublicQuestion::from)
    }

    pub fn selected_option(&self, question_id: &str) -> Option<OptionLabel> {
        self.attempt.answers.get(question_id).copied()
    }

    pub fn answered_count(&self) -> usize {
        self.attempt.answers.len()
    }

    pub fn is_confirmation_pending(&self) -> bool {
        self.confirm_pending
    }

    /// Latest persistence state; `None` until submitted.
    pub fn persistence(&self) -> Option<&Persistence> {
        self.persistence.as_ref()
    }

    /// Two-step start. The first call asks for confirmation, the second starts the clock.
    pub fn start(&mut self) -> StartOutcome {
        if self.attempt.status != AttemptStatus::NotStarted {
            return StartOutcome::Ignored;
        }
        if !self.confirm_pending {
            self.confirm_pending = true;
            return StartOutcome::ConfirmationRequired;
        }

        self.confirm_pending = false;
        self.attempt.status = AttemptStatus::InProgress;
        self.attempt.started_at = Some(Utc::now());
        self.attempt.remaining_secs = self.exam.duration_secs();
        self.current_index = 0;

        tracing::info!(
            attempt = %self.attempt.id,
            exam = %self.exam.id,
            student = %self.attempt.student_id,
            "Exam started with {}s on the clock",
            self.attempt.remaining_secs
        );

        StartOutcome::Started {
            remaining_secs: self.attempt.remaining_secs,
        }
    }

    /// Withdraws a pending start confirmation.
    pub fn cancel_start(&mut self) {
        self.confirm_pending = false;
    }

    /// Records or replaces the answer to a question.
    ///
    /// Unknown question ids, labels other than A-E, and calls outside IN_PROGRESS
    /// are ignored. Returns whether the answer was recorded.
    pub fn answer(&mut self, question_id: &str, option: &str) -> bool {
        if self.attempt.status != AttemptStatus::InProgress {
            tracing::debug!("Ignoring answer outside IN_PROGRESS");
            return false;
        }
        if !self.exam.contains_question(question_id) {
            tracing::debug!("Ignoring answer for unknown question '{}'", question_id);
            return false;
        }
        let Ok(label) = option.parse::<OptionLabel>() else {
            tracing::debug!("Ignoring answer with unknown option '{}'", option);
            return false;
        };

        self.attempt.answers.insert(question_id.to_string(), label);
        true
    }

    /// Moves to the question at `index`. Out-of-range indexes are ignored.
    pub fn goto_question(&mut self, index: i64) -> bool {
        if self.attempt.status != AttemptStatus::InProgress {
            return false;
        }
        match usize::try_from(index) {
            Ok(i) if i < self.exam.questions.len() => {
                self.current_index = i;
                true
            }
            _ => false,
        }
    }

    /// Advances the countdown by one second, submitting when it reaches zero.
    pub async fn tick(&mut self) -> TickOutcome {
        if self.attempt.status != AttemptStatus::InProgress {
            return TickOutcome::Idle;
        }

        self.attempt.remaining_secs = self.attempt.remaining_secs.saturating_sub(1);

        if self.attempt.remaining_secs == 0 {
            tracing::info!(attempt = %self.attempt.id, "Time is up, submitting");
            return TickOutcome::Expired(self.finalize(SubmitTrigger::Timeout).await);
        }

        TickOutcome::Running {
            remaining_secs: self.attempt.remaining_secs,
        }
    }

    /// Submits the attempt. Only the first call while IN_PROGRESS has an effect.
    pub async fn submit(&mut self) -> Option<SubmitOutcome> {
        if self.attempt.status != AttemptStatus::InProgress {
            return None;
        }
        Some(self.finalize(SubmitTrigger::Manual).await)
    }

    /// Writes the finalized attempt again after a failed save.
    ///
    /// A no-op once saved. Fails with `InvalidInput` before submission.
    pub async fn retry_persist(&mut self) -> Result<(), AppError> {
        match self.persistence {
            None => Err(AppError::InvalidInput(
                "Attempt has not been submitted".to_string(),
            )),
            Some(Persistence::Saved) => Ok(()),
            Some(Persistence::Failed { .. }) => {
                let record = self.record()?;
                match self.results.save_attempt(&record).await {
                    Ok(()) => {
                        tracing::info!(attempt = %record.attempt_id, "Attempt saved on retry");
                        self.persistence = Some(Persistence::Saved);
                        Ok(())
                    }
                    Err(e) => {
                        tracing::warn!(attempt = %record.attempt_id, "Retry failed: {}", e);
                        self.persistence = Some(Persistence::Failed {
                            warning: e.to_string(),
                        });
                        Err(e)
                    }
                }
            }
        }
    }

    fn record(&self) -> Result<AttemptRecord, AppError> {
        AttemptRecord::from_submitted(&self.attempt).ok_or_else(|| {
            AppError::InternalServerError("Submitted attempt has no result".to_string())
        })
    }

    async fn finalize(&mut self, trigger: SubmitTrigger) -> SubmitOutcome {
        let grading = grade_answers(&self.exam, &self.attempt.answers, self.policy);
        let time_spent_seconds = self
            .exam
            .duration_secs()
            .saturating_sub(self.attempt.remaining_secs);
        let submitted_at = Utc::now();
        let started_at = *self.attempt.started_at.get_or_insert(submitted_at);

        let result = AttemptResult {
            grading,
            time_spent_seconds,
            time_spent_minutes: minutes_rounded(time_spent_seconds),
            submitted_at,
            trigger,
        };
        let record = AttemptRecord::new(&self.attempt, &result, started_at);

        self.attempt.result = Some(result);
        self.attempt.status = AttemptStatus::Submitted;

        let persistence = match self.results.save_attempt(&record).await {
            Ok(()) => Persistence::Saved,
            Err(e) => {
                tracing::warn!(
                    attempt = %record.attempt_id,
                    "Result was not saved, retry is possible: {}",
                    e
                );
                Persistence::Failed {
                    warning: format!("Your result could not be saved: {}", e),
                }
            }
        };

        tracing::info!(
            attempt = %record.attempt_id,
            trigger = trigger.as_str(),
            "Exam submitted: {}/{} correct, {}% ({})",
            record.correct_count,
            record.total_questions,
            record.percentage,
            record.grade.as_str()
        );

        self.persistence = Some(persistence.clone());
        SubmitOutcome {
            record,
            persistence,
        }
    }
}
