// src/models/exam_record.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ScoringPolicy;

use super::{
    attempt::{Attempt, AttemptResult, Grade, QuestionResult, SubmitTrigger},
    question::OptionLabel,
};

/// The persisted form of a finalized attempt, as written to the Result Store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt_id: Uuid,
    pub exam_id: String,
    pub student_id: String,

    /// Key: Question ID. Value: selected option.
    pub answers: BTreeMap<String, OptionLabel>,
    pub question_results: Vec<QuestionResult>,

    pub score: u32,
    pub total: u32,
    pub correct_count: u32,
    pub total_questions: u32,
    pub points_earned: u32,
    pub points_possible: u32,
    pub percentage: u8,
    pub grade: Grade,
    pub scoring_policy: ScoringPolicy,

    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub time_spent_seconds: u32,
    pub time_spent_minutes: u32,
    pub trigger: SubmitTrigger,

    /// Reviewer approval. Always false when written by a session.
    #[serde(default)]
    pub approved: bool,
}

impl AttemptRecord {
    /// Builds the record for a SUBMITTED attempt. Returns `None` for any other state.
    pub fn from_submitted(attempt: &Attempt) -> Option<Self> {
        let result = attempt.result.as_ref()?;
        let started_at = attempt.started_at?;
        Some(Self::new(attempt, result, started_at))
    }

    pub fn new(attempt: &Attempt, result: &AttemptResult, started_at: DateTime<Utc>) -> Self {
        let g = &result.grading;

        Self {
            attempt_id: attempt.id,
            exam_id: attempt.exam_id.clone(),
            student_id: attempt.student_id.clone(),
            answers: attempt
                .answers
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            question_results: g.question_results.clone(),
            score: g.score,
            total: g.total,
            correct_count: g.correct_count,
            total_questions: g.total_questions,
            points_earned: g.points_earned,
            points_possible: g.points_possible,
            percentage: g.percentage,
            grade: g.grade,
            scoring_policy: g.policy,
            started_at,
            submitted_at: result.submitted_at,
            time_spent_seconds: result.time_spent_seconds,
            time_spent_minutes: result.time_spent_minutes,
            trigger: result.trigger,
            approved: attempt.approved,
        }
    }
}

/// Row shape for the results review list.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub student_id: String,
    pub percentage: u8,
    pub grade: Grade,
    pub submitted_at: DateTime<Utc>,
}

impl From<&AttemptRecord> for LeaderboardEntry {
    fn from(record: &AttemptRecord) -> Self {
        Self {
            student_id: record.student_id.clone(),
            percentage: record.percentage,
            grade: record.grade,
            submitted_at: record.submitted_at,
        }
    }
}
