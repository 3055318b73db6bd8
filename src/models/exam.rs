// src/models/exam.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::SECONDS_PER_MINUTE;

use super::question::Question;

/// An exam definition. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Exam {
    #[validate(length(min = 1, max = 64))]
    pub id: String,

    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,

    /// Subject tag, e.g. "MTH101".
    #[serde(default)]
    pub subject: String,

    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: u32,

    #[serde(default)]
    #[validate(length(max = 5000))]
    pub instructions: String,

    /// Presentation and scoring order.
    #[validate(length(min = 1, max = 500), custom(function = validate_unique_ids), nested)]
    pub questions: Vec<Question>,
}

impl Exam {
    pub fn duration_secs(&self) -> u32 {
        self.duration_minutes.saturating_mul(SECONDS_PER_MINUTE)
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn contains_question(&self, question_id: &str) -> bool {
        self.question(question_id).is_some()
    }

    pub fn total_points(&self) -> u32 {
        self.questions
            .iter()
            .fold(0, |total: u32, q| total.saturating_add(q.points))
    }
}

/// Exam metadata shown on the instructions screen before an attempt starts.
#[derive(Debug, Clone, Serialize)]
pub struct ExamOverview {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub duration_minutes: u32,
    pub instructions: String,
    pub total_questions: usize,
    pub total_points: u32,
}

impl From<&Exam> for ExamOverview {
    fn from(exam: &Exam) -> Self {
        Self {
            id: exam.id.clone(),
            title: exam.title.clone(),
            description: exam.description.clone(),
            subject: exam.subject.clone(),
            duration_minutes: exam.duration_minutes,
            instructions: exam.instructions.clone(),
            total_questions: exam.questions.len(),
            total_points: exam.total_points(),
        }
    }
}

fn validate_unique_ids(questions: &[Question]) -> Result<(), validator::ValidationError> {
    let mut seen = HashSet::new();
    for q in questions {
        if !seen.insert(q.id.as_str()) {
            return Err(validator::ValidationError::new("duplicate_question_id"));
        }
    }
    Ok(())
}
