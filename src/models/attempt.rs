// src/models/attempt.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::Grading;

use super::question::OptionLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    NotStarted,
    InProgress,
    Submitted,
}

/// Letter grade derived from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            "F" => Some(Grade::F),
            _ => None,
        }
    }
}

/// What moved the attempt into SUBMITTED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    Manual,
    Timeout,
}

impl SubmitTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitTrigger::Manual => "manual",
            SubmitTrigger::Timeout => "timeout",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "manual" => Some(SubmitTrigger::Manual),
            "timeout" => Some(SubmitTrigger::Timeout),
            _ => None,
        }
    }
}

/// Correctness of one question in a finalized attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub selected: Option<OptionLabel>,
    pub correct_option: OptionLabel,
    pub is_correct: bool,
    pub points: u32,
    pub points_awarded: u32,
}

/// Fields that exist only once an attempt is SUBMITTED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptResult {
    pub grading: Grading,
    pub time_spent_seconds: u32,
    pub time_spent_minutes: u32,
    pub submitted_at: DateTime<Utc>,
    pub trigger: SubmitTrigger,
}

/// One student's attempt at one exam.
///
/// Only the session controller holds this mutably; everything else sees `&Attempt`.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub id: Uuid,
    pub exam_id: String,
    pub student_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub answers: HashMap<String, OptionLabel>,
    pub remaining_secs: u32,
    pub status: AttemptStatus,
    pub result: Option<AttemptResult>,
    /// Set by the reviewer workflow, never by the session.
    pub approved: bool,
}

impl Attempt {
    pub fn new(exam_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            exam_id: exam_id.into(),
            student_id: student_id.into(),
            started_at: None,
            answers: HashMap::new(),
            remaining_secs: 0,
            status: AttemptStatus::NotStarted,
            result: None,
            approved: false,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.status == AttemptStatus::Submitted
    }
}
