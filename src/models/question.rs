// src/models/question.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{config::OPTION_COUNT, error::AppError};

/// One of the five option labels printed next to a question's choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
    E,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; OPTION_COUNT] = [
        OptionLabel::A,
        OptionLabel::B,
        OptionLabel::C,
        OptionLabel::D,
        OptionLabel::E,
    ];

    /// Position of the label in a question's `options` array.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
            OptionLabel::E => "E",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = AppError;

    /// Only the exact labels "A" through "E" are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown option label '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            other => Err(AppError::InvalidInput(format!(
                "Unknown difficulty '{}'",
                other
            ))),
        }
    }
}

/// A multiple-choice question with exactly five options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Question {
    #[validate(length(min = 1, max = 64))]
    pub id: String,

    /// The text content of the question.
    #[validate(length(min = 1, max = 1000))]
    pub text: String,

    /// Option texts, indexed by `OptionLabel::index`.
    #[validate(custom(function = validate_options))]
    pub options: [String; OPTION_COUNT],

    pub correct_option: OptionLabel,

    pub difficulty: Difficulty,

    /// Authored point value. Recorded on every result; only the
    /// point-weighted scoring policy uses it for the percentage.
    #[validate(range(min = 1, max = 1000))]
    pub points: u32,
}

impl Question {
    pub fn option_text(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    pub fn is_correct(&self, selected: OptionLabel) -> bool {
        self.correct_option == selected
    }
}

/// DTO for presenting a question during an attempt (excludes the correct option).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub text: String,
    pub options: [String; OPTION_COUNT],
    pub difficulty: Difficulty,
    pub points: u32,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            text: q.text.clone(),
            options: q.options.clone(),
            difficulty: q.difficulty,
            points: q.points,
        }
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            id: "q1".to_string(),
            text: "Which gas do plants absorb?".to_string(),
            options: [
                "Oxygen".to_string(),
                "Carbon dioxide".to_string(),
                "Nitrogen".to_string(),
                "Helium".to_string(),
                "Argon".to_string(),
            ],
            correct_option: OptionLabel::B,
            difficulty: Difficulty::Easy,
            points: 2,
        }
    }

    #[test]
    fn test_option_label_parsing_is_strict() {
        assert_eq!("C".parse::<OptionLabel>().unwrap(), OptionLabel::C);
        assert!("c".parse::<OptionLabel>().is_err());
        assert!("F".parse::<OptionLabel>().is_err());
        assert!("".parse::<OptionLabel>().is_err());
        assert!("AB".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn test_option_text_follows_label_index() {
        let q = question();
        assert_eq!(q.option_text(OptionLabel::A), "Oxygen");
        assert_eq!(q.option_text(OptionLabel::E), "Argon");
        assert!(q.is_correct(OptionLabel::B));
        assert!(!q.is_correct(OptionLabel::A));
    }

    #[test]
    fn test_validation_rejects_zero_points_and_blank_options() {
        assert!(question().validate().is_ok());

        let mut q = question();
        q.points = 0;
        assert!(q.validate().is_err());

        let mut q = question();
        q.options[3] = "   ".to_string();
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_validation_caps_points() {
        let mut q = question();
        q.points = 1000;
        assert!(q.validate().is_ok());

        q.points = 1001;
        assert!(q.validate().is_err());

        q.points = u32::MAX;
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_difficulty_serializes_uppercase() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
    }

    #[test]
    fn test_public_question_hides_answer() {
        let value = serde_json::to_value(PublicQuestion::from(&question())).unwrap();
        assert!(value.get("correct_option").is_none());
        assert_eq!(value["id"], "q1");
    }
}
