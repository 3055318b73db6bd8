// src/grading.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    config::ScoringPolicy,
    models::{
        attempt::{Grade, QuestionResult},
        exam::Exam,
        question::OptionLabel,
    },
};

/// Inclusive lower bounds for letter grades, highest first.
pub const GRADE_THRESHOLDS: [(u8, Grade); 4] =
    [(90, Grade::A), (80, Grade::B), (70, Grade::C), (60, Grade::D)];

/// Outcome of scoring one set of answers against an exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grading {
    pub question_results: Vec<QuestionResult>,
    pub correct_count: u32,
    pub total_questions: u32,
    pub points_earned: u32,
    pub points_possible: u32,
    /// `correct_count` or `points_earned`, depending on `policy`.
    pub score: u32,
    /// `total_questions` or `points_possible`, depending on `policy`.
    pub total: u32,
    pub percentage: u8,
    pub grade: Grade,
    pub policy: ScoringPolicy,
}

/// `round(100 * part / whole)` with half-up rounding, in integer arithmetic.
/// An empty whole scores 0.
pub fn percentage(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part.min(whole));
    let whole = u64::from(whole);
    // (100p/w + 1/2) floored == (200p + w) / 2w
    ((200 * part + whole) / (2 * whole)) as u8
}

pub fn letter_grade(percentage: u8) -> Grade {
    GRADE_THRESHOLDS
        .iter()
        .find(|(min, _)| percentage >= *min)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

/// Half-up rounding of seconds to whole minutes.
pub fn minutes_rounded(seconds: u32) -> u32 {
    (seconds + 30) / 60
}

/// Scores answers question by question, in exam order.
///
/// Answers for question ids outside the exam play no part. Unanswered questions are incorrect.
pub fn grade_answers(
    exam: &Exam,
    answers: &HashMap<String, OptionLabel>,
    policy: ScoringPolicy,
) -> Grading {
    let mut correct_count = 0;
    let mut points_earned = 0;
    let mut points_possible = 0;

    let question_results: Vec<QuestionResult> = exam
        .questions
        .iter()
        .map(|q| {
            let selected = answers.get(&q.id).copied();
            let is_correct = selected.is_some_and(|s| q.is_correct(s));
            let points_awarded = if is_correct { q.points } else { 0 };

            points_possible = u32::saturating_add(points_possible, q.points);
            if is_correct {
                correct_count += 1;
                points_earned = u32::saturating_add(points_earned, points_awarded);
            }

            QuestionResult {
                question_id: q.id.clone(),
                selected,
                correct_option: q.correct_option,
                is_correct,
                points: q.points,
                points_awarded,
            }
        })
        .collect();

    let total_questions = question_results.len() as u32;

    let (score, total) = match policy {
        ScoringPolicy::Unweighted => (correct_count, total_questions),
        ScoringPolicy::PointWeighted => (points_earned, points_possible),
    };
    let percentage = percentage(score, total);

    Grading {
        question_results,
        correct_count,
        total_questions,
        points_earned,
        points_possible,
        score,
        total,
        percentage,
        grade: letter_grade(percentage),
        policy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Difficulty, Question};

    fn question(id: &str, correct: OptionLabel, points: u32) -> Question {
        Question {
            id: id.to_string(),
            text: format!("Question {}", id),
            options: ["w", "x", "y", "z", "v"].map(String::from),
            correct_option: correct,
            difficulty: Difficulty::Easy,
            points,
        }
    }

    fn exam(questions: Vec<Question>) -> Exam {
        Exam {
            id: "e1".to_string(),
            title: "Exam".to_string(),
            description: String::new(),
            subject: "GEN".to_string(),
            duration_minutes: 10,
            instructions: String::new(),
            questions,
        }
    }

    fn answers(pairs: &[(&str, OptionLabel)]) -> HashMap<String, OptionLabel> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage(1, 2), 50);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        // 100 * 1/8 = 12.5
        assert_eq!(percentage(1, 8), 13);
        // 100 * 7/8 = 87.5
        assert_eq!(percentage(7, 8), 88);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_letter_grade_thresholds_are_inclusive() {
        assert_eq!(letter_grade(100), Grade::A);
        assert_eq!(letter_grade(90), Grade::A);
        assert_eq!(letter_grade(89), Grade::B);
        assert_eq!(letter_grade(80), Grade::B);
        assert_eq!(letter_grade(79), Grade::C);
        assert_eq!(letter_grade(70), Grade::C);
        assert_eq!(letter_grade(60), Grade::D);
        assert_eq!(letter_grade(59), Grade::F);
        assert_eq!(letter_grade(0), Grade::F);
    }

    #[test]
    fn test_half_correct_is_failing() {
        let exam = exam(vec![
            question("q1", OptionLabel::B, 1),
            question("q2", OptionLabel::B, 1),
        ]);
        let g = grade_answers(
            &exam,
            &answers(&[("q1", OptionLabel::B), ("q2", OptionLabel::A)]),
            ScoringPolicy::Unweighted,
        );
        assert_eq!(g.correct_count, 1);
        assert_eq!(g.total_questions, 2);
        assert_eq!(g.percentage, 50);
        assert_eq!(g.grade, Grade::F);
        assert!(g.question_results[0].is_correct);
        assert!(!g.question_results[1].is_correct);
    }

    #[test]
    fn test_perfect_paper() {
        let exam = exam(vec![
            question("q1", OptionLabel::A, 1),
            question("q2", OptionLabel::C, 1),
            question("q3", OptionLabel::E, 1),
            question("q4", OptionLabel::D, 1),
        ]);
        let g = grade_answers(
            &exam,
            &answers(&[
                ("q1", OptionLabel::A),
                ("q2", OptionLabel::C),
                ("q3", OptionLabel::E),
                ("q4", OptionLabel::D),
            ]),
            ScoringPolicy::Unweighted,
        );
        assert_eq!(g.correct_count, 4);
        assert_eq!(g.percentage, 100);
        assert_eq!(g.grade, Grade::A);
    }

    #[test]
    fn test_unanswered_counts_as_incorrect() {
        let exam = exam(vec![
            question("q1", OptionLabel::A, 1),
            question("q2", OptionLabel::A, 1),
        ]);
        let g = grade_answers(&exam, &HashMap::new(), ScoringPolicy::Unweighted);
        assert_eq!(g.correct_count, 0);
        assert_eq!(g.percentage, 0);
        assert_eq!(g.grade, Grade::F);
        assert!(g.question_results.iter().all(|r| r.selected.is_none()));
    }

    #[test]
    fn test_unknown_question_ids_are_ignored() {
        let exam = exam(vec![question("q1", OptionLabel::A, 1)]);
        let g = grade_answers(
            &exam,
            &answers(&[("q1", OptionLabel::A), ("ghost", OptionLabel::A)]),
            ScoringPolicy::Unweighted,
        );
        assert_eq!(g.correct_count, 1);
        assert_eq!(g.total_questions, 1);
    }

    #[test]
    fn test_points_tracked_but_unweighted_by_default() {
        // One heavy question wrong, two light ones right.
        let exam = exam(vec![
            question("q1", OptionLabel::A, 8),
            question("q2", OptionLabel::A, 1),
            question("q3", OptionLabel::A, 1),
        ]);
        let given = answers(&[
            ("q1", OptionLabel::B),
            ("q2", OptionLabel::A),
            ("q3", OptionLabel::A),
        ]);

        let unweighted = grade_answers(&exam, &given, ScoringPolicy::Unweighted);
        assert_eq!(unweighted.points_earned, 2);
        assert_eq!(unweighted.points_possible, 10);
        assert_eq!(unweighted.score, 2);
        assert_eq!(unweighted.total, 3);
        assert_eq!(unweighted.percentage, 67);
        assert_eq!(unweighted.grade, Grade::D);

        let weighted = grade_answers(&exam, &given, ScoringPolicy::PointWeighted);
        assert_eq!(weighted.score, 2);
        assert_eq!(weighted.total, 10);
        assert_eq!(weighted.percentage, 20);
        assert_eq!(weighted.grade, Grade::F);
    }

    #[test]
    fn test_unvalidated_point_values_do_not_overflow() {
        let exam = exam(vec![
            question("q1", OptionLabel::A, u32::MAX),
            question("q2", OptionLabel::A, 1),
        ]);
        let given = answers(&[("q1", OptionLabel::A), ("q2", OptionLabel::A)]);

        let unweighted = grade_answers(&exam, &given, ScoringPolicy::Unweighted);
        assert_eq!(unweighted.points_possible, u32::MAX);
        assert_eq!(unweighted.points_earned, u32::MAX);
        assert_eq!(unweighted.percentage, 100);

        let weighted = grade_answers(&exam, &given, ScoringPolicy::PointWeighted);
        assert_eq!(weighted.percentage, 100);
        assert_eq!(weighted.grade, Grade::A);
    }

    #[test]
    fn test_minutes_rounded() {
        assert_eq!(minutes_rounded(60), 1);
        assert_eq!(minutes_rounded(29), 0);
        assert_eq!(minutes_rounded(30), 1);
        assert_eq!(minutes_rounded(89), 1);
        assert_eq!(minutes_rounded(90), 2);
    }
}
