// src/store/sqlite.rs

use std::{collections::BTreeMap, str::FromStr, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    FromRow, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    types::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{OPTION_COUNT, ScoringPolicy},
    error::AppError,
    models::{
        attempt::{Grade, QuestionResult, SubmitTrigger},
        exam::Exam,
        exam_record::AttemptRecord,
        question::{Difficulty, OptionLabel, Question},
    },
};

use super::{ExamRepository, ResultStore};

/// Represents a row of the 'exams' table.
#[derive(FromRow)]
struct ExamRow {
    id: String,
    title: String,
    description: String,
    subject: String,
    duration_minutes: i64,
    instructions: String,
}

/// Represents a row of the 'questions' table.
#[derive(FromRow)]
struct QuestionRow {
    id: String,
    text: String,
    options: Json<Vec<String>>,
    correct_option: String,
    difficulty: String,
    points: i64,
}

/// Represents a row of the 'attempts' table.
#[derive(FromRow)]
struct AttemptRow {
    id: String,
    exam_id: String,
    student_id: String,
    answers: Json<BTreeMap<String, OptionLabel>>,
    question_results: Json<Vec<QuestionResult>>,
    score: i64,
    total: i64,
    correct_count: i64,
    total_questions: i64,
    points_earned: i64,
    points_possible: i64,
    percentage: i64,
    grade: String,
    scoring_policy: String,
    started_at: DateTime<Utc>,
    submitted_at: DateTime<Utc>,
    time_spent_seconds: i64,
    time_spent_minutes: i64,
    submit_trigger: String,
    approved: bool,
}

const ATTEMPT_COLUMNS: &str = "id, exam_id, student_id, answers, question_results, score, total, \
    correct_count, total_questions, points_earned, points_possible, percentage, grade, \
    scoring_policy, started_at, submitted_at, time_spent_seconds, time_spent_minutes, \
    submit_trigger, approved";

fn column_u32(value: i64, column: &str) -> Result<u32, AppError> {
    u32::try_from(value).map_err(|_| {
        AppError::InternalServerError(format!("Column '{}' out of range: {}", column, value))
    })
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let options: [String; OPTION_COUNT] = row.options.0.try_into().map_err(|v: Vec<String>| {
            AppError::InternalServerError(format!(
                "Question '{}' has {} options, expected {}",
                row.id,
                v.len(),
                OPTION_COUNT
            ))
        })?;

        Ok(Question {
            correct_option: row.correct_option.parse()?,
            difficulty: row.difficulty.parse::<Difficulty>()?,
            points: column_u32(row.points, "points")?,
            id: row.id,
            text: row.text,
            options,
        })
    }
}

impl TryFrom<AttemptRow> for AttemptRecord {
    type Error = AppError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        let attempt_id = Uuid::parse_str(&row.id)
            .map_err(|e| AppError::InternalServerError(format!("Bad attempt id: {}", e)))?;
        let grade = Grade::parse(&row.grade).ok_or_else(|| {
            AppError::InternalServerError(format!("Bad grade '{}'", row.grade))
        })?;
        let scoring_policy = ScoringPolicy::parse(&row.scoring_policy).ok_or_else(|| {
            AppError::InternalServerError(format!("Bad scoring policy '{}'", row.scoring_policy))
        })?;
        let trigger = SubmitTrigger::parse(&row.submit_trigger).ok_or_else(|| {
            AppError::InternalServerError(format!("Bad submit trigger '{}'", row.submit_trigger))
        })?;
        let percentage = u8::try_from(row.percentage).map_err(|_| {
            AppError::InternalServerError(format!("Bad percentage {}", row.percentage))
        })?;

        Ok(AttemptRecord {
            attempt_id,
            exam_id: row.exam_id,
            student_id: row.student_id,
            answers: row.answers.0,
            question_results: row.question_results.0,
            score: column_u32(row.score, "score")?,
            total: column_u32(row.total, "total")?,
            correct_count: column_u32(row.correct_count, "correct_count")?,
            total_questions: column_u32(row.total_questions, "total_questions")?,
            points_earned: column_u32(row.points_earned, "points_earned")?,
            points_possible: column_u32(row.points_possible, "points_possible")?,
            percentage,
            grade,
            scoring_policy,
            started_at: row.started_at,
            submitted_at: row.submitted_at,
            time_spent_seconds: column_u32(row.time_spent_seconds, "time_spent_seconds")?,
            time_spent_minutes: column_u32(row.time_spent_minutes, "time_spent_minutes")?,
            trigger,
            approved: row.approved,
        })
    }
}

/// SQLite-backed exam repository and result store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `database_url`, creating the database file if needed.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Inserts or replaces an exam definition and its questions, in order.
    pub async fn insert_exam(&self, exam: &Exam) -> Result<(), AppError> {
        exam.validate()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO exams (id, title, description, subject, duration_minutes, instructions)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                subject = excluded.subject,
                duration_minutes = excluded.duration_minutes,
                instructions = excluded.instructions
            "#,
        )
        .bind(&exam.id)
        .bind(&exam.title)
        .bind(&exam.description)
        .bind(&exam.subject)
        .bind(i64::from(exam.duration_minutes))
        .bind(&exam.instructions)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM questions WHERE exam_id = ?")
            .bind(&exam.id)
            .execute(&mut *tx)
            .await?;

        for (position, q) in exam.questions.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO questions
                    (id, exam_id, position, text, options, correct_option, difficulty, points)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&q.id)
            .bind(&exam.id)
            .bind(position as i64)
            .bind(&q.text)
            .bind(Json(q.options.to_vec()))
            .bind(q.correct_option.as_str())
            .bind(q.difficulty.as_str())
            .bind(i64::from(q.points))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(
            "Stored exam '{}' with {} questions",
            exam.id,
            exam.questions.len()
        );
        Ok(())
    }
}

#[async_trait]
impl ExamRepository for SqliteStore {
    async fn get_exam(&self, exam_id: &str) -> Result<Exam, AppError> {
        let exam = sqlx::query_as::<_, ExamRow>(
            r#"
            SELECT id, title, description, subject, duration_minutes, instructions
            FROM exams
            WHERE id = ?
            "#,
        )
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch exam: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or_else(|| AppError::NotFound(format!("Exam '{}' not found", exam_id)))?;

        let questions = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, text, options, correct_option, difficulty, points
            FROM questions
            WHERE exam_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch exam questions: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .into_iter()
        .map(Question::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Exam {
            id: exam.id,
            title: exam.title,
            description: exam.description,
            subject: exam.subject,
            duration_minutes: column_u32(exam.duration_minutes, "duration_minutes")?,
            instructions: exam.instructions,
            questions,
        })
    }
}

#[async_trait]
impl ResultStore for SqliteStore {
    async fn save_attempt(&self, record: &AttemptRecord) -> Result<(), AppError> {
        // Same attempt id twice is a no-op; a second attempt for (exam, student) is rejected.
        let sql = format!(
            "INSERT INTO attempts ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO NOTHING",
            ATTEMPT_COLUMNS
        );

        sqlx::query(&sql)
            .bind(record.attempt_id.to_string())
            .bind(&record.exam_id)
            .bind(&record.student_id)
            .bind(Json(&record.answers))
            .bind(Json(&record.question_results))
            .bind(i64::from(record.score))
            .bind(i64::from(record.total))
            .bind(i64::from(record.correct_count))
            .bind(i64::from(record.total_questions))
            .bind(i64::from(record.points_earned))
            .bind(i64::from(record.points_possible))
            .bind(i64::from(record.percentage))
            .bind(record.grade.as_str())
            .bind(record.scoring_policy.as_str())
            .bind(record.started_at)
            .bind(record.submitted_at)
            .bind(i64::from(record.time_spent_seconds))
            .bind(i64::from(record.time_spent_minutes))
            .bind(record.trigger.as_str())
            .bind(record.approved)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert attempt {}: {:?}", record.attempt_id, e);
                AppError::PersistenceFailure(e.to_string())
            })?;

        Ok(())
    }

    async fn find_submitted(
        &self,
        exam_id: &str,
        student_id: &str,
    ) -> Result<Option<AttemptRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM attempts WHERE exam_id = ? AND student_id = ?",
            ATTEMPT_COLUMNS
        );

        sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(exam_id)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?
            .map(AttemptRecord::try_from)
            .transpose()
    }

    async fn list_results(
        &self,
        exam_id: &str,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM attempts WHERE exam_id = ? \
             ORDER BY percentage DESC, submitted_at ASC LIMIT ?",
            ATTEMPT_COLUMNS
        );

        sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(exam_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list results: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?
            .into_iter()
            .map(AttemptRecord::try_from)
            .collect()
    }
}
