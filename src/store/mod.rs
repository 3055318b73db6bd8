// src/store/mod.rs

//! Storage seams for exam sessions.
//!
//! The session controller only sees these traits. `sqlite` is the durable
//! implementation, `memory` keeps everything in process.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{exam::Exam, exam_record::AttemptRecord},
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Read-only source of exam definitions.
#[async_trait]
pub trait ExamRepository: Send + Sync {
    /// Returns `AppError::NotFound` when no exam has this id.
    async fn get_exam(&self, exam_id: &str) -> Result<Exam, AppError>;
}

/// Append-only sink for finalized attempts.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Writes one finalized attempt. Writing the same attempt id again is a no-op.
    async fn save_attempt(&self, record: &AttemptRecord) -> Result<(), AppError>;

    async fn find_submitted(
        &self,
        exam_id: &str,
        student_id: &str,
    ) -> Result<Option<AttemptRecord>, AppError>;

    /// Results for one exam, best percentage first, earliest submission breaking ties.
    async fn list_results(&self, exam_id: &str, limit: u32)
    -> Result<Vec<AttemptRecord>, AppError>;
}
