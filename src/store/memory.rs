// src/store/memory.rs

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{exam::Exam, exam_record::AttemptRecord},
};

use super::{ExamRepository, ResultStore};

#[derive(Default)]
struct Inner {
    exams: HashMap<String, Exam>,
    attempts: Vec<AttemptRecord>,
}

/// In-process exam repository and result store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exams(exams: impl IntoIterator<Item = Exam>) -> Self {
        let store = Self::new();
        for exam in exams {
            store.insert_exam(exam);
        }
        store
    }

    /// Adds or replaces an exam definition.
    pub fn insert_exam(&self, exam: Exam) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.exams.insert(exam.id.clone(), exam);
    }

    pub fn attempt_count(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.attempts.len()
    }
}

#[async_trait]
impl ExamRepository for MemoryStore {
    async fn get_exam(&self, exam_id: &str) -> Result<Exam, AppError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .exams
            .get(exam_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Exam '{}' not found", exam_id)))
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn save_attempt(&self, record: &AttemptRecord) -> Result<(), AppError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        if inner
            .attempts
            .iter()
            .any(|a| a.attempt_id == record.attempt_id)
        {
            return Ok(());
        }
        if inner
            .attempts
            .iter()
            .any(|a| a.exam_id == record.exam_id && a.student_id == record.student_id)
        {
            return Err(AppError::PersistenceFailure(format!(
                "Student '{}' already has an attempt for exam '{}'",
                record.student_id, record.exam_id
            )));
        }

        inner.attempts.push(record.clone());
        Ok(())
    }

    async fn find_submitted(
        &self,
        exam_id: &str,
        student_id: &str,
    ) -> Result<Option<AttemptRecord>, AppError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .attempts
            .iter()
            .find(|a| a.exam_id == exam_id && a.student_id == student_id)
            .cloned())
    }

    async fn list_results(
        &self,
        exam_id: &str,
        limit: u32,
    ) -> Result<Vec<AttemptRecord>, AppError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut results: Vec<AttemptRecord> = inner
            .attempts
            .iter()
            .filter(|a| a.exam_id == exam_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| {
            b.percentage
                .cmp(&a.percentage)
                .then(a.submitted_at.cmp(&b.submitted_at))
        });
        results.truncate(limit as usize);
        Ok(results)
    }
}
