use std::sync::Arc;

use crate::{
    config::Config,
    error::AppError,
    models::exam_record::LeaderboardEntry,
    session::ExamSession,
    store::{ExamRepository, ResultStore, SqliteStore},
};

/// Shared handles for opening exam sessions.
#[derive(Clone)]
pub struct AppState {
    pub exams: Arc<dyn ExamRepository>,
    pub results: Arc<dyn ResultStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        exams: Arc<dyn ExamRepository>,
        results: Arc<dyn ResultStore>,
        config: Config,
    ) -> Self {
        Self {
            exams,
            results,
            config,
        }
    }

    /// Uses one SQLite store for both exam definitions and results.
    pub fn with_sqlite(store: SqliteStore, config: Config) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store, config)
    }

    /// Opens a NOT_STARTED session using the configured scoring policy.
    pub async fn open_session(
        &self,
        exam_id: &str,
        student_id: &str,
    ) -> Result<ExamSession, AppError> {
        ExamSession::open(
            self.exams.as_ref(),
            self.results.clone(),
            exam_id,
            student_id,
            self.config.scoring_policy,
        )
        .await
    }

    /// Retrieves the top results for an exam.
    pub async fn leaderboard(
        &self,
        exam_id: &str,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, AppError> {
        let records = self.results.list_results(exam_id, limit).await?;
        Ok(records.iter().map(LeaderboardEntry::from).collect())
    }
}
