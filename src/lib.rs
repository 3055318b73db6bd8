// src/lib.rs

pub mod config;
pub mod countdown;
pub mod error;
pub mod grading;
pub mod models;
pub mod session;
pub mod state;
pub mod store;

// Session API at the crate root
pub use countdown::{SessionCommand, SessionEnd, SessionHandle, run_session};
pub use error::AppError;
pub use session::{ExamSession, Persistence, StartOutcome, SubmitOutcome, TickOutcome};
pub use state::AppState;
