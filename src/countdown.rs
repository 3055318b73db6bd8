// src/countdown.rs

//! Drives one started session: a periodic tick plus queued student commands,
//! all applied on a single task that owns the session.

use std::time::Duration;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Instant},
};

use crate::{
    models::attempt::AttemptStatus,
    session::{ExamSession, SubmitOutcome, TickOutcome},
};

/// Commands a student issues while the clock runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Answer { question_id: String, option: String },
    Goto(i64),
    Submit,
}

/// How a driven session ended. The session is handed back for review or `retry_persist`.
pub enum SessionEnd {
    Submitted {
        session: ExamSession,
        outcome: SubmitOutcome,
    },
    /// Every command sender was dropped before submission. Nothing was written.
    Abandoned { session: ExamSession },
    /// The session was not IN_PROGRESS when the driver got it.
    NotRunning { session: ExamSession },
}

impl SessionEnd {
    pub fn outcome(&self) -> Option<&SubmitOutcome> {
        match self {
            SessionEnd::Submitted { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    pub fn into_session(self) -> ExamSession {
        match self {
            SessionEnd::Submitted { session, .. }
            | SessionEnd::Abandoned { session }
            | SessionEnd::NotRunning { session } => session,
        }
    }
}

/// Runs the countdown and applies commands until the attempt is submitted or abandoned.
///
/// The remaining seconds are published on `remaining` after every tick.
pub async fn run_session(
    mut session: ExamSession,
    mut commands: mpsc::Receiver<SessionCommand>,
    tick_every: Duration,
    remaining: watch::Sender<u32>,
) -> SessionEnd {
    if session.status() != AttemptStatus::InProgress {
        return SessionEnd::NotRunning { session };
    }
    remaining.send_replace(session.remaining_secs());

    let mut ticker = time::interval_at(Instant::now() + tick_every, tick_every);

    loop {
        tokio::select! {
            _ = ticker.tick() => match session.tick().await {
                TickOutcome::Running { remaining_secs } => {
                    remaining.send_replace(remaining_secs);
                }
                TickOutcome::Expired(outcome) => {
                    remaining.send_replace(0);
                    return SessionEnd::Submitted { session, outcome };
                }
                TickOutcome::Idle => return SessionEnd::NotRunning { session },
            },
            command = commands.recv() => match command {
                Some(SessionCommand::Answer { question_id, option }) => {
                    session.answer(&question_id, &option);
                }
                Some(SessionCommand::Goto(index)) => {
                    session.goto_question(index);
                }
                Some(SessionCommand::Submit) => {
                    if let Some(outcome) = session.submit().await {
                        return SessionEnd::Submitted { session, outcome };
                    }
                }
                None => {
                    tracing::warn!(
                        attempt = %session.attempt().id,
                        "Session abandoned with {}s left, no result recorded",
                        session.remaining_secs()
                    );
                    return SessionEnd::Abandoned { session };
                }
            },
        }
    }
}

/// A session running on its own task.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    remaining: watch::Receiver<u32>,
    join: JoinHandle<SessionEnd>,
}

impl SessionHandle {
    pub fn spawn(session: ExamSession, tick_every: Duration) -> Self {
        let (commands, rx) = mpsc::channel(64);
        let (remaining_tx, remaining) = watch::channel(session.remaining_secs());
        let join = tokio::spawn(run_session(session, rx, tick_every, remaining_tx));
        Self {
            commands,
            remaining,
            join,
        }
    }

    pub fn remaining(&self) -> watch::Receiver<u32> {
        self.remaining.clone()
    }

    /// Queues a command. Returns false once the session has ended.
    pub async fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    pub async fn answer(&self, question_id: &str, option: &str) -> bool {
        self.send(SessionCommand::Answer {
            question_id: question_id.to_string(),
            option: option.to_string(),
        })
        .await
    }

    pub async fn submit(&self) -> bool {
        self.send(SessionCommand::Submit).await
    }

    /// Waits for the session to end without abandoning it.
    pub async fn finished(self) -> Result<SessionEnd, tokio::task::JoinError> {
        let Self { commands, join, .. } = self;
        let end = join.await;
        drop(commands);
        end
    }

    /// Drops the command channel and waits for the driver to wind down.
    pub async fn abandon(self) -> Result<SessionEnd, tokio::task::JoinError> {
        let Self { commands, join, .. } = self;
        drop(commands);
        join.await
    }
}
