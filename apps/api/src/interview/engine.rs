//! Interview orchestration: start, advance, abort.
//!
//! Every step runs on a snapshot of the stored session and is written back
//! only when it succeeds, so a failed step leaves the stored session as it was.
//! The write-back is conditional: if the session was aborted, restarted or
//! advanced while the step waited on the model, the step is discarded.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::archive::{TranscriptArchive, TranscriptRecord};
use crate::evaluation::report::FinalReport;
use crate::evaluation::{EvaluationPipeline, NEUTRAL_FEEDBACK};
use crate::interview::catalog::{QuestionCategory, Role};
use crate::interview::question_bank::QuestionBank;
use crate::interview::session::{
    QuestionDescriptor, Session, SessionConfig, SessionStamp, SessionStatus, UserId,
};
use crate::interview::store::SessionStore;
use crate::interview::InterviewError;

/// Number of archived interviews returned by `history`.
pub const HISTORY_LIMIT: i64 = 10;

/// First question of a freshly started interview.
#[derive(Debug, Clone, Serialize)]
pub struct StartedInterview {
    pub question: QuestionDescriptor,
    /// 1-based.
    pub number: usize,
    pub total: usize,
}

/// Outcome of answering a question.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum NextStep {
    Question {
        feedback: String,
        question: QuestionDescriptor,
        number: usize,
        total: usize,
    },
    Finished {
        feedback: String,
        report: FinalReport,
    },
}

pub struct Interviewer {
    sessions: Arc<SessionStore>,
    questions: QuestionBank,
    evaluator: EvaluationPipeline,
    archive: Option<Arc<dyn TranscriptArchive>>,
}

impl Interviewer {
    pub fn new(
        sessions: Arc<SessionStore>,
        questions: QuestionBank,
        evaluator: EvaluationPipeline,
        archive: Option<Arc<dyn TranscriptArchive>>,
    ) -> Self {
        Self {
            sessions,
            questions,
            evaluator,
            archive,
        }
    }

    /// Begins a new interview, replacing any existing session for the user.
    /// Nothing is stored when the first question cannot be produced.
    pub async fn start(
        &self,
        user_id: UserId,
        role: Role,
        length: usize,
        categories: Vec<QuestionCategory>,
    ) -> Result<StartedInterview, InterviewError> {
        let config = SessionConfig::new(role, length, categories)?;
        let first = self
            .questions
            .next_question(role, &config.categories, &[])
            .await?;

        let mut session = Session::new(user_id.clone(), config);
        session.start(first.clone())?;
        let total = session.length();

        if let Some(previous) = self.sessions.save(session).await {
            info!(
                "Replaced {:?} session of user {} ({}/{} answered)",
                previous.status(),
                user_id,
                previous.cursor(),
                previous.length()
            );
        }
        info!(
            "Interview started: user={}, role={:?}, questions={}",
            user_id, role, total
        );

        Ok(StartedInterview {
            question: first,
            number: 1,
            total,
        })
    }

    /// Records the answer to the outstanding question and moves on.
    pub async fn advance(&self, user_id: &UserId, answer: &str) -> Result<NextStep, InterviewError> {
        let mut session = self
            .sessions
            .get(user_id)
            .await
            .filter(|s| s.status() == SessionStatus::InProgress)
            .ok_or(InterviewError::NoActiveSession)?;
        let snapshot = session.stamp();

        if answer.trim().is_empty() {
            return Err(InterviewError::EmptyAnswer);
        }
        let question = session
            .pending_question()
            .cloned()
            .ok_or(InterviewError::InvalidTransition("no outstanding question to answer"))?;

        let feedback = self
            .evaluator
            .per_turn_feedback(session.role(), &question, answer.trim())
            .await;
        let shown_feedback = feedback
            .clone()
            .unwrap_or_else(|| NEUTRAL_FEEDBACK.to_string());
        session.record_answer(answer, feedback)?;

        if session.is_exhausted() {
            let report = self
                .evaluator
                .final_report(session.role(), session.turns())
                .await;
            session.complete(report.clone())?;
            let record = TranscriptRecord::from_session(&session);
            self.commit(snapshot, session).await?;
            if let Some(record) = record {
                self.archive_completed(&record).await;
            }
            info!("Interview finished: user={}", user_id);

            return Ok(NextStep::Finished {
                feedback: shown_feedback,
                report,
            });
        }

        let next = self
            .questions
            .next_question(session.role(), session.categories(), &session.asked_questions())
            .await?;
        session.push_question(next.clone())?;
        let number = session.cursor() + 1;
        let total = session.length();
        self.commit(snapshot, session).await?;

        Ok(NextStep::Question {
            feedback: shown_feedback,
            question: next,
            number,
            total,
        })
    }

    async fn commit(&self, snapshot: SessionStamp, session: Session) -> Result<(), InterviewError> {
        let user_id = session.user_id().clone();
        if self.sessions.replace_if(snapshot, session).await {
            return Ok(());
        }
        warn!(
            "Discarded answer of user {}: session changed while it was being evaluated",
            user_id
        );
        Err(InterviewError::NoActiveSession)
    }

    /// Drops the user's session. Idempotent.
    pub async fn abort(&self, user_id: &UserId) {
        if self.sessions.remove(user_id).await.is_some() {
            info!("Interview aborted: user={}", user_id);
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.len().await
    }

    /// Read-only snapshot, including completed sessions.
    pub async fn status(&self, user_id: &UserId) -> Option<Session> {
        self.sessions.get(user_id).await
    }

    /// Recently archived interviews, newest first. Empty when archival is off
    /// or the archive cannot be read.
    pub async fn history(&self, user_id: &UserId) -> Vec<TranscriptRecord> {
        let Some(archive) = &self.archive else {
            return Vec::new();
        };
        match archive.recent(user_id.as_str(), HISTORY_LIMIT).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to load interview history for {}: {e:#}", user_id);
                Vec::new()
            }
        }
    }

    pub fn archive_enabled(&self) -> bool {
        self.archive.is_some()
    }

    async fn archive_completed(&self, record: &TranscriptRecord) {
        let Some(archive) = &self.archive else {
            return;
        };
        if let Err(e) = archive.append(record).await {
            warn!("Failed to archive interview of {}: {e:#}", record.user_id);
        }
    }
}
