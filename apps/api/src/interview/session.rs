//! Interview session state machine.
//!
//! States: NotStarted → InProgress → Completed. `InProgress` is one logical
//! state; progress within it is tracked by `cursor`. Every mutating method
//! validates before touching any field, so a rejected call leaves the session
//! exactly as it was.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::evaluation::report::FinalReport;
use crate::interview::catalog::{QuestionCategory, Role, MAX_QUESTIONS};
use crate::interview::InterviewError;

/// Opaque identifier of the user owning a session. Assigned by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDescriptor {
    pub text: String,
    pub category: QuestionCategory,
}

/// One question/answer/feedback triple. `answer` is `None` while the question
/// is outstanding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub question: QuestionDescriptor,
    pub answer: Option<String>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Validated, immutable session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    pub role: Role,
    pub length: usize,
    /// Non-empty, deduplicated, catalog order.
    pub categories: Vec<QuestionCategory>,
}

impl SessionConfig {
    pub fn new(
        role: Role,
        length: usize,
        categories: impl IntoIterator<Item = QuestionCategory>,
    ) -> Result<Self, InterviewError> {
        if length == 0 {
            return Err(InterviewError::ConfigurationInvalid(
                "an interview needs at least one question".to_string(),
            ));
        }
        if length > MAX_QUESTIONS {
            return Err(InterviewError::ConfigurationInvalid(format!(
                "an interview can have at most {MAX_QUESTIONS} questions"
            )));
        }

        let categories: Vec<QuestionCategory> = categories
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if categories.is_empty() {
            return Err(InterviewError::ConfigurationInvalid(
                "select at least one question category".to_string(),
            ));
        }

        Ok(Self {
            role,
            length,
            categories,
        })
    }
}

/// Identifies one stored version of a session. Two snapshots with equal
/// stamps hold the same state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStamp {
    id: Uuid,
    revision: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    #[serde(skip)]
    id: Uuid,
    #[serde(skip)]
    revision: u64,
    user_id: UserId,
    config: SessionConfig,
    turns: Vec<Turn>,
    cursor: usize,
    status: SessionStatus,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    final_report: Option<FinalReport>,
}

impl Session {
    pub fn new(user_id: UserId, config: SessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            revision: 0,
            user_id,
            config,
            turns: Vec::new(),
            cursor: 0,
            status: SessionStatus::NotStarted,
            created_at: Utc::now(),
            completed_at: None,
            final_report: None,
        }
    }

    /// Changes on every successful transition; a new session gets a new id.
    pub fn stamp(&self) -> SessionStamp {
        SessionStamp {
            id: self.id,
            revision: self.revision,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.config.role
    }

    pub fn length(&self) -> usize {
        self.config.length
    }

    pub fn categories(&self) -> &[QuestionCategory] {
        &self.config.categories
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn final_report(&self) -> Option<&FinalReport> {
        self.final_report.as_ref()
    }

    /// The outstanding question, if the session is waiting for an answer.
    pub fn pending_question(&self) -> Option<&QuestionDescriptor> {
        if self.status != SessionStatus::InProgress {
            return None;
        }
        self.turns
            .get(self.cursor)
            .filter(|turn| turn.answer.is_none())
            .map(|turn| &turn.question)
    }

    /// Every question asked so far, in order.
    pub fn asked_questions(&self) -> Vec<QuestionDescriptor> {
        self.turns.iter().map(|t| t.question.clone()).collect()
    }

    /// True once every question has been answered.
    pub fn is_exhausted(&self) -> bool {
        self.cursor == self.config.length
    }

    /// NotStarted → InProgress with `first` as the outstanding question.
    pub fn start(&mut self, first: QuestionDescriptor) -> Result<(), InterviewError> {
        if self.status != SessionStatus::NotStarted {
            return Err(InterviewError::InvalidTransition(
                "session has already been started",
            ));
        }
        self.check_category(&first)?;

        self.turns.push(Turn {
            question: first,
            answer: None,
            feedback: None,
        });
        self.status = SessionStatus::InProgress;
        self.revision += 1;
        Ok(())
    }

    /// Fills the outstanding stub and moves the cursor forward by one.
    pub fn record_answer(
        &mut self,
        answer: &str,
        feedback: Option<String>,
    ) -> Result<(), InterviewError> {
        if self.status != SessionStatus::InProgress {
            return Err(InterviewError::NoActiveSession);
        }
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(InterviewError::EmptyAnswer);
        }
        let turn = self
            .turns
            .get_mut(self.cursor)
            .filter(|turn| turn.answer.is_none())
            .ok_or(InterviewError::InvalidTransition(
                "no outstanding question to answer",
            ))?;

        turn.answer = Some(answer.to_string());
        turn.feedback = feedback;
        self.cursor += 1;
        self.revision += 1;
        Ok(())
    }

    /// Appends the next outstanding question. Only valid right after an answer
    /// was recorded and while questions remain.
    pub fn push_question(&mut self, question: QuestionDescriptor) -> Result<(), InterviewError> {
        if self.status != SessionStatus::InProgress {
            return Err(InterviewError::NoActiveSession);
        }
        if self.turns.len() != self.cursor {
            return Err(InterviewError::InvalidTransition(
                "previous question is still outstanding",
            ));
        }
        if self.is_exhausted() {
            return Err(InterviewError::InvalidTransition(
                "all questions have already been asked",
            ));
        }
        self.check_category(&question)?;

        self.turns.push(Turn {
            question,
            answer: None,
            feedback: None,
        });
        self.revision += 1;
        Ok(())
    }

    /// InProgress → Completed. Requires every question to be answered.
    pub fn complete(&mut self, report: FinalReport) -> Result<(), InterviewError> {
        if self.status != SessionStatus::InProgress {
            return Err(InterviewError::NoActiveSession);
        }
        if !self.is_exhausted() {
            return Err(InterviewError::InvalidTransition(
                "cannot finish before every question is answered",
            ));
        }

        self.status = SessionStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.final_report = Some(report);
        self.revision += 1;
        Ok(())
    }

    fn check_category(&self, question: &QuestionDescriptor) -> Result<(), InterviewError> {
        if self.config.categories.contains(&question.category) {
            Ok(())
        } else {
            Err(InterviewError::InvalidTransition(
                "question category is not allowed in this session",
            ))
        }
    }

    /// Structural invariants, checked by tests after every transition.
    #[cfg(test)]
    pub fn invariants_hold(&self) -> bool {
        let answered = self.turns.iter().filter(|t| t.answer.is_some()).count();
        let answered_prefix = self.turns[..self.cursor.min(self.turns.len())]
            .iter()
            .all(|t| t.answer.as_deref().is_some_and(|a| !a.is_empty()));
        let shape = match self.status {
            SessionStatus::NotStarted => self.turns.is_empty() && self.cursor == 0,
            SessionStatus::InProgress => {
                self.turns.len() == self.cursor + 1 || self.turns.len() == self.cursor
            }
            SessionStatus::Completed => {
                self.turns.len() == self.config.length && self.final_report.is_some()
            }
        };

        answered == self.cursor
            && answered_prefix
            && self.cursor <= self.config.length
            && (self.status == SessionStatus::Completed) == (self.cursor == self.config.length)
            && shape
    }
}
