//! Append-only archive of completed interviews.
//!
//! Archival is best effort: callers log failures and move on.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use crate::interview::catalog::Role;
use crate::interview::session::{QuestionDescriptor, Session, SessionStatus};
use crate::models::interview::InterviewRow;

const SCHEMA: &str = include_str!("../../migrations/0001_create_interviews.sql");

/// Snapshot of one completed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranscriptRecord {
    pub user_id: String,
    pub role: Role,
    pub questions: Vec<QuestionDescriptor>,
    pub answers: Vec<String>,
    pub per_turn_feedback: Vec<Option<String>>,
    pub final_report: String,
    pub extracted_score: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl TranscriptRecord {
    /// `None` unless the session is completed.
    pub fn from_session(session: &Session) -> Option<Self> {
        if session.status() != SessionStatus::Completed {
            return None;
        }
        let report = session.final_report()?;
        let turns = session.turns();

        Some(Self {
            user_id: session.user_id().to_string(),
            role: session.role(),
            questions: turns.iter().map(|t| t.question.clone()).collect(),
            answers: turns
                .iter()
                .map(|t| t.answer.clone().unwrap_or_default())
                .collect(),
            per_turn_feedback: turns.iter().map(|t| t.feedback.clone()).collect(),
            final_report: report.text.clone(),
            extracted_score: report.score,
            created_at: session.completed_at().unwrap_or_else(Utc::now),
        })
    }

    fn from_row(row: InterviewRow) -> Result<Self> {
        let role: Role = serde_json::from_value(Value::String(row.role.clone()))
            .with_context(|| format!("Unknown role '{}' in archived interview {}", row.role, row.id))?;

        Ok(Self {
            user_id: row.user_id,
            role,
            questions: serde_json::from_value(row.questions)
                .with_context(|| format!("Malformed questions in archived interview {}", row.id))?,
            answers: serde_json::from_value(row.answers)
                .with_context(|| format!("Malformed answers in archived interview {}", row.id))?,
            per_turn_feedback: serde_json::from_value(row.feedback)
                .with_context(|| format!("Malformed feedback in archived interview {}", row.id))?,
            final_report: row.final_report,
            extracted_score: row.score.and_then(|s| u8::try_from(s).ok()),
            created_at: row.created_at,
        })
    }
}

#[async_trait]
pub trait TranscriptArchive: Send + Sync {
    async fn append(&self, record: &TranscriptRecord) -> Result<()>;

    /// Most recent records for `user_id`, newest first.
    async fn recent(&self, user_id: &str, limit: i64) -> Result<Vec<TranscriptRecord>>;
}

pub struct PgTranscriptArchive {
    pool: PgPool,
}

impl PgTranscriptArchive {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `interviews` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .context("Failed to create interviews table")?;
        info!("Interview archive schema ready");
        Ok(())
    }
}

#[async_trait]
impl TranscriptArchive for PgTranscriptArchive {
    async fn append(&self, record: &TranscriptRecord) -> Result<()> {
        let role = serde_json::to_value(record.role)?
            .as_str()
            .map(str::to_string)
            .context("Role did not serialize to a string")?;

        sqlx::query(
            r#"
            INSERT INTO interviews
                (user_id, role, questions, answers, feedback, final_report, score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&record.user_id)
        .bind(role)
        .bind(serde_json::to_value(&record.questions)?)
        .bind(serde_json::to_value(&record.answers)?)
        .bind(serde_json::to_value(&record.per_turn_feedback)?)
        .bind(&record.final_report)
        .bind(record.extracted_score.map(i16::from))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to archive interview")?;

        Ok(())
    }

    async fn recent(&self, user_id: &str, limit: i64) -> Result<Vec<TranscriptRecord>> {
        let rows = sqlx::query_as::<_, InterviewRow>(
            r#"
            SELECT *
            FROM interviews
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load interview history")?;

        rows.into_iter().map(TranscriptRecord::from_row).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::report::FinalReport;
    use crate::interview::catalog::QuestionCategory;
    use crate::interview::session::{SessionConfig, UserId};

    fn question(text: &str) -> QuestionDescriptor {
        QuestionDescriptor {
            text: text.to_string(),
            category: QuestionCategory::Technical,
        }
    }

    #[test]
    fn test_record_requires_completed_session() {
        let config = SessionConfig::new(Role::JuniorPython, 1, [QuestionCategory::Technical]).unwrap();
        let mut session = Session::new(UserId::from("u1"), config);
        assert!(TranscriptRecord::from_session(&session).is_none());

        session.start(question("What is a list?")).unwrap();
        session.record_answer("A mutable sequence", Some("Good.".to_string())).unwrap();
        assert!(TranscriptRecord::from_session(&session).is_none());

        session.complete(FinalReport::fallback()).unwrap();
        let record = TranscriptRecord::from_session(&session).unwrap();
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.questions, vec![question("What is a list?")]);
        assert_eq!(record.answers, vec!["A mutable sequence".to_string()]);
        assert_eq!(record.per_turn_feedback, vec![Some("Good.".to_string())]);
        assert_eq!(record.extracted_score, None);
    }

    #[test]
    fn test_record_from_row_decodes_json_columns() {
        let row = InterviewRow {
            id: 7,
            user_id: "u2".to_string(),
            role: "data_scientist".to_string(),
            questions: serde_json::json!([{ "text": "What is overfitting?", "category": "technical" }]),
            answers: serde_json::json!(["Memorising noise"]),
            feedback: serde_json::json!([null]),
            final_report: "Report".to_string(),
            score: Some(6),
            created_at: Utc::now(),
        };

        let record = TranscriptRecord::from_row(row).unwrap();
        assert_eq!(record.role, Role::DataScientist);
        assert_eq!(record.questions[0].text, "What is overfitting?");
        assert_eq!(record.per_turn_feedback, vec![None]);
        assert_eq!(record.extracted_score, Some(6));
    }

    #[test]
    fn test_record_from_row_rejects_unknown_role() {
        let row = InterviewRow {
            id: 1,
            user_id: "u".to_string(),
            role: "astronaut".to_string(),
            questions: serde_json::json!([]),
            answers: serde_json::json!([]),
            feedback: serde_json::json!([]),
            final_report: String::new(),
            score: None,
            created_at: Utc::now(),
        };
        assert!(TranscriptRecord::from_row(row).is_err());
    }

    #[test]
    fn test_schema_is_single_idempotent_statement() {
        assert!(SCHEMA.contains("CREATE TABLE IF NOT EXISTS interviews"));
        assert_eq!(SCHEMA.matches(';').count(), 0);
    }
}
