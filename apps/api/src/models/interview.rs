use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// One archived interview. `questions`, `answers` and `feedback` are parallel
/// JSON arrays, one element per turn.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: i64,
    pub user_id: String,
    pub role: String,
    pub questions: Value,
    pub answers: Value,
    pub feedback: Value,
    pub final_report: String,
    pub score: Option<i16>,
    pub created_at: DateTime<Utc>,
}
