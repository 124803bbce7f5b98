use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::archive::TranscriptRecord;
use crate::errors::AppError;
use crate::interview::catalog::{
    InterviewLength, LengthSpec, QuestionCategory, Role, MAX_QUESTIONS,
};
use crate::interview::engine::{NextStep, StartedInterview};
use crate::interview::session::{Session, UserId};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StartInterviewRequest {
    pub user_id: String,
    pub role: Role,
    pub length: LengthSpec,
    pub categories: Vec<QuestionCategory>,
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Serialize)]
pub struct CatalogEntry {
    pub id: serde_json::Value,
    pub name: String,
}

#[derive(Serialize)]
pub struct LengthEntry {
    pub id: InterviewLength,
    pub questions: usize,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub roles: Vec<CatalogEntry>,
    pub lengths: Vec<LengthEntry>,
    pub categories: Vec<CatalogEntry>,
    pub max_questions: usize,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub interviews: Vec<TranscriptRecord>,
}

/// GET /api/v1/catalog
pub async fn handle_catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        roles: Role::ALL
            .iter()
            .map(|r| CatalogEntry {
                id: serde_json::to_value(r).unwrap_or_default(),
                name: r.display_name().to_string(),
            })
            .collect(),
        lengths: InterviewLength::ALL
            .iter()
            .map(|&l| LengthEntry {
                id: l,
                questions: l.question_count(),
            })
            .collect(),
        categories: QuestionCategory::ALL
            .iter()
            .map(|c| CatalogEntry {
                id: serde_json::to_value(c).unwrap_or_default(),
                name: c.display_name().to_string(),
            })
            .collect(),
        max_questions: MAX_QUESTIONS,
    })
}

/// POST /api/v1/interviews
pub async fn handle_start(
    State(state): State<AppState>,
    payload: Result<Json<StartInterviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StartedInterview>), AppError> {
    let Json(req) = payload?;
    let user_id = parse_user_id(&req.user_id)?;
    let started = state
        .interviewer
        .start(user_id, req.role, req.length.question_count(), req.categories)
        .await?;
    Ok((StatusCode::CREATED, Json(started)))
}

/// POST /api/v1/interviews/:user_id/answers
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<AnswerRequest>, JsonRejection>,
) -> Result<Json<NextStep>, AppError> {
    let Json(req) = payload?;
    let user_id = parse_user_id(&user_id)?;
    let step = state.interviewer.advance(&user_id, &req.answer).await?;
    Ok(Json(step))
}

/// GET /api/v1/interviews/:user_id
pub async fn handle_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Session>, AppError> {
    let user_id = parse_user_id(&user_id)?;
    state
        .interviewer
        .status(&user_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No interview found for user {user_id}")))
}

/// DELETE /api/v1/interviews/:user_id
pub async fn handle_abort(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user_id = parse_user_id(&user_id)?;
    state.interviewer.abort(&user_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/interviews/:user_id/history
pub async fn handle_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let user_id = parse_user_id(&user_id)?;
    let interviews = state.interviewer.history(&user_id).await;
    Ok(Json(HistoryResponse { interviews }))
}

fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("user_id must not be empty".to_string()));
    }
    Ok(UserId::new(raw))
}
