//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/body parameters via axum extractors, talks to
//! the store through AppState, and returns JSON responses.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use heirloom_core::types::AnswerValue;
use heirloom_store::QuestionnaireStore;
use heirloom_timer::TimeBeacon;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub current_section: u32,
    pub status: String,
    pub time_remaining_secs: u32,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub question_id: String,
    /// The decoded value: a JSON string for text answers, a JSON array for
    /// multi-select answers.
    pub value: AnswerValue,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswersResponse {
    pub submission_id: Uuid,
    pub answers: Vec<AnswerResponse>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertAnswerRequest {
    pub question_id: String,
    pub answer_text: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /api/submissions/{id}
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let submission = state
        .store
        .fetch_submission(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No submission {}", id)))?;

    Ok(Json(SubmissionResponse {
        id: submission.id,
        user_id: submission.user_id,
        current_section: submission.current_section,
        status: submission.status.as_str().to_string(),
        time_remaining_secs: submission.time_remaining_secs,
        submitted_at: submission.submitted_at,
    }))
}

/// GET /api/submissions/{id}/answers
pub async fn get_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnswersResponse>, ApiError> {
    if state.store.fetch_submission(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("No submission {}", id)));
    }
    let records = state.store.fetch_answers(id).await?;
    let answers = records
        .into_iter()
        .map(|r| AnswerResponse {
            question_id: r.question_id,
            value: AnswerValue::decode(&r.answer_text),
        })
        .collect();
    Ok(Json(AnswersResponse {
        submission_id: id,
        answers,
    }))
}

/// PUT /api/submissions/{id}/answers
pub async fn upsert_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpsertAnswerRequest>,
) -> Result<StatusCode, ApiError> {
    if body.question_id.trim().is_empty() {
        return Err(ApiError::BadRequest("question_id must not be empty".to_string()));
    }
    if state.store.fetch_submission(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("No submission {}", id)));
    }
    state
        .store
        .upsert_answer(id, &body.question_id, &body.answer_text)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/submissions/{id}
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.store.fetch_submission(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("No submission {}", id)));
    }
    state.store.delete_submission(id).await?;
    tracing::info!(submission_id = %id, "Submission deleted via API");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/timer/beacon
///
/// Accepts a time checkpoint. Unknown submission ids return 404 so a stale
/// client stops beaconing, but a store write failure still answers 204;
/// the client cannot do anything useful with a beacon error.
pub async fn timer_beacon(
    State(state): State<AppState>,
    Json(beacon): Json<TimeBeacon>,
) -> Result<StatusCode, ApiError> {
    if state
        .store
        .fetch_submission(beacon.submission_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "No submission {}",
            beacon.submission_id
        )));
    }
    if let Err(e) = state
        .store
        .save_time_remaining(beacon.submission_id, beacon.time_remaining_secs)
        .await
    {
        tracing::warn!(error = %e, "Beacon write failed");
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use heirloom_core::types::Submission;
    use heirloom_store::{Database, SqliteStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn make_state() -> AppState {
        let db = Database::in_memory().unwrap();
        AppState::new(SqliteStore::new(Arc::new(db)))
    }

    fn make_app(state: AppState) -> axum::Router {
        crate::create_router(state, 4040)
    }

    async fn seed_submission(state: &AppState) -> Submission {
        let submission = Submission::new(Uuid::new_v4(), 7200);
        state.store.insert_submission(&submission).await.unwrap();
        submission
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = make_app(make_state());
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let health: HealthResponse = body_json(resp).await;
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn test_get_submission() {
        let state = make_state();
        let submission = seed_submission(&state).await;
        let app = make_app(state);

        let resp = app
            .oneshot(
                Request::get(format!("/api/submissions/{}", submission.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: SubmissionResponse = body_json(resp).await;
        assert_eq!(body.id, submission.id);
        assert_eq!(body.current_section, 1);
        assert_eq!(body.status, "in_progress");
        assert_eq!(body.time_remaining_secs, 7200);
    }

    #[tokio::test]
    async fn test_get_unknown_submission_is_404() {
        let app = make_app(make_state());
        let resp = app
            .oneshot(
                Request::get(format!("/api/submissions/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upsert_and_fetch_answers() {
        let state = make_state();
        let submission = seed_submission(&state).await;
        let app = make_app(state);

        let put = Request::put(format!("/api/submissions/{}/answers", submission.id))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({
                    "question_id": "q1_full_name",
                    "answer_text": "Maria Keller"
                })
                .to_string(),
            ))
            .unwrap();
        let resp = app.clone().oneshot(put).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = app
            .oneshot(
                Request::get(format!("/api/submissions/{}/answers", submission.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: AnswersResponse = body_json(resp).await;
        assert_eq!(body.answers.len(), 1);
        assert_eq!(body.answers[0].question_id, "q1_full_name");
        assert_eq!(
            body.answers[0].value,
            AnswerValue::Text("Maria Keller".to_string())
        );
    }

    #[tokio::test]
    async fn test_list_answers_decode_as_arrays() {
        let state = make_state();
        let submission = seed_submission(&state).await;
        state
            .store
            .upsert_answer(submission.id, "q1_values", "[\"Honesty\",\"Humor\"]")
            .await
            .unwrap();
        let app = make_app(state);

        let resp = app
            .oneshot(
                Request::get(format!("/api/submissions/{}/answers", submission.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body: AnswersResponse = body_json(resp).await;
        assert_eq!(
            body.answers[0].value,
            AnswerValue::List(vec!["Honesty".to_string(), "Humor".to_string()])
        );
    }

    #[tokio::test]
    async fn test_upsert_rejects_empty_question_id() {
        let state = make_state();
        let submission = seed_submission(&state).await;
        let app = make_app(state);

        let put = Request::put(format!("/api/submissions/{}/answers", submission.id))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "question_id": "  ", "answer_text": "x" }).to_string(),
            ))
            .unwrap();
        let resp = app.oneshot(put).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_timer_beacon_saves_time() {
        let state = make_state();
        let submission = seed_submission(&state).await;
        let app = make_app(state.clone());

        let post = Request::post("/api/timer/beacon")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_string(&TimeBeacon {
                    submission_id: submission.id,
                    time_remaining_secs: 5400,
                })
                .unwrap(),
            ))
            .unwrap();
        let resp = app.oneshot(post).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let stored = state
            .store
            .fetch_submission(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.time_remaining_secs, 5400);
    }

    #[tokio::test]
    async fn test_timer_beacon_unknown_submission_is_404() {
        let app = make_app(make_state());
        let post = Request::post("/api/timer/beacon")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_string(&TimeBeacon {
                    submission_id: Uuid::new_v4(),
                    time_remaining_secs: 100,
                })
                .unwrap(),
            ))
            .unwrap();
        let resp = app.oneshot(post).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_submission_removes_answers() {
        let state = make_state();
        let submission = seed_submission(&state).await;
        state
            .store
            .upsert_answer(submission.id, "q1_full_name", "Maria")
            .await
            .unwrap();
        let app = make_app(state.clone());

        let resp = app
            .clone()
            .oneshot(
                Request::delete(format!("/api/submissions/{}", submission.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        assert!(state
            .store
            .fetch_submission(submission.id)
            .await
            .unwrap()
            .is_none());

        let resp = app
            .oneshot(
                Request::get(format!("/api/submissions/{}/answers", submission.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
