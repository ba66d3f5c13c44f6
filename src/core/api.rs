//! HTTP API for DigiManifest
//!
//! Endpoints:
//! - GET  /health                       - Health check
//! - POST /api/manifestation/generate   - Generate one manifestation
//! - GET  /api/user/settings            - Stored settings
//! - PUT  /api/user/settings            - Validate and store settings
//! - GET  /api/user/stats               - Aggregate stats
//! - GET  /api/user/quota               - Today's usage against the limit
//! - GET  /api/user/history             - Recent generations
//! - GET  /api/grabovoi/codes           - Code catalog
//! - GET  /api/grabovoi/daily           - Code of the day
//! - POST /api/grabovoi/daily/view      - Code of the day, counted as a view
//! - GET  /api/community/stats          - Totals across users
//! - GET  /api/user/affirmations        - The caller's affirmations
//! - POST /api/user/affirmations        - Add an affirmation
//! - GET  /api/social-proof/success-stories - Latest stories, newest first
//! - POST /api/social-proof/submit      - Share a success story
//!
//! Identity comes from the auth layer in front of this service as
//! `x-user-id` and `x-user-tier` headers.

use axum::{
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::core::{ManifestationOrchestrator, HISTORY_CAPACITY};
use crate::types::{
    AffirmationDraft, AggregateStats, CommunityStats, CustomAffirmation, GenerationError,
    GenerationSettings, GrabovoiCode, ManifestationEvent, NotificationEntry, PublicStory,
    QuotaStatus, RepositoryError, SettingsError, StoryDraft, SubmissionError, UserTier,
};

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the subscription tier (`free` | `pro`)
pub const USER_TIER_HEADER: &str = "x-user-tier";

const DEFAULT_HISTORY_LIMIT: usize = 20;

/// App state
pub struct AppState {
    pub orchestrator: ManifestationOrchestrator,
}

// =============================================================================
// ERRORS
// =============================================================================

/// JSON error body: `{ "error": kind, "message": text }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.kind.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(e: GenerationError) -> Self {
        let status = match &e {
            GenerationError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            GenerationError::InvalidSettings(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GenerationError::PersistenceFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        ApiError::new(status, e.kind(), e.to_string())
    }
}

impl From<SettingsError> for ApiError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::Invalid(v) => ApiError::new(StatusCode::BAD_REQUEST, v.kind(), v.to_string()),
            SettingsError::Persistence(r) => r.into(),
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Invalid(v) => ApiError::new(StatusCode::BAD_REQUEST, v.kind(), v.to_string()),
            SubmissionError::Persistence(r) => r.into(),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "persistence_failure", e.to_string())
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// The authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub tier: UserTier,
}

#[async_trait::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized", "missing user identity")
            })?;

        // Absent tier reads as Free
        let tier = match parts.headers.get(USER_TIER_HEADER) {
            None => UserTier::Free,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(UserTier::parse)
                .ok_or_else(|| {
                    ApiError::new(StatusCode::BAD_REQUEST, "invalid_tier", "tier must be 'free' or 'pro'")
                })?,
        };

        Ok(Caller {
            user_id: user_id.to_string(),
            tier,
        })
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub codes: usize,
}

/// Generate response
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub event: ManifestationEvent,
    pub notification: String,
    pub quota: QuotaStatus,
}

/// History query
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// History response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<NotificationEntry>,
}

/// Catalog response
#[derive(Debug, Serialize)]
pub struct CodesResponse {
    pub codes: Vec<GrabovoiCode>,
}

/// Code of the day response
#[derive(Debug, Serialize)]
pub struct DailyCodeResponse {
    pub date: String,
    pub code: GrabovoiCode,
}

/// Affirmations response
#[derive(Debug, Serialize)]
pub struct AffirmationsResponse {
    pub affirmations: Vec<CustomAffirmation>,
}

/// Success stories response
#[derive(Debug, Serialize)]
pub struct StoriesResponse {
    pub stories: Vec<PublicStory>,
}

// =============================================================================
// ROUTER
// =============================================================================

/// Create the API router
pub fn create_router(orchestrator: ManifestationOrchestrator) -> Router {
    let state = Arc::new(AppState { orchestrator });

    Router::new()
        .route("/health", get(health))
        .route("/api/manifestation/generate", post(generate))
        .route("/api/user/settings", get(get_settings).put(put_settings))
        .route("/api/user/stats", get(get_stats))
        .route("/api/user/quota", get(get_quota))
        .route("/api/user/history", get(get_history))
        .route("/api/grabovoi/codes", get(get_codes))
        .route("/api/grabovoi/daily", get(get_daily_code))
        .route("/api/grabovoi/daily/view", post(view_daily_code))
        .route("/api/community/stats", get(get_community_stats))
        .route("/api/user/affirmations", get(get_affirmations).post(add_affirmation))
        .route("/api/social-proof/success-stories", get(get_success_stories))
        .route("/api/social-proof/submit", post(submit_success_story))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        codes: state.orchestrator.catalog().len(),
    })
}

/// Generate one manifestation for the caller
async fn generate(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<GenerateResponse>, ApiError> {
    let (event, quota) = state
        .orchestrator
        .generate_with_status(&caller.user_id, caller.tier)
        .await?;

    Ok(Json(GenerateResponse {
        notification: event.to_parseable_string(),
        event,
        quota,
    }))
}

async fn get_settings(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<GenerationSettings>, ApiError> {
    Ok(Json(state.orchestrator.settings(&caller.user_id).await?))
}

/// Validate and store a settings draft
async fn put_settings(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(draft): Json<GenerationSettings>,
) -> Result<Json<GenerationSettings>, ApiError> {
    let saved = state
        .orchestrator
        .save_settings(&caller.user_id, caller.tier, draft)
        .await?;
    Ok(Json(saved))
}

async fn get_stats(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<AggregateStats>, ApiError> {
    Ok(Json(state.orchestrator.stats(&caller.user_id).await?))
}

async fn get_quota(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<QuotaStatus>, ApiError> {
    Ok(Json(
        state
            .orchestrator
            .quota_status(&caller.user_id, caller.tier)
            .await?,
    ))
}

/// Recent generations, newest first
async fn get_history(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(HISTORY_CAPACITY);
    let entries = state.orchestrator.history(&caller.user_id, limit).await?;
    Ok(Json(HistoryResponse { entries }))
}

async fn get_codes(State(state): State<Arc<AppState>>) -> Json<CodesResponse> {
    Json(CodesResponse {
        codes: state.orchestrator.catalog().codes().to_vec(),
    })
}

/// Code of the day, same for every caller
async fn get_daily_code(State(state): State<Arc<AppState>>) -> Json<DailyCodeResponse> {
    let today = state.orchestrator.today();
    Json(DailyCodeResponse {
        date: today.format("%Y-%m-%d").to_string(),
        code: state.orchestrator.code_of_day_on(today),
    })
}

async fn view_daily_code(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<DailyCodeResponse>, ApiError> {
    let today = state.orchestrator.today();
    let code = state.orchestrator.record_code_view(&caller.user_id).await?;
    Ok(Json(DailyCodeResponse {
        date: today.format("%Y-%m-%d").to_string(),
        code,
    }))
}

async fn get_community_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommunityStats>, ApiError> {
    Ok(Json(state.orchestrator.community_stats().await?))
}

async fn get_affirmations(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<AffirmationsResponse>, ApiError> {
    let affirmations = state.orchestrator.affirmations(&caller.user_id).await?;
    Ok(Json(AffirmationsResponse { affirmations }))
}

async fn add_affirmation(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(draft): Json<AffirmationDraft>,
) -> Result<(StatusCode, Json<CustomAffirmation>), ApiError> {
    let saved = state.orchestrator.add_affirmation(&caller.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Latest stories from every user, without submitter ids
async fn get_success_stories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoriesResponse>, ApiError> {
    let stories = state.orchestrator.success_stories().await?;
    Ok(Json(StoriesResponse {
        stories: stories.iter().map(PublicStory::from).collect(),
    }))
}

async fn submit_success_story(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(draft): Json<StoryDraft>,
) -> Result<(StatusCode, Json<PublicStory>), ApiError> {
    let story = state.orchestrator.submit_success_story(&caller.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(PublicStory::from(&story))))
}

/// Run the API server until Ctrl-C
pub async fn run_server(addr: &str, orchestrator: ManifestationOrchestrator) -> std::io::Result<()> {
    let router = create_router(orchestrator);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "DigiManifest API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await
}

// =============================================================================
// TESTS
// =============================================================================
