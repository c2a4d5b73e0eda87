//! API route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use kham_core::schema::{
    AuthResponse, LeaderboardSubmission, LoginRequest, ProfileRequest, RegisterRequest,
};
use kham_core::validation::{
    validate_character, validate_display_name, validate_limit, validate_login, validate_password,
    validate_period, validate_username,
};
use kham_core::{LeaderboardEntry, ProgressDocument, ProgressState, PublicUser, UserDocument};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, AuthUser};
use crate::error::ApiError;
use crate::{metrics, AppState};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Query string of the leaderboard listing.
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    /// Rows to return.
    pub limit: Option<usize>,
}

/// Service description and endpoint list.
pub async fn service_info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": "kham-server",
        "version": env!("CARGO_PKG_VERSION"),
        "levels": state.lexicon.level_count(),
        "endpoints": [
            "POST /api/auth/register",
            "POST /api/auth/login",
            "GET /api/user/profile",
            "PUT /api/user/profile",
            "GET /api/progress",
            "PUT /api/progress",
            "GET /api/leaderboard/{period}",
            "POST /api/leaderboard",
            "GET /health",
            "GET /metrics",
        ],
    }))
}

async fn hash_password(password: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || auth::hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Create an account with fresh progress and sign it in.
#[tracing::instrument(name = "register", skip(state, request), fields(username = %request.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let username = validate_username(&request.username)?.to_string();
    validate_password(&request.password)?;
    let display_name = validate_display_name(request.display_name.as_deref().unwrap_or(&username))?
        .to_string();
    let character_id = validate_character(request.character_id)?;

    // Checked again atomically on insert; this only skips the hash.
    if state.store.user_by_username(&username).is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }
    let password_hash = hash_password(request.password).await?;

    let now = Utc::now();
    let user = UserDocument {
        id: uuid::Uuid::new_v4().to_string(),
        username,
        password_hash,
        display_name,
        character_id,
        character_image: character_id.image_ref(),
        total_score: 0,
        games_played: 0,
        created_at: now,
        last_login_at: None,
    };
    state.store.insert_user(user.clone())?;

    let mut progress = ProgressDocument::default();
    progress.updated_at = Some(now);
    state.store.put_progress(&user.id, progress);

    metrics::record_registration(state.store.user_count());
    tracing::info!(user_id = %user.id, "User registered");

    let token = state.tokens.issue(&user.id);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            token,
            user: user.public(),
        }),
    ))
}

/// Sign in with username and password.
#[tracing::instrument(name = "login", skip(state, request), fields(username = %request.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let username = validate_login(&request.username, &request.password)
        .inspect_err(|_| metrics::record_login("invalid"))?;

    let Some(user) = state.store.user_by_username(username) else {
        metrics::record_login("bad_credentials");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    };
    if !verify_password(request.password.clone(), user.password_hash.clone()).await? {
        metrics::record_login("bad_credentials");
        return Err(ApiError::BadRequest(INVALID_CREDENTIALS.to_string()));
    }

    let user = state
        .store
        .update_user(&user.id, |u| u.last_login_at = Some(Utc::now()))?;
    metrics::record_login("success");
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token: state.tokens.issue(&user.id),
        user: user.public(),
    }))
}

/// The caller's account.
#[tracing::instrument(name = "get_profile", skip(state))]
pub async fn get_profile(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PublicUser>, ApiError> {
    state
        .store
        .user(&auth.user_id)
        .map(|u| Json(u.public()))
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Change display name and/or character.
#[tracing::instrument(name = "update_profile", skip(state, request))]
pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    let display_name = request
        .display_name
        .as_deref()
        .map(validate_display_name)
        .transpose()?
        .map(str::to_string);
    let character_id = request
        .character_id
        .map(|id| validate_character(Some(id)))
        .transpose()?;

    let user = state.store.update_user(&auth.user_id, |u| {
        if let Some(name) = display_name {
            u.display_name = name;
        }
        if let Some(id) = character_id {
            u.character_id = id;
            u.character_image = id.image_ref();
        }
    })?;
    tracing::debug!(user_id = %user.id, "Profile updated");

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": user.public(),
    })))
}

/// The caller's progress document.
#[tracing::instrument(name = "get_progress", skip(state))]
pub async fn get_progress(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProgressDocument>, ApiError> {
    state
        .store
        .progress(&auth.user_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Progress not found".to_string()))
}

/// Merge a progress snapshot into the caller's stored progress.
///
/// The snapshot is normalized through the lexicon first. The unlock frontier
/// and answered sets never shrink; the user's total score follows the merged
/// level scores.
#[tracing::instrument(name = "put_progress", skip(state, incoming))]
pub async fn put_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(incoming): Json<ProgressDocument>,
) -> Result<Json<Value>, ApiError> {
    if state.store.user(&auth.user_id).is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let lexicon = &state.lexicon;
    let snapshot = incoming.into_state(lexicon);
    let stored = state.store.upsert_progress(&auth.user_id, |current| {
        let mut merged = current.map_or_else(ProgressState::default, |d| d.into_state(lexicon));
        merged.merge_from(&snapshot);
        let mut doc = ProgressDocument::from_state(&merged);
        doc.total_stars = current.map_or(0, |d| d.total_stars).max(incoming.total_stars);
        doc.updated_at = Some(Utc::now());
        doc
    });

    let total_score = stored.total_score();
    state
        .store
        .update_user(&auth.user_id, |u| u.total_score = total_score)?;
    metrics::record_progress_save();
    tracing::debug!(
        user_id = %auth.user_id,
        unlocked = stored.unlocked_levels.len(),
        total_score,
        "Progress saved"
    );

    Ok(Json(json!({
        "message": "Progress updated successfully",
        "progress": stored,
    })))
}

/// Top entries for a period, highest score first.
#[tracing::instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    Path(period): Path<String>,
    Query(query): Query<LeaderboardQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let period = validate_period(&period)?;
    let limit = validate_limit(query.limit)?;
    Ok(Json(state.store.leaderboard(period, limit)))
}

/// Record the caller's score for a period, replacing their previous entry.
#[tracing::instrument(name = "submit_leaderboard", skip(state, submission))]
pub async fn submit_leaderboard(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(submission): Json<LeaderboardSubmission>,
) -> Result<Json<Value>, ApiError> {
    let period = validate_period(&submission.period)?;
    let user = state
        .store
        .user(&auth.user_id)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let entry = LeaderboardEntry {
        user_id: user.id,
        username: user.username,
        display_name: user.display_name,
        character_id: user.character_id,
        score: submission.score,
        level: submission.level,
        period,
        date: Utc::now(),
    };
    state.store.upsert_leaderboard(entry.clone());
    metrics::record_leaderboard_update(period.as_str());
    tracing::info!(user_id = %entry.user_id, %period, score = entry.score, "Leaderboard updated");

    Ok(Json(json!({
        "message": "Leaderboard updated",
        "entry": entry,
    })))
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(state))]
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => ApiError::NotFound("Metrics disabled".to_string()).into_response(),
    }
}
