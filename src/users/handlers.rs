use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::TokenPair,
        jwt::JwtKeys,
        middleware::{require_access_token, AuthUser},
        password::{hash_password, verify_password},
    },
    error::ApiError,
    state::AppState,
    users::{
        dto::{
            LoginRequest, MessageResponse, Profile, ProfileResponse, RegisterRequest,
            UpdateProfileRequest,
        },
        repo_types::NewUser,
        validation::{require, require_phone_format, same_phone},
    },
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn profile_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/user", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(
            JwtKeys::from_ref(state),
            require_access_token,
        ))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(p)| p).map_err(|e| {
        warn!(error = %e, "rejected request body");
        ApiError::validation("invalid request body")
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let payload = body(payload)?;

    require(&payload.full_name, "full name")?;
    require(&payload.phone_number, "phone number")?;
    require(&payload.password, "password")?;
    require_phone_format(&payload.phone_number)?;

    if state.users.count_by_phone(&payload.phone_number).await? != 0 {
        warn!(phone = %payload.phone_number, "phone number already registered");
        return Err(ApiError::phone_taken());
    }

    let password = hash_password(&payload.password)?;
    let user = state
        .users
        .insert(NewUser {
            user_id: Uuid::new_v4(),
            full_name: payload.full_name.trim().to_string(),
            phone_number: payload.phone_number,
            password,
            created_at: OffsetDateTime::now_utc(),
        })
        .await?;

    info!(user_id = %user.user_id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Successfully Registered!")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ApiError> {
    let payload = body(payload)?;

    if payload.phone_number.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation(
            "please input your phone number and password",
        ));
    }

    let user = match state.users.find_by_phone(&payload.phone_number).await? {
        Some(u) => u,
        None => {
            warn!(phone = %payload.phone_number, "login unknown phone number");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password)? {
        warn!(user_id = %user.user_id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    // Tokens are only issued once the stats are persisted.
    state
        .users
        .update_login_stats(
            user.id,
            user.successful_login_attempts + 1,
            OffsetDateTime::now_utc(),
        )
        .await?;

    let tokens = JwtKeys::from_ref(&state).issue_pair(user.user_id)?;

    info!(user_id = %user.user_id, "user logged in");
    Ok(Json(tokens))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state
        .users
        .find_by_external_id(user_id)
        .await?
        .ok_or_else(|| {
            warn!(%user_id, "token subject has no account");
            ApiError::NotFound("user not found".into())
        })?;

    Ok(Json(ProfileResponse {
        data: Profile {
            full_name: user.full_name,
            phone_number: user.phone_number,
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let payload = body(payload)?;

    require(&payload.full_name, "full name")?;
    require(&payload.phone_number, "phone number")?;
    require_phone_format(&payload.phone_number)?;

    let user = state
        .users
        .find_by_external_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))?;

    let holders = state.users.count_by_phone(&payload.phone_number).await?;
    if holders != 0 && !same_phone(&payload.phone_number, &user.phone_number) {
        warn!(%user_id, phone = %payload.phone_number, "phone number held by another account");
        return Err(ApiError::phone_taken());
    }

    state
        .users
        .update_profile(user.id, payload.full_name.trim(), &payload.phone_number)
        .await?;

    info!(%user_id, "profile updated");
    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("User Profile Successfully Updated!")),
    ))
}
