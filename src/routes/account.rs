use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::auth::SignedIn;
use crate::clock;
use crate::error::{AppError, Result};
use crate::models::{Access, NewAccount, Profile, Role};
use crate::repo::{profiles, sessions};
use crate::routes::SuccessResponse;
use crate::security::{hash_password, issue_session_token, verify_password};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub profile: Profile,
    pub access: Access,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub profile: Profile,
    pub access: Access,
}

/// Register a new resident
///
/// New accounts start unverified with the `full` role; emails listed in
/// `ADMIN_EMAILS` are created as verified administrators.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<NewAccount>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let account = payload.validate()?;

    let (role, is_verified) = if state.config.is_admin_email(&account.email) {
        (Role::Admin, true)
    } else {
        (Role::Full, false)
    };

    let password = account.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let ttl = state.config.session_ttl_secs;
    let (profile, session_id) = state
        .with_db(move |db| {
            let now = clock::now();
            let profile =
                profiles::create_account(db, &account, &password_hash, role, is_verified, now)?;
            let session_id = sessions::create_session(db, &profile.id, now, ttl)?;
            Ok((profile, session_id))
        })
        .await?;

    let token = issue_session_token(&session_id, &state.config.app_secret_key)?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            access: profile.access(),
            profile,
        }),
    ))
}

/// Exchange email and password for a session token
///
/// Unknown emails and wrong passwords produce the same error.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SessionResponse>> {
    let email = payload.email.trim().to_lowercase();

    let lookup = email.clone();
    let credentials = state
        .with_db(move |db| profiles::find_credentials(db, &lookup))
        .await?
        .ok_or_else(|| {
            tracing::info!("Sign-in attempt for unknown email");
            AppError::InvalidCredentials
        })?;

    let password = payload.password;
    let stored_hash = credentials.password_hash.clone();
    let matches =
        tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await??;
    if !matches {
        tracing::info!("Wrong password for user {}", credentials.user_id);
        return Err(AppError::InvalidCredentials);
    }

    let ttl = state.config.session_ttl_secs;
    let user_id = credentials.user_id;
    let (profile, session_id) = state
        .with_db(move |db| {
            let profile =
                profiles::get_profile(db, &user_id)?.ok_or(AppError::InvalidCredentials)?;
            let session_id = sessions::create_session(db, &profile.id, clock::now(), ttl)?;
            Ok((profile, session_id))
        })
        .await?;

    let token = issue_session_token(&session_id, &state.config.app_secret_key)?;
    tracing::info!("User {} signed in", profile.id);

    Ok(Json(SessionResponse {
        token,
        access: profile.access(),
        profile,
    }))
}

pub async fn sign_out(
    State(state): State<AppState>,
    signed_in: SignedIn,
) -> Result<Json<SuccessResponse>> {
    let session_id = signed_in.session_id;
    state
        .with_db(move |db| sessions::delete_session(db, &session_id))
        .await?;
    Ok(SuccessResponse::ok())
}

/// Current profile and what it may do; answers even for blocked accounts
pub async fn me(SignedIn { profile, .. }: SignedIn) -> Json<MeResponse> {
    Json(MeResponse {
        access: profile.access(),
        profile,
    })
}
