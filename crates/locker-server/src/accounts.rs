//! Signup, OTP verification and signin.
//!
//! Possession of the emailed code is the only proof of identity.  Codes do
//! not expire and failed attempts are not counted.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use locker_store::{Store, User};

use crate::api::{AppState, SuccessResponse};
use crate::error::ApiError;
use crate::extract::{present, JsonBody};
use crate::notify::Notifier;

/// Inclusive bounds of a one-time code.
const OTP_RANGE: std::ops::RangeInclusive<u32> = 100_000..=999_999;

pub fn generate_otp() -> u32 {
    rand::thread_rng().gen_range(OTP_RANGE)
}

#[derive(Deserialize)]
pub struct SignupRequest {
    name: Option<String>,
    email: Option<String>,
    company_name: Option<String>,
    phone: Option<String>,
    provider: Option<String>,
}

#[derive(Serialize)]
pub struct SignupResponse {
    success: bool,
    user_id: String,
    message: &'static str,
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    email: Option<String>,
    /// Clients send the code as either a number or a string.
    otp: Option<Value>,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    email: Option<String>,
}

/// The supplied code as text, or `None` when missing.  Falsy JSON values
/// (`false`, `0`, `""`, `[]`, `{}`) count as missing.
fn otp_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Array(items) if items.is_empty() => None,
        Value::Object(fields) if fields.is_empty() => None,
        Value::String(s) => present(Some(s)),
        other => Some(other.to_string()),
    }
}

pub async fn signup<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let (Some(name), Some(email)) = (present(req.name), present(req.email)) else {
        return Err(ApiError::Validation("Name and email are required.".into()));
    };

    if state.store.find_user(&email).await?.is_some() {
        return Err(ApiError::Conflict("User with this email already exists.".into()));
    }

    let otp = generate_otp();
    if !state.notifier.send_otp_email(&email, otp).await {
        return Err(ApiError::Delivery("Failed to send OTP email.".into()));
    }

    let user = User {
        id: None,
        name,
        email,
        company_name: present(req.company_name),
        phone: present(req.phone),
        provider: present(req.provider),
        otp: Some(otp),
        signup_date: Utc::now(),
        records: None,
    };
    let id = state.store.insert_user(&user).await?;

    info!(email = %user.email, user_id = %id, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            success: true,
            user_id: id.to_hex(),
            message: "OTP sent to your email.",
        }),
    ))
}

pub async fn verify_otp<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    JsonBody(req): JsonBody<VerifyOtpRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (Some(email), Some(otp)) = (present(req.email), otp_text(req.otp)) else {
        return Err(ApiError::Validation("Email and OTP are required.".into()));
    };

    let user = state
        .store
        .find_user(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".into()))?;

    // A verified user has no stored code, so this never matches twice.
    if user.otp.map(|code| code.to_string()) != Some(otp) {
        return Err(ApiError::Auth("Incorrect OTP.".into()));
    }

    state.store.clear_otp(&email).await?;
    info!(email = %email, "OTP verified");
    Ok(SuccessResponse::ok("OTP verified successfully."))
}

pub async fn signin<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    JsonBody(req): JsonBody<SigninRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Some(email) = present(req.email) else {
        return Err(ApiError::Validation("Email is required.".into()));
    };

    if state.store.find_user(&email).await?.is_none() {
        return Err(ApiError::NotFound(
            "Email not registered. Please sign up.".into(),
        ));
    }

    Ok(SuccessResponse::ok("Sign in successful."))
}
