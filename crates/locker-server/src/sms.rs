//! Bulk SMS through a carrier's email-to-SMS gateway.
//!
//! This route answers in its own shape, `{"status", "message"}`, for
//! failures as well as success.

use axum::response::{IntoResponse, Response};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use locker_store::Store;

use crate::api::AppState;
use crate::error::ApiError;
use crate::extract::{present, JsonBody};
use crate::notify::Notifier;

#[derive(Deserialize)]
pub struct SendSmsRequest {
    #[serde(alias = "to")]
    numbers: Option<Vec<String>>,
    message: Option<String>,
    provider: Option<String>,
}

#[derive(Serialize)]
pub struct SendSmsResponse {
    status: &'static str,
    message: String,
}

/// An [`ApiError`] rendered as `{"status": "error", "message": ...}`.
pub struct SmsError(ApiError);

impl From<ApiError> for SmsError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SmsError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        if status.is_server_error() {
            error!(error = %self.0, "SMS request failed");
        }

        let body = SendSmsResponse {
            status: "error",
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Texts go out one at a time; the first failure aborts the rest and the
/// caller is not told which numbers were reached.
pub async fn send_sms<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    req: Result<JsonBody<SendSmsRequest>, ApiError>,
) -> Result<Json<SendSmsResponse>, SmsError> {
    let JsonBody(req) = req?;
    let numbers: Vec<String> = req
        .numbers
        .unwrap_or_default()
        .into_iter()
        .filter(|n| !n.is_empty())
        .collect();
    let (Some(message), Some(provider), false) =
        (present(req.message), present(req.provider), numbers.is_empty())
    else {
        return Err(
            ApiError::Validation("Numbers, message and provider are required.".into()).into(),
        );
    };

    if !state
        .notifier
        .send_sms_via_gateway(&numbers, &message, &provider)
        .await
    {
        return Err(ApiError::Delivery("Failed to send SMS.".into()).into());
    }

    info!(count = numbers.len(), provider = %provider, "SMS sent");
    Ok(Json(SendSmsResponse {
        status: "success",
        message: "SMS sent successfully to all numbers.".to_string(),
    }))
}
