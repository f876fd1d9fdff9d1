//! Records attached to a user document.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use locker_store::{Record, Store};

use crate::api::{AppState, SuccessResponse};
use crate::error::ApiError;
use crate::extract::{present, JsonBody, QueryParams};
use crate::notify::Notifier;

#[derive(Deserialize)]
pub struct PostRecordRequest {
    email: Option<String>,
    title: Option<String>,
    category: Option<String>,
    date: Option<String>,
    time: Option<String>,
    image: Option<String>,
}

#[derive(Deserialize)]
pub struct RecordsQuery {
    email: Option<String>,
}

#[derive(Serialize)]
pub struct RecordView {
    title: String,
    category: String,
    date: String,
    time: String,
    image: String,
    created_at: String,
}

impl From<Record> for RecordView {
    fn from(record: Record) -> Self {
        Self {
            title: record.title,
            category: record.category,
            date: record.date,
            time: record.time,
            image: record.image,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct RecordsResponse {
    records: Vec<RecordView>,
}

pub async fn post_record<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    JsonBody(req): JsonBody<PostRecordRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let (Some(email), Some(title), Some(category), Some(date), Some(time), Some(image)) = (
        present(req.email),
        present(req.title),
        present(req.category),
        present(req.date),
        present(req.time),
        present(req.image),
    ) else {
        return Err(ApiError::Validation("All fields are required.".into()));
    };

    let record = Record {
        title,
        category,
        date,
        time,
        image,
        created_at: Utc::now(),
    };

    if !state.store.push_record(&email, &record).await? {
        return Err(ApiError::NotFound("User not found.".into()));
    }

    info!(email = %email, title = %record.title, "Record stored");
    Ok((
        StatusCode::CREATED,
        SuccessResponse::ok("Record stored successfully."),
    ))
}

pub async fn get_records<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    QueryParams(query): QueryParams<RecordsQuery>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let not_found = || ApiError::NotFound("No records found for this user.".into());

    let email = present(query.email).ok_or_else(not_found)?;
    let records = state.store.records(&email).await?.ok_or_else(not_found)?;

    Ok(Json(RecordsResponse {
        records: records.into_iter().map(RecordView::from).collect(),
    }))
}
