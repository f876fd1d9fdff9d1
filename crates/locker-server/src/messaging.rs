//! Direct messages between two identifiers.
//!
//! A conversation is not stored as an entity; it is every message whose
//! sender/receiver pair matches in either order.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use locker_store::{Message, Store};

use crate::api::{AppState, SuccessResponse};
use crate::error::ApiError;
use crate::extract::{present, JsonBody, QueryParams};
use crate::notify::Notifier;

/// Wire format of a message timestamp, e.g. `2024-01-01 10:00 AM`.
pub const MESSAGE_TIME_FORMAT: &str = "%Y-%m-%d %I:%M %p";

/// Parse a client timestamp.  The value carries no zone and is taken as UTC.
pub fn parse_message_time(value: &str) -> Result<DateTime<Utc>, ApiError> {
    NaiveDateTime::parse_from_str(value.trim(), MESSAGE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            ApiError::Format(format!(
                "Invalid timestamp '{value}', expected YYYY-MM-DD HH:MM AM/PM"
            ))
        })
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    sender: Option<String>,
    receiver: Option<String>,
    message: Option<String>,
    timestamp: Option<String>,
}

#[derive(Deserialize)]
pub struct ConversationQuery {
    sender: Option<String>,
    receiver: Option<String>,
}

#[derive(Deserialize)]
pub struct MarkAsReadRequest {
    #[serde(rename = "currentUser")]
    current_user: Option<String>,
    sender: Option<String>,
    receiver: Option<String>,
}

#[derive(Deserialize)]
pub struct ContactsQuery {
    email: Option<String>,
}

#[derive(Serialize)]
pub struct MessageView {
    id: Option<String>,
    sender: String,
    receiver: String,
    message: String,
    timestamp: String,
    #[serde(rename = "isRead")]
    is_read: bool,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        Self {
            id: message.id.map(|id| id.to_hex()),
            sender: message.sender,
            receiver: message.receiver,
            message: message.message,
            timestamp: message.timestamp.format(MESSAGE_TIME_FORMAT).to_string(),
            is_read: message.is_read,
        }
    }
}

#[derive(Serialize)]
pub struct ConversationResponse {
    conversation: Vec<MessageView>,
}

#[derive(Serialize)]
pub struct ContactsResponse {
    contacts: Vec<String>,
}

pub async fn send_message<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    JsonBody(req): JsonBody<SendMessageRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (Some(sender), Some(receiver), Some(message), Some(timestamp)) = (
        present(req.sender),
        present(req.receiver),
        present(req.message),
        present(req.timestamp),
    ) else {
        return Err(ApiError::Validation("All fields are required.".into()));
    };

    let message = Message {
        id: None,
        sender,
        receiver,
        message,
        timestamp: parse_message_time(&timestamp)?,
        is_read: false,
    };
    let id = state.store.insert_message(&message).await?;

    debug!(id = %id, sender = %message.sender, receiver = %message.receiver, "Message stored");
    Ok(SuccessResponse::ok("Message sent successfully."))
}

pub async fn get_conversation<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    QueryParams(query): QueryParams<ConversationQuery>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let (Some(sender), Some(receiver)) = (present(query.sender), present(query.receiver)) else {
        return Err(ApiError::Validation("Sender and receiver are required.".into()));
    };

    let messages = state.store.conversation(&sender, &receiver).await?;
    Ok(Json(ConversationResponse {
        conversation: messages.into_iter().map(MessageView::from).collect(),
    }))
}

/// Mark the newest unread `sender → receiver` message as read.
///
/// Only the receiver may do this.  For anyone else nothing is updated and
/// the response is an empty 204; the operation has no defined reply in
/// that case.  Earlier versions of this service answered 500 here, so the
/// 204 is a placeholder, not a contract clients should rely on.
pub async fn mark_as_read<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    JsonBody(req): JsonBody<MarkAsReadRequest>,
) -> Result<Response, ApiError> {
    let (Some(current_user), Some(sender), Some(receiver)) = (
        present(req.current_user),
        present(req.sender),
        present(req.receiver),
    ) else {
        return Err(ApiError::Validation(
            "currentUser, sender and receiver are required.".into(),
        ));
    };

    if current_user != receiver {
        warn!(
            current_user = %current_user,
            receiver = %receiver,
            "mark_as_read by someone other than the receiver ignored"
        );
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    if let Some(id) = state
        .store
        .latest_unread(&sender, &receiver)
        .await?
        .and_then(|message| message.id)
    {
        state.store.mark_read(id).await?;
        info!(id = %id, "Message marked as read");
    }

    Ok(SuccessResponse::ok("Message marked as read.").into_response())
}

pub async fn get_user_conversations<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    QueryParams(query): QueryParams<ContactsQuery>,
) -> Result<Json<ContactsResponse>, ApiError> {
    let Some(email) = present(query.email) else {
        return Err(ApiError::Validation("Email is required.".into()));
    };

    let contacts = state.store.contacts(&email).await?;
    Ok(Json(ContactsResponse { contacts }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use super::*;
    use crate::testing::TestApp;

    async fn send(app: &TestApp, sender: &str, receiver: &str, text: &str, at: &str) {
        let (status, body) = app
            .post(
                "/send_message",
                json!({ "sender": sender, "receiver": receiver, "message": text, "timestamp": at }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    fn texts(body: &Value) -> Vec<String> {
        body["conversation"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["message"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_parse_message_time() {
        let ts = parse_message_time("2024-01-01 10:00 PM").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-01T22:00:00+00:00");

        assert!(parse_message_time("2024-01-01 12:30 am").is_ok());
        assert!(parse_message_time("2024-01-01 22:00").is_err());
        assert!(parse_message_time("01/01/2024 10:00 AM").is_err());
    }

    #[tokio::test]
    async fn test_send_then_fetch_single_message() {
        let app = TestApp::new();
        send(&app, "a@x.com", "b@x.com", "hi", "2024-01-01 10:00 AM").await;

        let (status, body) = app
            .get("/get_conversation?sender=a@x.com&receiver=b@x.com")
            .await;
        assert_eq!(status, StatusCode::OK);
        let conversation = body["conversation"].as_array().unwrap();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation[0]["message"], "hi");
        assert_eq!(conversation[0]["isRead"], false);
        assert_eq!(conversation[0]["timestamp"], "2024-01-01 10:00 AM");
    }

    #[tokio::test]
    async fn test_send_message_validation() {
        let app = TestApp::new();
        let (status, _) = app
            .post(
                "/send_message",
                json!({ "sender": "a@x.com", "receiver": "b@x.com", "message": "hi" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .post(
                "/send_message",
                json!({
                    "sender": "a@x.com",
                    "receiver": "b@x.com",
                    "message": "hi",
                    "timestamp": "yesterday",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("timestamp"));
    }

    #[tokio::test]
    async fn test_conversation_is_symmetric_and_chronological() {
        let app = TestApp::new();
        send(&app, "a@x.com", "b@x.com", "third", "2024-01-01 01:00 PM").await;
        send(&app, "b@x.com", "a@x.com", "first", "2024-01-01 09:00 AM").await;
        send(&app, "a@x.com", "b@x.com", "second", "2024-01-01 11:30 AM").await;
        send(&app, "a@x.com", "c@x.com", "elsewhere", "2024-01-01 10:00 AM").await;

        let (_, ab) = app
            .get("/get_conversation?sender=a@x.com&receiver=b@x.com")
            .await;
        let (_, ba) = app
            .get("/get_conversation?sender=b@x.com&receiver=a@x.com")
            .await;

        assert_eq!(texts(&ab), ["first", "second", "third"]);
        assert_eq!(ab, ba);

        let (status, _) = app.get("/get_conversation?sender=a@x.com").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mark_as_read_by_receiver() {
        let app = TestApp::new();
        send(&app, "a@x.com", "b@x.com", "old", "2024-01-01 09:00 AM").await;
        send(&app, "a@x.com", "b@x.com", "new", "2024-01-01 10:00 AM").await;

        let (status, body) = app
            .post(
                "/mark_as_read",
                json!({ "currentUser": "b@x.com", "sender": "a@x.com", "receiver": "b@x.com" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, body) = app
            .get("/get_conversation?sender=a@x.com&receiver=b@x.com")
            .await;
        let flags: Vec<bool> = body["conversation"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["isRead"].as_bool().unwrap())
            .collect();
        assert_eq!(flags, [false, true]);
    }

    #[tokio::test]
    async fn test_mark_as_read_by_other_user_changes_nothing() {
        let app = TestApp::new();
        send(&app, "a@x.com", "b@x.com", "hi", "2024-01-01 09:00 AM").await;

        let (status, body) = app
            .post(
                "/mark_as_read",
                json!({ "currentUser": "a@x.com", "sender": "a@x.com", "receiver": "b@x.com" }),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (_, body) = app
            .get("/get_conversation?sender=a@x.com&receiver=b@x.com")
            .await;
        assert_eq!(body["conversation"][0]["isRead"], false);

        let (status, _) = app
            .post("/mark_as_read", json!({ "sender": "a@x.com", "receiver": "b@x.com" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_user_conversations_lists_contacts_once() {
        let app = TestApp::new();
        send(&app, "a@x.com", "b@x.com", "1", "2024-01-01 09:00 AM").await;
        send(&app, "b@x.com", "a@x.com", "2", "2024-01-01 09:01 AM").await;
        send(&app, "c@x.com", "a@x.com", "3", "2024-01-01 09:02 AM").await;

        let (status, body) = app.get("/get_user_conversations?email=a@x.com").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contacts"], json!(["b@x.com", "c@x.com"]));

        let (status, _) = app.get("/get_user_conversations").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
