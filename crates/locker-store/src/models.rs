//! Domain documents persisted in the `users`, `messages`, `groups` and
//! `group_messages` collections.
//!
//! Timestamps are `chrono` values on the Rust side and native BSON dates in
//! the database.  These structs describe the stored shape only; the HTTP
//! layer renders its own response bodies from them.

use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account.  `email` is the unique key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Store-assigned identifier.  `None` until inserted.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Mobile carrier, used to reach the phone through its SMS gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Pending one-time code.  Removed once the email is verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otp: Option<u32>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub signup_date: DateTime<Utc>,
    /// Absent until the first record is attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Record>>,
}

/// An opaque record (image plus metadata) embedded in a user document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    pub category: String,
    /// Caller-supplied date, stored verbatim.
    pub date: String,
    /// Caller-supplied time, stored verbatim.
    pub time: String,
    /// Base64-encoded image payload.
    pub image: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Direct messages
// ---------------------------------------------------------------------------

/// A direct message between two identifiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub sender: String,
    pub receiver: String,
    pub message: String,
    /// Sender-supplied time of the message.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "isRead", default)]
    pub is_read: bool,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// A named group of member identifiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub group_name: String,
    /// Set semantics: an identifier appears at most once.
    pub members: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Projection of a [`Group`] used when listing a member's groups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub group_name: String,
}

/// A message posted to a group.  `timestamp` is assigned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMessage {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub group_id: ObjectId,
    pub sender: String,
    pub message: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}
