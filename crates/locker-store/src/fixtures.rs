//! Documents and stores shared by the backend tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::database::MongoStore;
use crate::models::{Group, Message, Record, User};

pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn user(email: &str) -> User {
    User {
        id: None,
        name: "Test".into(),
        email: email.into(),
        company_name: None,
        phone: None,
        provider: None,
        otp: Some(654321),
        signup_date: at(0),
        records: None,
    }
}

pub fn record(title: &str) -> Record {
    Record {
        title: title.into(),
        category: "lab".into(),
        date: "2024-01-01".into(),
        time: "10:00".into(),
        image: "aGVsbG8=".into(),
        created_at: at(0),
    }
}

pub fn message(sender: &str, receiver: &str, text: &str, minutes: i64) -> Message {
    Message {
        id: None,
        sender: sender.into(),
        receiver: receiver.into(),
        message: text.into(),
        timestamp: at(minutes),
        is_read: false,
    }
}

pub fn group(name: &str, members: &[&str]) -> Group {
    Group {
        id: None,
        group_name: name.into(),
        members: members.iter().map(|m| m.to_string()).collect(),
        created_at: at(0),
    }
}

/// A [`MongoStore`] on a fresh database at `MONGO_URI`, or `None` when the
/// variable is unset.  Callers drop the database when done.
pub async fn scratch_mongo() -> Option<MongoStore> {
    let uri = std::env::var("MONGO_URI").ok()?;
    let name = format!("locker_test_{}", bson::oid::ObjectId::new().to_hex());
    Some(MongoStore::connect(&uri, &name).await.unwrap())
}
