//! MongoDB connection management.
//!
//! [`MongoStore`] owns a driver [`Client`] (internally pooled and cheap to
//! clone) plus typed handles to each collection.  Indexes are created on
//! connect so that the unique-email rule holds even under concurrent
//! signups.

use bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::models::{Group, GroupMessage, Message, User};

pub const USERS: &str = "users";
pub const MESSAGES: &str = "messages";
pub const GROUPS: &str = "groups";
pub const GROUP_MESSAGES: &str = "group_messages";

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed store.
#[derive(Clone, Debug)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect to `uri`, select `db_name` and ensure indexes exist.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let store = Self {
            db: client.database(db_name),
        };

        store.ensure_indexes().await?;

        info!(database = db_name, "connected to document store");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users_collection().create_index(unique_email).await?;

        let pair = IndexModel::builder()
            .keys(doc! { "sender": 1, "receiver": 1, "timestamp": 1 })
            .build();
        self.messages_collection().create_index(pair).await?;

        let members = IndexModel::builder().keys(doc! { "members": 1 }).build();
        self.groups_collection().create_index(members).await?;

        let by_group = IndexModel::builder()
            .keys(doc! { "group_id": 1, "timestamp": 1 })
            .build();
        self.group_messages_collection().create_index(by_group).await?;

        Ok(())
    }

    /// The underlying logical database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn users_collection(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    pub(crate) fn messages_collection(&self) -> Collection<Message> {
        self.db.collection(MESSAGES)
    }

    pub(crate) fn groups_collection(&self) -> Collection<Group> {
        self.db.collection(GROUPS)
    }

    pub(crate) fn group_messages_collection(&self) -> Collection<GroupMessage> {
        self.db.collection(GROUP_MESSAGES)
    }
}

/// Map a driver error to [`StoreError::DuplicateKey`] when it is a unique
/// index violation.
pub(crate) fn classify(err: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
        if write_error.code == DUPLICATE_KEY_CODE {
            return StoreError::DuplicateKey(write_error.message.clone());
        }
    }
    StoreError::Mongo(err)
}

/// Extract the `_id` returned by an insert.
pub(crate) fn inserted_object_id(id: bson::Bson) -> Result<bson::oid::ObjectId> {
    id.as_object_id()
        .ok_or_else(|| StoreError::UnexpectedId(id.to_string()))
}
