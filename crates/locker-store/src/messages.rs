//! [`MessageStore`] for [`MongoStore`].

use std::collections::BTreeSet;

use bson::oid::ObjectId;
use bson::{doc, Bson};
use futures::TryStreamExt;

use crate::database::{inserted_object_id, MongoStore};
use crate::error::Result;
use crate::models::Message;
use crate::store::MessageStore;

impl MessageStore for MongoStore {
    async fn insert_message(&self, message: &Message) -> Result<ObjectId> {
        let result = self.messages_collection().insert_one(message).await?;
        inserted_object_id(result.inserted_id)
    }

    async fn conversation(&self, a: &str, b: &str) -> Result<Vec<Message>> {
        let filter = doc! {
            "$or": [
                { "sender": a, "receiver": b },
                { "sender": b, "receiver": a },
            ]
        };
        let cursor = self
            .messages_collection()
            .find(filter)
            .sort(doc! { "timestamp": 1, "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn latest_unread(&self, sender: &str, receiver: &str) -> Result<Option<Message>> {
        Ok(self
            .messages_collection()
            .find_one(doc! { "sender": sender, "receiver": receiver, "isRead": false })
            .sort(doc! { "timestamp": -1, "_id": -1 })
            .await?)
    }

    async fn mark_read(&self, id: ObjectId) -> Result<bool> {
        let result = self
            .messages_collection()
            .update_one(doc! { "_id": id }, doc! { "$set": { "isRead": true } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn contacts(&self, email: &str) -> Result<Vec<String>> {
        let receivers = self
            .messages_collection()
            .distinct("receiver", doc! { "sender": email })
            .await?;
        let senders = self
            .messages_collection()
            .distinct("sender", doc! { "receiver": email })
            .await?;

        let contacts: BTreeSet<String> = receivers
            .into_iter()
            .chain(senders)
            .filter_map(|value| match value {
                Bson::String(s) => Some(s),
                _ => None,
            })
            .collect();
        Ok(contacts.into_iter().collect())
    }
}
