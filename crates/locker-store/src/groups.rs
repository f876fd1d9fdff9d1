//! [`GroupStore`] for [`MongoStore`].

use bson::doc;
use bson::oid::ObjectId;
use futures::TryStreamExt;

use crate::database::{inserted_object_id, MongoStore, GROUPS};
use crate::error::Result;
use crate::models::{Group, GroupMessage, GroupSummary};
use crate::store::GroupStore;

impl GroupStore for MongoStore {
    async fn insert_group(&self, group: &Group) -> Result<ObjectId> {
        let result = self.groups_collection().insert_one(group).await?;
        inserted_object_id(result.inserted_id)
    }

    async fn find_group(&self, id: ObjectId) -> Result<Option<Group>> {
        Ok(self.groups_collection().find_one(doc! { "_id": id }).await?)
    }

    async fn add_member(&self, id: ObjectId, member: &str) -> Result<bool> {
        let result = self
            .groups_collection()
            .update_one(doc! { "_id": id }, doc! { "$addToSet": { "members": member } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn insert_group_message(&self, message: &GroupMessage) -> Result<ObjectId> {
        let result = self.group_messages_collection().insert_one(message).await?;
        inserted_object_id(result.inserted_id)
    }

    async fn group_messages(&self, id: ObjectId) -> Result<Vec<GroupMessage>> {
        let cursor = self
            .group_messages_collection()
            .find(doc! { "group_id": id })
            .sort(doc! { "timestamp": 1, "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn groups_for_member(&self, email: &str) -> Result<Vec<GroupSummary>> {
        let cursor = self
            .database()
            .collection::<GroupSummary>(GROUPS)
            .find(doc! { "members": email })
            .projection(doc! { "group_name": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{at, group, scratch_mongo};

    #[tokio::test]
    #[ignore = "needs a MongoDB at MONGO_URI"]
    async fn add_member_keeps_set_semantics() {
        let Some(store) = scratch_mongo().await else {
            return;
        };
        let id = store.insert_group(&group("team", &["a"])).await.unwrap();

        assert!(store.add_member(id, "b").await.unwrap());
        assert!(store.add_member(id, "b").await.unwrap());
        assert!(!store.add_member(ObjectId::new(), "b").await.unwrap());

        let found = store.find_group(id).await.unwrap().unwrap();
        assert_eq!(found.members, ["a", "b"]);
        assert!(store.find_group(ObjectId::new()).await.unwrap().is_none());

        let summaries = store.groups_for_member("b").await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, id);
        assert_eq!(summaries[0].group_name, "team");

        store.database().drop().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "needs a MongoDB at MONGO_URI"]
    async fn group_messages_are_oldest_first() {
        let Some(store) = scratch_mongo().await else {
            return;
        };
        let id = store.insert_group(&group("team", &["a", "b"])).await.unwrap();
        for (sender, text, minutes) in [("b", "later", 5), ("a", "earlier", 1)] {
            store
                .insert_group_message(&GroupMessage {
                    id: None,
                    group_id: id,
                    sender: sender.into(),
                    message: text.into(),
                    timestamp: at(minutes),
                })
                .await
                .unwrap();
        }

        let texts: Vec<String> = store
            .group_messages(id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.message)
            .collect();
        assert_eq!(texts, ["earlier", "later"]);
        assert!(store.group_messages(ObjectId::new()).await.unwrap().is_empty());

        store.database().drop().await.unwrap();
    }
}
