//! [`UserStore`] for [`MongoStore`].

use bson::doc;
use serde::Deserialize;

use crate::database::{classify, inserted_object_id, MongoStore, USERS};
use crate::error::Result;
use crate::models::{Record, User};
use crate::store::UserStore;

/// Projection used by [`UserStore::records`] so the rest of the user
/// document is never transferred.
#[derive(Deserialize)]
struct RecordsOnly {
    #[serde(default)]
    records: Option<Vec<Record>>,
}

impl UserStore for MongoStore {
    async fn find_user(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users_collection().find_one(doc! { "email": email }).await?)
    }

    async fn insert_user(&self, user: &User) -> Result<bson::oid::ObjectId> {
        let result = self.users_collection().insert_one(user).await.map_err(classify)?;
        inserted_object_id(result.inserted_id)
    }

    async fn clear_otp(&self, email: &str) -> Result<bool> {
        let result = self
            .users_collection()
            .update_one(doc! { "email": email }, doc! { "$unset": { "otp": "" } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn push_record(&self, email: &str, record: &Record) -> Result<bool> {
        // $push creates the array when the field is missing.
        let record = bson::to_bson(record)?;
        let result = self
            .users_collection()
            .update_one(
                doc! { "email": email },
                doc! { "$push": { "records": record } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn records(&self, email: &str) -> Result<Option<Vec<Record>>> {
        let found = self
            .database()
            .collection::<RecordsOnly>(USERS)
            .find_one(doc! { "email": email })
            .projection(doc! { "_id": 0, "records": 1 })
            .await?;
        Ok(found.and_then(|doc| doc.records))
    }
}
