//! Store traits implemented by every backend.
//!
//! Methods return `impl Future + Send` so the HTTP layer can hold a store
//! generically across `.await` points on a multi-threaded runtime.

use std::future::Future;

use bson::oid::ObjectId;

use crate::error::Result;
use crate::models::{Group, GroupMessage, GroupSummary, Message, Record, User};

/// Operations on the `users` collection.
pub trait UserStore {
    /// Look a user up by email.
    fn find_user(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Insert a new user.  Fails with [`StoreError::DuplicateKey`] when the
    /// email is already taken.
    ///
    /// [`StoreError::DuplicateKey`]: crate::StoreError::DuplicateKey
    fn insert_user(&self, user: &User) -> impl Future<Output = Result<ObjectId>> + Send;

    /// Remove the pending OTP from a user.  Returns `false` if no user matched.
    fn clear_otp(&self, email: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Append a record to a user's `records`, creating the sequence if it is
    /// absent.  Returns `false` if no user matched.
    fn push_record(&self, email: &str, record: &Record)
        -> impl Future<Output = Result<bool>> + Send;

    /// The user's records, or `None` when the user or the sequence is absent.
    fn records(&self, email: &str) -> impl Future<Output = Result<Option<Vec<Record>>>> + Send;
}

/// Operations on the `messages` collection.
pub trait MessageStore {
    fn insert_message(&self, message: &Message) -> impl Future<Output = Result<ObjectId>> + Send;

    /// Every message exchanged between `a` and `b` in either direction,
    /// oldest first.
    fn conversation(&self, a: &str, b: &str)
        -> impl Future<Output = Result<Vec<Message>>> + Send;

    /// The most recent unread message sent from `sender` to `receiver`.
    fn latest_unread(
        &self,
        sender: &str,
        receiver: &str,
    ) -> impl Future<Output = Result<Option<Message>>> + Send;

    /// Flag a message as read.  Returns `false` if no message matched.
    fn mark_read(&self, id: ObjectId) -> impl Future<Output = Result<bool>> + Send;

    /// Every identifier that has sent a message to, or received one from,
    /// `email`.  De-duplicated and sorted.
    fn contacts(&self, email: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Operations on the `groups` and `group_messages` collections.
pub trait GroupStore {
    fn insert_group(&self, group: &Group) -> impl Future<Output = Result<ObjectId>> + Send;

    /// The group with this id, members included.
    fn find_group(&self, id: ObjectId) -> impl Future<Output = Result<Option<Group>>> + Send;

    /// Add `member` to the group's member set.  Idempotent.  Returns `false`
    /// if the group does not exist.
    fn add_member(&self, id: ObjectId, member: &str)
        -> impl Future<Output = Result<bool>> + Send;

    fn insert_group_message(
        &self,
        message: &GroupMessage,
    ) -> impl Future<Output = Result<ObjectId>> + Send;

    /// Messages posted to a group, oldest first.
    fn group_messages(&self, id: ObjectId)
        -> impl Future<Output = Result<Vec<GroupMessage>>> + Send;

    /// Groups whose member set contains `email`.
    fn groups_for_member(&self, email: &str)
        -> impl Future<Output = Result<Vec<GroupSummary>>> + Send;
}

/// A complete backend: everything the HTTP layer needs.
pub trait Store: UserStore + MessageStore + GroupStore + Clone + Send + Sync + 'static {}

impl<T> Store for T where T: UserStore + MessageStore + GroupStore + Clone + Send + Sync + 'static {}
