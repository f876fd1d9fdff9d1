//! In-process store used for local development and tests.
//!
//! Mirrors the MongoDB backend's observable behaviour: unique emails,
//! stable ascending ordering by timestamp, set semantics for group
//! members.  Each mutation happens under a single write-lock acquisition,
//! which gives it the same atomicity as the store's update operators.

use std::collections::BTreeSet;
use std::sync::Arc;

use bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::models::{Group, GroupMessage, GroupSummary, Message, Record, User};
use crate::store::{GroupStore, MessageStore, UserStore};

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    messages: Vec<Message>,
    groups: Vec<Group>,
    group_messages: Vec<GroupMessage>,
}

/// Cheaply cloneable handle to a shared in-memory document set.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of user documents.  Test helper.
    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

impl UserStore for MemoryStore {
    async fn find_user(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<ObjectId> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateKey(format!(
                "email already exists: {}",
                user.email
            )));
        }

        let id = ObjectId::new();
        let mut stored = user.clone();
        stored.id = Some(id);
        inner.users.push(stored);
        Ok(id)
    }

    async fn clear_otp(&self, email: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.otp = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn push_record(&self, email: &str, record: &Record) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.records
                    .get_or_insert_with(Vec::new)
                    .push(record.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn records(&self, email: &str) -> Result<Option<Vec<Record>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.email == email)
            .and_then(|u| u.records.clone()))
    }
}

impl MessageStore for MemoryStore {
    async fn insert_message(&self, message: &Message) -> Result<ObjectId> {
        let mut inner = self.inner.write().await;
        let id = ObjectId::new();
        let mut stored = message.clone();
        stored.id = Some(id);
        inner.messages.push(stored);
        Ok(id)
    }

    async fn conversation(&self, a: &str, b: &str) -> Result<Vec<Message>> {
        let inner = self.inner.read().await;
        let mut found: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| {
                (m.sender == a && m.receiver == b) || (m.sender == b && m.receiver == a)
            })
            .cloned()
            .collect();
        // Stable: ties keep insertion order, like the (timestamp, _id) sort.
        found.sort_by_key(|m| m.timestamp);
        Ok(found)
    }

    async fn latest_unread(&self, sender: &str, receiver: &str) -> Result<Option<Message>> {
        let inner = self.inner.read().await;
        Ok(inner
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.sender == sender && m.receiver == receiver && !m.is_read)
            .max_by_key(|(pos, m)| (m.timestamp, *pos))
            .map(|(_, m)| m.clone()))
    }

    async fn mark_read(&self, id: ObjectId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.messages.iter_mut().find(|m| m.id == Some(id)) {
            Some(message) => {
                message.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn contacts(&self, email: &str) -> Result<Vec<String>> {
        let inner = self.inner.read().await;
        let contacts: BTreeSet<String> = inner
            .messages
            .iter()
            .filter_map(|m| {
                if m.sender == email {
                    Some(m.receiver.clone())
                } else if m.receiver == email {
                    Some(m.sender.clone())
                } else {
                    None
                }
            })
            .collect();
        Ok(contacts.into_iter().collect())
    }
}

impl GroupStore for MemoryStore {
    async fn insert_group(&self, group: &Group) -> Result<ObjectId> {
        let mut inner = self.inner.write().await;
        let id = ObjectId::new();
        let mut stored = group.clone();
        stored.id = Some(id);
        inner.groups.push(stored);
        Ok(id)
    }

    async fn find_group(&self, id: ObjectId) -> Result<Option<Group>> {
        let inner = self.inner.read().await;
        Ok(inner.groups.iter().find(|g| g.id == Some(id)).cloned())
    }

    async fn add_member(&self, id: ObjectId, member: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.groups.iter_mut().find(|g| g.id == Some(id)) {
            Some(group) => {
                if !group.members.iter().any(|m| m == member) {
                    group.members.push(member.to_string());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_group_message(&self, message: &GroupMessage) -> Result<ObjectId> {
        let mut inner = self.inner.write().await;
        let id = ObjectId::new();
        let mut stored = message.clone();
        stored.id = Some(id);
        inner.group_messages.push(stored);
        Ok(id)
    }

    async fn group_messages(&self, id: ObjectId) -> Result<Vec<GroupMessage>> {
        let inner = self.inner.read().await;
        let mut found: Vec<GroupMessage> = inner
            .group_messages
            .iter()
            .filter(|m| m.group_id == id)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.timestamp);
        Ok(found)
    }

    async fn groups_for_member(&self, email: &str) -> Result<Vec<GroupSummary>> {
        let inner = self.inner.read().await;
        Ok(inner
            .groups
            .iter()
            .filter(|g| g.members.iter().any(|m| m == email))
            .filter_map(|g| {
                g.id.map(|id| GroupSummary {
                    id,
                    group_name: g.group_name.clone(),
                })
            })
            .collect())
    }
}
