//! # locker-store
//!
//! Document storage for the Locker service.
//!
//! Every entity lives in its own collection of a single logical database:
//! `users` (with embedded records), `messages`, `groups` and
//! `group_messages`.  Handlers talk to the store through the [`Store`]
//! family of traits so the same code runs against MongoDB in production
//! ([`MongoStore`]) and against an in-process map in development and tests
//! ([`MemoryStore`]).
//!
//! Read-modify-write operations (appending a record, adding a group member,
//! clearing an OTP) are expressed as single atomic store updates, never as
//! a read followed by a write.

pub mod database;
pub mod groups;
pub mod memory;
pub mod messages;
pub mod models;
pub mod store;
pub mod users;

mod error;

#[cfg(test)]
mod fixtures;

pub use bson::oid::ObjectId;
pub use database::MongoStore;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use models::*;
pub use store::{GroupStore, MessageStore, Store, UserStore};
