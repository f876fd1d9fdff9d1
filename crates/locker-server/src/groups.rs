//! Group creation, membership and group messages.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use locker_store::{Group, GroupMessage, GroupSummary, ObjectId, Store};

use crate::api::{AppState, SuccessResponse};
use crate::error::ApiError;
use crate::extract::{present, JsonBody, QueryParams};
use crate::notify::Notifier;

fn parse_group_id(value: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value)
        .map_err(|_| ApiError::Validation(format!("Invalid group_id '{value}'.")))
}

/// Drop empty entries and repeats, keeping first-seen order.
fn unique_members(members: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(members.len());
    for member in members {
        if !member.is_empty() && !unique.contains(&member) {
            unique.push(member);
        }
    }
    unique
}

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    group_name: Option<String>,
    members: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct CreateGroupResponse {
    success: bool,
    group_id: String,
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    group_id: Option<String>,
    new_member: Option<String>,
}

#[derive(Deserialize)]
pub struct SendGroupMessageRequest {
    sender: Option<String>,
    group_id: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
pub struct GroupMessagesQuery {
    group_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ListGroupsQuery {
    email: Option<String>,
}

#[derive(Serialize)]
pub struct GroupMessageView {
    id: Option<String>,
    group_id: String,
    sender: String,
    message: String,
    timestamp: String,
}

impl From<GroupMessage> for GroupMessageView {
    fn from(message: GroupMessage) -> Self {
        Self {
            id: message.id.map(|id| id.to_hex()),
            group_id: message.group_id.to_hex(),
            sender: message.sender,
            message: message.message,
            timestamp: message.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct GroupMessagesResponse {
    messages: Vec<GroupMessageView>,
}

#[derive(Serialize)]
pub struct GroupView {
    group_id: String,
    group_name: String,
}

impl From<GroupSummary> for GroupView {
    fn from(group: GroupSummary) -> Self {
        Self {
            group_id: group.id.to_hex(),
            group_name: group.group_name,
        }
    }
}

#[derive(Serialize)]
pub struct ListGroupsResponse {
    groups: Vec<GroupView>,
}

pub async fn create_group<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    JsonBody(req): JsonBody<CreateGroupRequest>,
) -> Result<Json<CreateGroupResponse>, ApiError> {
    let members = unique_members(req.members.unwrap_or_default());
    let Some(group_name) = present(req.group_name).filter(|_| !members.is_empty()) else {
        return Err(ApiError::Validation(
            "Group name and members are required.".into(),
        ));
    };

    let group = Group {
        id: None,
        group_name,
        members,
        created_at: Utc::now(),
    };
    let id = state.store.insert_group(&group).await?;

    info!(group_id = %id, name = %group.group_name, members = group.members.len(), "Group created");
    Ok(Json(CreateGroupResponse {
        success: true,
        group_id: id.to_hex(),
    }))
}

pub async fn add_member<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    JsonBody(req): JsonBody<AddMemberRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (Some(group_id), Some(new_member)) = (present(req.group_id), present(req.new_member))
    else {
        return Err(ApiError::Validation(
            "Group ID and new member are required.".into(),
        ));
    };
    let id = parse_group_id(&group_id)?;

    if !state.store.add_member(id, &new_member).await? {
        return Err(ApiError::NotFound("Group not found.".into()));
    }

    info!(group_id = %id, member = %new_member, "Member added");
    Ok(SuccessResponse::ok("Member added successfully."))
}

pub async fn send_group_message<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    JsonBody(req): JsonBody<SendGroupMessageRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let (Some(sender), Some(group_id), Some(message)) = (
        present(req.sender),
        present(req.group_id),
        present(req.message),
    ) else {
        return Err(ApiError::Validation("All fields are required.".into()));
    };
    let group_id = parse_group_id(&group_id)?;

    // Checked at send time only; nothing ties the message to the group later.
    if state.store.find_group(group_id).await?.is_none() {
        return Err(ApiError::NotFound("Group not found.".into()));
    }

    let message = GroupMessage {
        id: None,
        group_id,
        sender,
        message,
        timestamp: Utc::now(),
    };
    state.store.insert_group_message(&message).await?;

    Ok(SuccessResponse::ok("Message sent successfully."))
}

pub async fn get_group_messages<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    QueryParams(query): QueryParams<GroupMessagesQuery>,
) -> Result<Json<GroupMessagesResponse>, ApiError> {
    let Some(group_id) = present(query.group_id) else {
        return Err(ApiError::Validation("Group ID is required.".into()));
    };
    let id = parse_group_id(&group_id)?;

    let messages = state.store.group_messages(id).await?;
    Ok(Json(GroupMessagesResponse {
        messages: messages.into_iter().map(GroupMessageView::from).collect(),
    }))
}

pub async fn list_groups<S: Store, N: Notifier>(
    State(state): State<AppState<S, N>>,
    QueryParams(query): QueryParams<ListGroupsQuery>,
) -> Result<Json<ListGroupsResponse>, ApiError> {
    let Some(email) = present(query.email) else {
        return Err(ApiError::Validation("Email is required.".into()));
    };

    let groups = state.store.groups_for_member(&email).await?;
    Ok(Json(ListGroupsResponse {
        groups: groups.into_iter().map(GroupView::from).collect(),
    }))
}
