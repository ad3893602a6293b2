use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::Payload;
use crate::database::models::{ChatChanges, ChatDetail};
use crate::error::ApiError;

pub const USER_IMMUTABLE: &str = "You cannot modify the user field.";
const READ_ONLY: &str = "This field is read-only.";

#[derive(Debug, Clone, Serialize)]
pub struct ChatRepresentation {
    pub id: i64,
    pub user: i64,
    pub messages: Vec<i64>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChatDetail> for ChatRepresentation {
    fn from(detail: ChatDetail) -> Self {
        let ChatDetail { chat, messages } = detail;
        Self {
            id: chat.id,
            user: chat.user_id,
            messages,
            archived: chat.archived,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }
    }
}

/// Body of `POST /chats/create/`: the owner and nothing else
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCreate {
    pub user: i64,
}

impl ChatCreate {
    pub fn parse(body: Map<String, Value>) -> Result<Self, ApiError> {
        let mut p = Payload::new(body);
        let user = p.pk("user", true);
        p.finish()?;
        user.map(|user| Self { user })
            .ok_or_else(|| ApiError::field_error("user", "This field is required."))
    }
}

/// Body of `PATCH /chats/{id}/`. `user` is refused whatever its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatUpdate {
    pub archived: Option<bool>,
}

impl ChatUpdate {
    pub fn parse(body: Map<String, Value>) -> Result<Self, ApiError> {
        let mut p = Payload::new(body);
        let archived = p.boolean("archived");
        p.reject("user", USER_IMMUTABLE);
        for field in ["id", "messages", "created_at", "updated_at"] {
            p.reject(field, READ_ONLY);
        }
        p.finish()?;
        Ok(Self { archived })
    }

    pub fn into_changes(self) -> ChatChanges {
        ChatChanges { archived: self.archived }
    }
}
