use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::Payload;
use crate::database::models::{Message, MessageChanges};
use crate::error::ApiError;

const FIXED_AT_CREATION: &str = "This field cannot be changed after creation.";
const READ_ONLY: &str = "This field is read-only.";

#[derive(Debug, Clone, Serialize)]
pub struct MessageRepresentation {
    pub id: i64,
    pub user: i64,
    pub chat: i64,
    pub content: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Message> for MessageRepresentation {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            user: message.user_id,
            chat: message.chat_id,
            content: message.content,
            archived: message.archived,
            created_at: message.created_at,
            updated_at: message.updated_at,
        }
    }
}

/// Body of `POST /messages/create/`.
///
/// `user` stays in the schema and is checked as a reference, but the handler
/// always stores the authenticated actor as the author.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageCreate {
    pub user: Option<i64>,
    pub chat: i64,
    pub content: String,
}

impl MessageCreate {
    pub fn parse(body: Map<String, Value>) -> Result<Self, ApiError> {
        let mut p = Payload::new(body);
        let user = p.pk("user", false);
        let chat = p.pk("chat", true);
        let content = p.string("content", true);
        p.finish()?;

        match (chat, content) {
            (Some(chat), Some(content)) => Ok(Self { user, chat, content }),
            _ => Err(ApiError::bad_request("chat and content are required")),
        }
    }
}

/// Body of `PATCH /messages/{id}/`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageUpdate {
    pub content: Option<String>,
    pub archived: Option<bool>,
}

impl MessageUpdate {
    pub fn parse(body: Map<String, Value>) -> Result<Self, ApiError> {
        let mut p = Payload::new(body);
        let update = Self {
            content: p.string("content", false),
            archived: p.boolean("archived"),
        };
        p.reject("user", FIXED_AT_CREATION);
        p.reject("chat", FIXED_AT_CREATION);
        for field in ["id", "created_at", "updated_at"] {
            p.reject(field, READ_ONLY);
        }
        p.finish()?;
        Ok(update)
    }

    pub fn into_changes(self) -> MessageChanges {
        MessageChanges {
            content: self.content,
            archived: self.archived,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn create_keeps_optional_user() {
        let create = MessageCreate::parse(object(json!({ "user": 2, "chat": 1, "content": "Hello!" }))).unwrap();
        assert_eq!(create.user, Some(2));
        assert_eq!(create.chat, 1);

        let create = MessageCreate::parse(object(json!({ "chat": "1", "content": "Hi" }))).unwrap();
        assert_eq!(create.user, None);
    }

    #[test]
    fn create_requires_chat_and_content() {
        match MessageCreate::parse(object(json!({}))).unwrap_err() {
            ApiError::ValidationError { field_errors, .. } => {
                assert!(field_errors.contains_key("chat"));
                assert!(field_errors.contains_key("content"));
                assert!(!field_errors.contains_key("user"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn update_cannot_move_message() {
        assert!(MessageUpdate::parse(object(json!({ "chat": 2 }))).is_err());
        assert!(MessageUpdate::parse(object(json!({ "user": 2, "content": "x" }))).is_err());
    }

    #[test]
    fn update_content_only() {
        let changes = MessageUpdate::parse(object(json!({ "content": "Updated content" })))
            .unwrap()
            .into_changes();
        assert_eq!(changes.content.as_deref(), Some("Updated content"));
        assert_eq!(changes.archived, None);
    }
}
