use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::Reactions;

/// One published item: a notice addressed to an audience, or a private
/// message addressed to a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Publication time. Feeds are ordered by this, never by the storage
    /// timestamps.
    pub date: DateTime<Utc>,
    pub author_id: String,
    pub target: String,
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: NoticeKind,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub reactions: Reactions,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        target: impl Into<String>,
        kind: NoticeKind,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            content: String::new(),
            date,
            author_id: author_id.into(),
            target: target.into(),
            kind,
            message_type: MessageType::default(),
            reactions: Reactions::new(),
            created_at: date,
            updated_at: date,
        }
    }

    pub fn with_text(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.title = title.into();
        self.content = content.into();
        self
    }

    pub fn is_reactable(&self) -> bool {
        self.kind == NoticeKind::Notice
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    #[default]
    Notice,
    PrivateMessage,
}

impl NoticeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::Notice => "notice",
            NoticeKind::PrivateMessage => "private_message",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "notice" => Some(NoticeKind::Notice),
            "private_message" => Some(NoticeKind::PrivateMessage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    Audio,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Audio => "audio",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageType::Text),
            "image" => Some(MessageType::Image),
            "audio" => Some(MessageType::Audio),
            _ => None,
        }
    }
}

/// Payload of a publish action. Every field is optional on the wire so a
/// missing field can be reported by name instead of as a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoticeRequest {
    #[validate(required, length(min = 1))]
    pub title: Option<String>,
    #[validate(required, length(min = 1))]
    pub content: Option<String>,
    #[validate(required, length(min = 1))]
    pub target: Option<String>,
    #[validate(required, length(min = 1))]
    pub author_id: Option<String>,
    /// Inferred from the target when absent.
    #[serde(rename = "type", alias = "kind", default)]
    pub kind: Option<NoticeKind>,
    #[serde(default)]
    pub message_type: Option<MessageType>,
}

/// Content edit. Author and target cannot change after publication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoticeRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub message_type: Option<MessageType>,
}
