use serde::{Deserialize, Serialize};

/// Message type as reported by the chat engine, before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawMessageType {
    #[default]
    Normal,
    Attachment,
    VoiceClip,
    Contact,
    ContainsMeta,
    AlterParticipants,
    Truncate,
    PrivilegeChange,
    ChatTitle,
    CallEnded,
    CallStarted,
    PublicHandleCreate,
    PublicHandleDelete,
    SetRetentionTime,
    SetPrivateMode,
    ScheduledMeeting,
    InvalidFormat,
    InvalidSignature,
    Unrecognizable,
    Unknown,
}

/// Delivery status of a message as reported by the chat engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sending,
    SendingManual,
    #[default]
    ServerReceived,
    ServerRejected,
    Delivered,
    NotSeen,
    Seen,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sending => "sending",
            MessageStatus::SendingManual => "sending_manual",
            MessageStatus::ServerReceived => "server_received",
            MessageStatus::ServerRejected => "server_rejected",
            MessageStatus::Delivered => "delivered",
            MessageStatus::NotSeen => "not_seen",
            MessageStatus::Seen => "seen",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let status = match value {
            "sending" => MessageStatus::Sending,
            "sending_manual" => MessageStatus::SendingManual,
            "server_received" => MessageStatus::ServerReceived,
            "server_rejected" => MessageStatus::ServerRejected,
            "delivered" => MessageStatus::Delivered,
            "not_seen" => MessageStatus::NotSeen,
            "seen" => MessageStatus::Seen,
            _ => return None,
        };

        Some(status)
    }
}

/// A cloud node referenced by an attachment or voice clip message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    pub node_id: i64,
    pub name: String,
    #[serde(default)]
    pub size: i64,
}

/// Meta payload carried by a `ContainsMeta` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawContainsMeta {
    RichPreview {
        url: String,
        #[serde(default)]
        title: String,
        #[serde(default)]
        description: String,
        image: Option<String>,
        icon: Option<String>,
        #[serde(default)]
        domain: String,
    },
    Geolocation {
        longitude: f64,
        latitude: f64,
        image: Option<String>,
    },
    Giphy {
        mp4_src: Option<String>,
        webp_src: Option<String>,
        #[serde(default)]
        title: String,
        #[serde(default)]
        width: i32,
        #[serde(default)]
        height: i32,
    },
    Invalid,
}

/// A chat message exactly as the chat engine delivers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub msg_id: i64,
    #[serde(default)]
    pub temp_id: i64,
    pub timestamp: i64,
    pub user_handle: i64,
    #[serde(default, rename = "type")]
    pub kind: RawMessageType,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub has_confirmed_reactions: bool,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub meta: Option<RawContainsMeta>,
}

/// Management (non-user content) events shown inline in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagementKind {
    AlterParticipants,
    Truncate,
    PrivilegeChange,
    ChatTitle,
    CallEnded,
    CallStarted,
    PublicHandleCreate,
    PublicHandleDelete,
    RetentionTime,
    PrivateMode,
    ScheduledMeeting,
}

/// Reasons a message cannot be rendered as regular content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidKind {
    Format,
    Signature,
    Unrecognizable,
    Meta,
}

/// Display-ready classification of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MessageKind {
    Text,
    Attachment,
    VoiceClip,
    Contact,
    RichPreview,
    Geolocation,
    Giphy,
    Management(ManagementKind),
    Invalid(InvalidKind),
    Unknown,
}

impl MessageKind {
    /// Classifies a raw message. Never fails: anything unusable maps to `Invalid`.
    pub fn from_raw(raw: &RawMessage) -> Self {
        match raw.kind {
            RawMessageType::Normal => MessageKind::Text,
            RawMessageType::Attachment if raw.nodes.is_empty() => {
                MessageKind::Invalid(InvalidKind::Format)
            }
            RawMessageType::Attachment => MessageKind::Attachment,
            RawMessageType::VoiceClip if raw.nodes.is_empty() => {
                MessageKind::Invalid(InvalidKind::Format)
            }
            RawMessageType::VoiceClip => MessageKind::VoiceClip,
            RawMessageType::Contact => MessageKind::Contact,
            RawMessageType::ContainsMeta => match raw.meta {
                Some(RawContainsMeta::RichPreview { .. }) => MessageKind::RichPreview,
                Some(RawContainsMeta::Geolocation { .. }) => MessageKind::Geolocation,
                Some(RawContainsMeta::Giphy { .. }) => MessageKind::Giphy,
                Some(RawContainsMeta::Invalid) | None => MessageKind::Invalid(InvalidKind::Meta),
            },
            RawMessageType::AlterParticipants => {
                MessageKind::Management(ManagementKind::AlterParticipants)
            }
            RawMessageType::Truncate => MessageKind::Management(ManagementKind::Truncate),
            RawMessageType::PrivilegeChange => {
                MessageKind::Management(ManagementKind::PrivilegeChange)
            }
            RawMessageType::ChatTitle => MessageKind::Management(ManagementKind::ChatTitle),
            RawMessageType::CallEnded => MessageKind::Management(ManagementKind::CallEnded),
            RawMessageType::CallStarted => MessageKind::Management(ManagementKind::CallStarted),
            RawMessageType::PublicHandleCreate => {
                MessageKind::Management(ManagementKind::PublicHandleCreate)
            }
            RawMessageType::PublicHandleDelete => {
                MessageKind::Management(ManagementKind::PublicHandleDelete)
            }
            RawMessageType::SetRetentionTime => {
                MessageKind::Management(ManagementKind::RetentionTime)
            }
            RawMessageType::SetPrivateMode => MessageKind::Management(ManagementKind::PrivateMode),
            RawMessageType::ScheduledMeeting => {
                MessageKind::Management(ManagementKind::ScheduledMeeting)
            }
            RawMessageType::InvalidFormat => MessageKind::Invalid(InvalidKind::Format),
            RawMessageType::InvalidSignature => MessageKind::Invalid(InvalidKind::Signature),
            RawMessageType::Unrecognizable => MessageKind::Invalid(InvalidKind::Unrecognizable),
            RawMessageType::Unknown => MessageKind::Unknown,
        }
    }

    /// Kinds whose content lives in cloud nodes.
    pub fn references_nodes(&self) -> bool {
        matches!(self, MessageKind::Attachment | MessageKind::VoiceClip)
    }

    /// Returns a short display label used by list renderers.
    pub fn display_label(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Attachment => "[Attachment]",
            MessageKind::VoiceClip => "[Voice clip]",
            MessageKind::Contact => "[Contact]",
            MessageKind::RichPreview => "[Link]",
            MessageKind::Geolocation => "[Location]",
            MessageKind::Giphy => "[GIF]",
            MessageKind::Management(_) => "[Management]",
            MessageKind::Invalid(_) => "[Invalid message]",
            MessageKind::Unknown => "[Unknown]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub reaction: String,
    pub count: u32,
    #[serde(default)]
    pub has_me: bool,
}

/// A classified chat message as persisted in the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedMessage {
    pub chat_id: i64,
    pub msg_id: i64,
    pub temp_id: i64,
    pub timestamp: i64,
    pub user_handle: i64,
    pub is_mine: bool,
    pub should_show_avatar: bool,
    pub should_show_time: bool,
    pub kind: MessageKind,
    pub status: MessageStatus,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub content: Option<String>,
    pub reactions: Vec<Reaction>,
    /// Whether every node the message references still exists.
    pub exists: bool,
}

impl TypedMessage {
    /// A pending message has not been confirmed yet and still carries its temp id.
    pub fn is_pending(&self) -> bool {
        self.msg_id == self.temp_id
    }

    /// Returns the display content: label for non-text kinds, text otherwise.
    pub fn display_content(&self) -> String {
        if self.is_deleted {
            return "[Deleted]".to_owned();
        }

        let text = self.content.as_deref().unwrap_or_default();
        match (self.kind, text.is_empty()) {
            (MessageKind::Text, _) => text.to_owned(),
            (kind, true) => kind.display_label().to_owned(),
            (kind, false) => format!("{} {}", kind.display_label(), text),
        }
    }
}
