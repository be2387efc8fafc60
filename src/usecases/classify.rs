//! Classification of raw engine messages into save requests.
//!
//! A batch is sorted by timestamp before anything else so that grouping only
//! depends on chronology, not on the order the engine delivered messages in.

use std::sync::Arc;

use crate::{
    domain::{
        message::{MessageKind, RawContainsMeta, RawMessage, Reaction, TypedMessage},
        meta::{ChatGeolocation, ChatNode, Giphy, RichPreview},
    },
    sdk::{NodeExistence, ReactionResolver},
    usecases::contracts::StoreBatch,
};

const CLASSIFY_REACTIONS_DEGRADED: &str = "CLASSIFY_REACTIONS_DEGRADED";
const CLASSIFY_NODE_CHECK_DEGRADED: &str = "CLASSIFY_NODE_CHECK_DEGRADED";

/// One classified message, ready to be mapped into store rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveMessageRequest {
    pub chat_id: i64,
    pub message: RawMessage,
    pub kind: MessageKind,
    pub is_mine: bool,
    pub should_show_avatar: bool,
    pub should_show_time: bool,
    pub reactions: Vec<Reaction>,
    pub exists: bool,
}

impl SaveMessageRequest {
    pub fn to_typed_message(&self) -> TypedMessage {
        TypedMessage {
            chat_id: self.chat_id,
            msg_id: self.message.msg_id,
            temp_id: self.message.temp_id,
            timestamp: self.message.timestamp,
            user_handle: self.message.user_handle,
            is_mine: self.is_mine,
            should_show_avatar: self.should_show_avatar,
            should_show_time: self.should_show_time,
            kind: self.kind,
            status: self.message.status,
            is_edited: self.message.is_edited,
            is_deleted: self.message.is_deleted,
            content: self.message.content.clone(),
            reactions: self.reactions.clone(),
            exists: self.exists,
        }
    }

    /// Adds the message row and its meta-attachment rows to `batch`.
    pub fn append_rows(&self, batch: &mut StoreBatch) {
        let message_id = self.message.msg_id;

        match (&self.kind, &self.message.meta) {
            (
                MessageKind::RichPreview,
                Some(RawContainsMeta::RichPreview {
                    url,
                    title,
                    description,
                    image,
                    icon,
                    domain,
                }),
            ) => batch.rich_previews.push(RichPreview {
                message_id,
                url: url.clone(),
                title: title.clone(),
                description: description.clone(),
                image: image.clone(),
                icon: icon.clone(),
                domain: domain.clone(),
            }),
            (
                MessageKind::Geolocation,
                Some(RawContainsMeta::Geolocation {
                    longitude,
                    latitude,
                    image,
                }),
            ) => batch.geolocations.push(ChatGeolocation {
                message_id,
                longitude: *longitude,
                latitude: *latitude,
                image: image.clone(),
            }),
            (
                MessageKind::Giphy,
                Some(RawContainsMeta::Giphy {
                    mp4_src,
                    webp_src,
                    title,
                    width,
                    height,
                }),
            ) => batch.giphys.push(Giphy {
                message_id,
                mp4_src: mp4_src.clone(),
                webp_src: webp_src.clone(),
                title: title.clone(),
                width: *width,
                height: *height,
            }),
            (kind, _) if kind.references_nodes() => {
                batch
                    .nodes
                    .extend(self.message.nodes.iter().map(|node| ChatNode {
                        message_id,
                        node_id: node.node_id,
                        name: node.name.clone(),
                        size: node.size,
                    }))
            }
            _ => {}
        }

        batch.messages.push(self.to_typed_message());
    }
}

#[derive(Clone)]
pub struct MessageClassifier {
    reactions: Arc<dyn ReactionResolver>,
    nodes: Arc<dyn NodeExistence>,
}

impl MessageClassifier {
    pub fn new(reactions: Arc<dyn ReactionResolver>, nodes: Arc<dyn NodeExistence>) -> Self {
        Self { reactions, nodes }
    }

    /// Classifies one batch of a chat's history.
    ///
    /// `next_message_user_handle` is the sender of the message that follows the
    /// newest message of the batch, when that message is known.
    pub async fn classify_batch(
        &self,
        chat_id: i64,
        mut messages: Vec<RawMessage>,
        my_handle: i64,
        next_message_user_handle: Option<i64>,
    ) -> Vec<SaveMessageRequest> {
        messages.sort_by_key(|message| message.timestamp);

        let successors: Vec<Option<i64>> = (0..messages.len())
            .map(|index| {
                messages
                    .get(index + 1)
                    .map(|next| next.user_handle)
                    .or(next_message_user_handle)
            })
            .collect();

        let mut requests = Vec::with_capacity(messages.len());
        for (message, next_sender) in messages.into_iter().zip(successors) {
            let is_mine = message.user_handle == my_handle;
            let closes_group = next_sender != Some(message.user_handle);
            let kind = MessageKind::from_raw(&message);
            let reactions = self.resolve_reactions(chat_id, &message, my_handle).await;
            let exists = self.resolve_exists(&message, kind, is_mine).await;

            requests.push(SaveMessageRequest {
                chat_id,
                kind,
                is_mine,
                should_show_avatar: !is_mine && closes_group,
                should_show_time: closes_group,
                reactions,
                exists,
                message,
            });
        }

        requests
    }

    // Messages without confirmed reactions are not looked up at all.
    async fn resolve_reactions(
        &self,
        chat_id: i64,
        message: &RawMessage,
        my_handle: i64,
    ) -> Vec<Reaction> {
        if !message.has_confirmed_reactions {
            return Vec::new();
        }

        match self
            .reactions
            .get_reactions(chat_id, message.msg_id, my_handle)
            .await
        {
            Ok(reactions) => reactions,
            Err(error) => {
                tracing::warn!(
                    code = CLASSIFY_REACTIONS_DEGRADED,
                    chat_id,
                    msg_id = message.msg_id,
                    error = %error,
                    "reaction lookup failed; storing message without reactions"
                );
                Vec::new()
            }
        }
    }

    // Only the sender can remove the nodes they shared, so other users'
    // attachments are assumed to exist.
    async fn resolve_exists(&self, message: &RawMessage, kind: MessageKind, is_mine: bool) -> bool {
        if !is_mine || !kind.references_nodes() {
            return true;
        }

        for node in &message.nodes {
            match self.nodes.does_node_exist(node.node_id).await {
                Ok(true) => {}
                Ok(false) => return false,
                Err(error) => {
                    tracing::warn!(
                        code = CLASSIFY_NODE_CHECK_DEGRADED,
                        msg_id = message.msg_id,
                        node_id = node.node_id,
                        error = %error,
                        "node existence check failed; assuming node exists"
                    );
                }
            }
        }

        true
    }
}
