use rusqlite::{params, types::Type, Connection, Row};
use serde::de::DeserializeOwned;

use crate::{
    domain::{
        message::{MessageStatus, TypedMessage},
        meta::{ChatGeolocation, ChatNode, Giphy, RichPreview},
        pending::{PendingMessage, PendingMessageState},
    },
    storage::StoreError,
};

pub const MESSAGE_COLUMNS: &str = "chat_id, msg_id, temp_id, timestamp, user_handle, is_mine, \
     should_show_avatar, should_show_time, kind, status, is_edited, is_deleted, content, \
     reactions, node_exists";

pub const PENDING_COLUMNS: &str = "id, chat_id, state, transfer_tag, file_path, timestamp";

pub fn message_from_row(row: &Row<'_>) -> rusqlite::Result<TypedMessage> {
    let kind: String = row.get(8)?;
    let status: String = row.get(9)?;
    let reactions: String = row.get(13)?;

    Ok(TypedMessage {
        chat_id: row.get(0)?,
        msg_id: row.get(1)?,
        temp_id: row.get(2)?,
        timestamp: row.get(3)?,
        user_handle: row.get(4)?,
        is_mine: row.get(5)?,
        should_show_avatar: row.get(6)?,
        should_show_time: row.get(7)?,
        kind: decode_json(8, &kind)?,
        status: MessageStatus::parse(&status).ok_or_else(|| unknown_value(9, &status))?,
        is_edited: row.get(10)?,
        is_deleted: row.get(11)?,
        content: row.get(12)?,
        reactions: decode_json(13, &reactions)?,
        exists: row.get(14)?,
    })
}

pub fn pending_from_row(row: &Row<'_>) -> rusqlite::Result<PendingMessage> {
    let state: String = row.get(2)?;

    Ok(PendingMessage {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        state: PendingMessageState::parse(&state).ok_or_else(|| unknown_value(2, &state))?,
        transfer_tag: row.get(3)?,
        file_path: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

pub fn rich_preview_from_row(row: &Row<'_>) -> rusqlite::Result<RichPreview> {
    Ok(RichPreview {
        message_id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        image: row.get(4)?,
        icon: row.get(5)?,
        domain: row.get(6)?,
    })
}

pub fn giphy_from_row(row: &Row<'_>) -> rusqlite::Result<Giphy> {
    Ok(Giphy {
        message_id: row.get(0)?,
        mp4_src: row.get(1)?,
        webp_src: row.get(2)?,
        title: row.get(3)?,
        width: row.get(4)?,
        height: row.get(5)?,
    })
}

pub fn geolocation_from_row(row: &Row<'_>) -> rusqlite::Result<ChatGeolocation> {
    Ok(ChatGeolocation {
        message_id: row.get(0)?,
        longitude: row.get(1)?,
        latitude: row.get(2)?,
        image: row.get(3)?,
    })
}

pub fn node_from_row(row: &Row<'_>) -> rusqlite::Result<ChatNode> {
    Ok(ChatNode {
        message_id: row.get(0)?,
        node_id: row.get(1)?,
        name: row.get(2)?,
        size: row.get(3)?,
    })
}

/// Full-row replace: a stored row with the same key is overwritten, not merged.
pub fn replace_message(conn: &Connection, message: &TypedMessage) -> Result<(), StoreError> {
    let kind = serde_json::to_string(&message.kind)?;
    let reactions = serde_json::to_string(&message.reactions)?;

    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO typed_messages ({MESSAGE_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            message.chat_id,
            message.msg_id,
            message.temp_id,
            message.timestamp,
            message.user_handle,
            message.is_mine,
            message.should_show_avatar,
            message.should_show_time,
            kind,
            message.status.as_str(),
            message.is_edited,
            message.is_deleted,
            message.content,
            reactions,
            message.exists,
        ],
    )?;

    Ok(())
}

pub fn replace_rich_preview(conn: &Connection, preview: &RichPreview) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO rich_previews \
         (message_id, url, title, description, image, icon, domain) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            preview.message_id,
            preview.url,
            preview.title,
            preview.description,
            preview.image,
            preview.icon,
            preview.domain,
        ],
    )?;
    Ok(())
}

pub fn replace_giphy(conn: &Connection, giphy: &Giphy) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO giphys (message_id, mp4_src, webp_src, title, width, height) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            giphy.message_id,
            giphy.mp4_src,
            giphy.webp_src,
            giphy.title,
            giphy.width,
            giphy.height,
        ],
    )?;
    Ok(())
}

pub fn replace_geolocation(conn: &Connection, geolocation: &ChatGeolocation) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO chat_geolocations (message_id, longitude, latitude, image) \
         VALUES (?1, ?2, ?3, ?4)",
        params![
            geolocation.message_id,
            geolocation.longitude,
            geolocation.latitude,
            geolocation.image,
        ],
    )?;
    Ok(())
}

pub fn replace_node(conn: &Connection, node: &ChatNode) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO chat_nodes (message_id, node_id, name, size) \
         VALUES (?1, ?2, ?3, ?4)",
        params![node.message_id, node.node_id, node.name, node.size],
    )?;
    Ok(())
}

fn decode_json<T: DeserializeOwned>(column: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error)))
}

fn unknown_value(column: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        Type::Text,
        format!("unknown value {value:?}").into(),
    )
}
