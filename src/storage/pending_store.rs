use rusqlite::{params, OptionalExtension};

use crate::{
    domain::pending::{NewPendingMessage, PendingMessage, PendingMessageState},
    storage::{
        rows::{pending_from_row, PENDING_COLUMNS},
        SqliteMessageStore, StoreError,
    },
    usecases::contracts::PendingMessageStore,
};

impl PendingMessageStore for SqliteMessageStore {
    fn insert_pending(&self, message: NewPendingMessage) -> Result<PendingMessage, StoreError> {
        let conn = self.connection();
        let state = PendingMessageState::Queued;
        conn.execute(
            "INSERT INTO pending_messages (chat_id, state, transfer_tag, file_path, timestamp) \
             VALUES (?1, ?2, NULL, ?3, ?4)",
            params![
                message.chat_id,
                state.as_str(),
                message.file_path,
                message.timestamp
            ],
        )?;

        Ok(PendingMessage {
            id: conn.last_insert_rowid(),
            chat_id: message.chat_id,
            state,
            transfer_tag: None,
            file_path: message.file_path,
            timestamp: message.timestamp,
        })
    }

    fn get_pending(&self, id: i64) -> Result<Option<PendingMessage>, StoreError> {
        let pending = self
            .connection()
            .query_row(
                &format!("SELECT {PENDING_COLUMNS} FROM pending_messages WHERE id = ?1"),
                [id],
                pending_from_row,
            )
            .optional()?;

        Ok(pending)
    }

    fn get_pending_by_transfer_tag(
        &self,
        transfer_tag: i32,
    ) -> Result<Option<PendingMessage>, StoreError> {
        let pending = self
            .connection()
            .query_row(
                &format!(
                    "SELECT {PENDING_COLUMNS} FROM pending_messages \
                     WHERE transfer_tag = ?1 ORDER BY id DESC LIMIT 1"
                ),
                [transfer_tag],
                pending_from_row,
            )
            .optional()?;

        Ok(pending)
    }

    fn pending_messages(&self, chat_id: i64) -> Result<Vec<PendingMessage>, StoreError> {
        let conn = self.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PENDING_COLUMNS} FROM pending_messages WHERE chat_id = ?1 ORDER BY timestamp, id"
        ))?;
        let rows = stmt.query_map([chat_id], pending_from_row)?;
        let pending = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(pending)
    }

    fn update_pending_state(
        &self,
        id: i64,
        state: PendingMessageState,
        transfer_tag: Option<i32>,
    ) -> Result<bool, StoreError> {
        let changed = self.connection().execute(
            "UPDATE pending_messages SET state = ?2, transfer_tag = ?3 WHERE id = ?1",
            params![id, state.as_str(), transfer_tag],
        )?;

        Ok(changed > 0)
    }

    fn delete_pending(&self, id: i64) -> Result<bool, StoreError> {
        let changed = self
            .connection()
            .execute("DELETE FROM pending_messages WHERE id = ?1", [id])?;

        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::message::{MessageKind, MessageStatus, TypedMessage},
        usecases::contracts::{MessageStore, StoreBatch},
    };

    fn new_pending(chat_id: i64, timestamp: i64) -> NewPendingMessage {
        NewPendingMessage {
            chat_id,
            file_path: Some("/tmp/upload.jpg".to_owned()),
            timestamp,
        }
    }

    #[test]
    fn inserted_pending_message_starts_queued() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");

        let pending = store.insert_pending(new_pending(1, 10)).expect("insert");

        assert_eq!(pending.state, PendingMessageState::Queued);
        assert_eq!(store.get_pending(pending.id).expect("read"), Some(pending));
    }

    #[test]
    fn clearing_chat_history_keeps_the_upload_queue() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let pending = store.insert_pending(new_pending(1, 10)).expect("insert");

        store.clear_chat_messages(1).expect("clear");

        assert_eq!(store.pending_messages(1).expect("list"), vec![pending]);
    }

    #[test]
    fn state_and_tag_updates_are_persisted() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let pending = store.insert_pending(new_pending(1, 10)).expect("insert");

        assert!(store
            .update_pending_state(pending.id, PendingMessageState::Uploading, Some(33))
            .expect("update"));

        let by_tag = store
            .get_pending_by_transfer_tag(33)
            .expect("read")
            .expect("row");
        assert_eq!(by_tag.id, pending.id);
        assert_eq!(by_tag.state, PendingMessageState::Uploading);
        assert!(!store
            .update_pending_state(999, PendingMessageState::Error, None)
            .expect("update"));
    }

    #[test]
    fn lists_pending_messages_of_one_chat_in_order() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let later = store.insert_pending(new_pending(1, 20)).expect("insert");
        let earlier = store.insert_pending(new_pending(1, 10)).expect("insert");
        store.insert_pending(new_pending(2, 5)).expect("insert");

        let ids: Vec<i64> = store
            .pending_messages(1)
            .expect("list")
            .iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec![earlier.id, later.id]);
    }

    #[test]
    fn delete_reports_whether_a_row_was_removed() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let pending = store.insert_pending(new_pending(1, 10)).expect("insert");

        assert!(store.delete_pending(pending.id).expect("delete"));
        assert!(!store.delete_pending(pending.id).expect("delete"));
    }

    #[test]
    fn confirmed_message_supersedes_pending_upload() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let pending = store.insert_pending(new_pending(1, 10)).expect("insert");

        store
            .store_messages(StoreBatch {
                messages: vec![TypedMessage {
                    chat_id: 1,
                    msg_id: 8_000,
                    temp_id: pending.id,
                    timestamp: 11,
                    user_handle: 1,
                    is_mine: true,
                    should_show_avatar: false,
                    should_show_time: true,
                    kind: MessageKind::Attachment,
                    status: MessageStatus::ServerReceived,
                    is_edited: false,
                    is_deleted: false,
                    content: None,
                    reactions: vec![],
                    exists: true,
                }],
                ..StoreBatch::default()
            })
            .expect("store");

        assert_eq!(store.get_pending(pending.id).expect("read"), None);
    }
}
