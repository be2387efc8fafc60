use std::{fs, path::Path};

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::watch;

use crate::{
    domain::{
        message::TypedMessage,
        meta::{ChatGeolocation, ChatNode, Giphy, RichPreview},
        paging::Page,
    },
    storage::{
        rows::{
            geolocation_from_row, giphy_from_row, message_from_row, node_from_row,
            replace_geolocation, replace_giphy, replace_message, replace_node,
            replace_rich_preview, rich_preview_from_row, MESSAGE_COLUMNS,
        },
        schema::{META_TABLES, SCHEMA},
        StoreError,
    },
    usecases::contracts::{MessageStore, StoreBatch},
};

const STORE_MESSAGES_COMMITTED: &str = "STORE_MESSAGES_COMMITTED";
const STORE_CHAT_CLEARED: &str = "STORE_CHAT_CLEARED";
const STORE_STALE_TEMP_REMOVED: &str = "STORE_STALE_TEMP_REMOVED";

#[derive(Debug)]
pub struct SqliteMessageStore {
    conn: Mutex<Connection>,
    invalidation: watch::Sender<u64>,
}

impl SqliteMessageStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        let (invalidation, _) = watch::channel(0);

        Ok(Self {
            conn: Mutex::new(conn),
            invalidation,
        })
    }

    pub(super) fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    pub(super) fn invalidate(&self) {
        self.invalidation.send_modify(|generation| *generation += 1);
    }
}

impl MessageStore for SqliteMessageStore {
    fn store_messages(&self, batch: StoreBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection();
        let tx = conn.transaction()?;

        for message in &batch.messages {
            replace_message(&tx, message)?;
        }
        for preview in &batch.rich_previews {
            replace_rich_preview(&tx, preview)?;
        }
        for giphy in &batch.giphys {
            replace_giphy(&tx, giphy)?;
        }
        for geolocation in &batch.geolocations {
            replace_geolocation(&tx, geolocation)?;
        }
        for node in &batch.nodes {
            replace_node(&tx, node)?;
        }

        // After the inserts, so temp rows written by this same batch are caught too.
        let mut stale_ids = Vec::new();
        for message in batch.messages.iter().filter(|message| !message.is_pending()) {
            let removed = tx.execute(
                "DELETE FROM typed_messages WHERE chat_id = ?1 AND msg_id = ?2 AND temp_id = ?2",
                params![message.chat_id, message.temp_id],
            )?;
            if removed > 0 {
                stale_ids.push(message.temp_id);
            }

            tx.execute(
                "DELETE FROM pending_messages WHERE chat_id = ?1 AND id = ?2",
                params![message.chat_id, message.temp_id],
            )?;
        }
        delete_meta_for(&tx, &stale_ids)?;

        tx.commit()?;
        drop(conn);
        self.invalidate();

        if !stale_ids.is_empty() {
            tracing::debug!(
                code = STORE_STALE_TEMP_REMOVED,
                count = stale_ids.len(),
                "confirmed messages replaced their temp rows"
            );
        }
        tracing::debug!(
            code = STORE_MESSAGES_COMMITTED,
            messages = batch.messages.len(),
            rich_previews = batch.rich_previews.len(),
            giphys = batch.giphys.len(),
            geolocations = batch.geolocations.len(),
            nodes = batch.nodes.len(),
            "message batch committed"
        );

        Ok(())
    }

    fn clear_chat_messages(&self, chat_id: i64) -> Result<(), StoreError> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;

        // Pending rows are left alone: they belong to the upload queue, which
        // outlives the cached history.
        // Ids first: once the parent rows are gone nothing links the meta rows to the chat.
        let ids = message_ids_of_chat(&tx, chat_id)?;
        tx.execute("DELETE FROM typed_messages WHERE chat_id = ?1", [chat_id])?;
        delete_meta_for(&tx, &ids)?;

        tx.commit()?;
        drop(conn);
        self.invalidate();

        tracing::info!(
            code = STORE_CHAT_CLEARED,
            chat_id,
            messages = ids.len(),
            "chat history cleared from local store"
        );

        Ok(())
    }

    fn get_next_message(
        &self,
        chat_id: i64,
        timestamp: i64,
    ) -> Result<Option<TypedMessage>, StoreError> {
        let conn = self.connection();
        let message = conn
            .query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM typed_messages \
                     WHERE chat_id = ?1 AND timestamp > ?2 \
                     ORDER BY timestamp ASC, msg_id ASC LIMIT 1"
                ),
                params![chat_id, timestamp],
                message_from_row,
            )
            .optional()?;

        Ok(message)
    }

    fn get_message(&self, chat_id: i64, msg_id: i64) -> Result<Option<TypedMessage>, StoreError> {
        let conn = self.connection();
        let message = conn
            .query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM typed_messages WHERE chat_id = ?1 AND msg_id = ?2"
                ),
                params![chat_id, msg_id],
                message_from_row,
            )
            .optional()?;

        Ok(message)
    }

    fn update_message(&self, message: TypedMessage) -> Result<bool, StoreError> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM typed_messages WHERE chat_id = ?1 AND msg_id = ?2",
                params![message.chat_id, message.msg_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        if !exists {
            return Ok(false);
        }

        replace_message(&tx, &message)?;
        tx.commit()?;
        drop(conn);
        self.invalidate();

        Ok(true)
    }

    fn delete_message(&self, chat_id: i64, msg_id: i64) -> Result<bool, StoreError> {
        let changed = self.connection().execute(
            "UPDATE typed_messages SET is_deleted = 1 WHERE chat_id = ?1 AND msg_id = ?2",
            params![chat_id, msg_id],
        )?;

        if changed > 0 {
            self.invalidate();
        }

        Ok(changed > 0)
    }

    fn message_count(&self, chat_id: i64) -> Result<usize, StoreError> {
        let count: i64 = self.connection().query_row(
            "SELECT COUNT(*) FROM typed_messages WHERE chat_id = ?1",
            [chat_id],
            |row| row.get(0),
        )?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn load_page(
        &self,
        chat_id: i64,
        offset: usize,
        size: usize,
    ) -> Result<Page<TypedMessage>, StoreError> {
        let conn = self.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM typed_messages \
             WHERE chat_id = ?1 AND is_deleted = 0 \
             ORDER BY timestamp DESC, msg_id DESC LIMIT ?2 OFFSET ?3"
        ))?;

        let rows = stmt.query_map(
            params![chat_id, to_sql_count(size), to_sql_count(offset)],
            message_from_row,
        )?;
        let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Page::new(items, offset, size))
    }

    fn get_rich_preview(&self, message_id: i64) -> Result<Option<RichPreview>, StoreError> {
        let preview = self
            .connection()
            .query_row(
                "SELECT message_id, url, title, description, image, icon, domain \
                 FROM rich_previews WHERE message_id = ?1",
                [message_id],
                rich_preview_from_row,
            )
            .optional()?;

        Ok(preview)
    }

    fn get_giphy(&self, message_id: i64) -> Result<Option<Giphy>, StoreError> {
        let giphy = self
            .connection()
            .query_row(
                "SELECT message_id, mp4_src, webp_src, title, width, height \
                 FROM giphys WHERE message_id = ?1",
                [message_id],
                giphy_from_row,
            )
            .optional()?;

        Ok(giphy)
    }

    fn get_geolocation(&self, message_id: i64) -> Result<Option<ChatGeolocation>, StoreError> {
        let geolocation = self
            .connection()
            .query_row(
                "SELECT message_id, longitude, latitude, image \
                 FROM chat_geolocations WHERE message_id = ?1",
                [message_id],
                geolocation_from_row,
            )
            .optional()?;

        Ok(geolocation)
    }

    fn get_nodes(&self, message_id: i64) -> Result<Vec<ChatNode>, StoreError> {
        let conn = self.connection();
        let mut stmt = conn.prepare(
            "SELECT message_id, node_id, name, size FROM chat_nodes \
             WHERE message_id = ?1 ORDER BY node_id",
        )?;
        let rows = stmt.query_map([message_id], node_from_row)?;
        let nodes = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(nodes)
    }

    fn subscribe_invalidation(&self) -> watch::Receiver<u64> {
        self.invalidation.subscribe()
    }
}

fn message_ids_of_chat(conn: &Connection, chat_id: i64) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT msg_id FROM typed_messages WHERE chat_id = ?1")?;
    let rows = stmt.query_map([chat_id], |row| row.get(0))?;
    let ids = rows.collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

fn delete_meta_for(conn: &Connection, message_ids: &[i64]) -> rusqlite::Result<()> {
    if message_ids.is_empty() {
        return Ok(());
    }

    for table in META_TABLES {
        let mut stmt = conn.prepare(&format!("DELETE FROM {table} WHERE message_id = ?1"))?;
        for message_id in message_ids {
            stmt.execute([message_id])?;
        }
    }

    Ok(())
}

fn to_sql_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::{MessageKind, MessageStatus, Reaction};

    fn message(chat_id: i64, msg_id: i64, timestamp: i64) -> TypedMessage {
        TypedMessage {
            chat_id,
            msg_id,
            temp_id: 0,
            timestamp,
            user_handle: 9,
            is_mine: false,
            should_show_avatar: true,
            should_show_time: true,
            kind: MessageKind::Text,
            status: MessageStatus::Seen,
            is_edited: false,
            is_deleted: false,
            content: Some(format!("message {msg_id}")),
            reactions: vec![],
            exists: true,
        }
    }

    fn full_batch(chat_id: i64, msg_id: i64) -> StoreBatch {
        StoreBatch {
            messages: vec![message(chat_id, msg_id, 100)],
            rich_previews: vec![RichPreview {
                message_id: msg_id,
                url: "https://example.org".to_owned(),
                title: "Example".to_owned(),
                description: String::new(),
                image: None,
                icon: None,
                domain: "example.org".to_owned(),
            }],
            giphys: vec![Giphy {
                message_id: msg_id,
                mp4_src: Some("a.mp4".to_owned()),
                webp_src: None,
                title: "gif".to_owned(),
                width: 10,
                height: 20,
            }],
            geolocations: vec![ChatGeolocation {
                message_id: msg_id,
                longitude: 174.7,
                latitude: -36.8,
                image: None,
            }],
            nodes: vec![ChatNode {
                message_id: msg_id,
                node_id: 77,
                name: "file.pdf".to_owned(),
                size: 1_024,
            }],
        }
    }

    fn meta_row_count(store: &SqliteMessageStore) -> i64 {
        let conn = store.connection();
        META_TABLES
            .iter()
            .map(|table| {
                conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get::<_, i64>(0)
                })
                .expect("count should succeed")
            })
            .sum()
    }

    #[test]
    fn stores_and_reads_back_message_with_reactions() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let mut stored = message(1, 10, 100);
        stored.reactions = vec![Reaction {
            reaction: "+1".to_owned(),
            count: 3,
            has_me: true,
        }];

        store
            .store_messages(StoreBatch {
                messages: vec![stored.clone()],
                ..StoreBatch::default()
            })
            .expect("store should succeed");

        assert_eq!(store.get_message(1, 10).expect("read"), Some(stored));
    }

    #[test]
    fn same_key_is_replaced_not_merged() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let mut first = message(1, 10, 100);
        first.content = Some("first".to_owned());
        store
            .store_messages(StoreBatch {
                messages: vec![first],
                ..StoreBatch::default()
            })
            .expect("store");

        let mut second = message(1, 10, 100);
        second.content = None;
        store
            .store_messages(StoreBatch {
                messages: vec![second],
                ..StoreBatch::default()
            })
            .expect("store");

        let read = store.get_message(1, 10).expect("read").expect("row");
        assert_eq!(read.content, None);
        assert_eq!(store.message_count(1).expect("count"), 1);
    }

    #[test]
    fn confirmed_message_removes_stale_temp_row_and_its_meta() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let mut pending = message(1, 500, 100);
        pending.temp_id = 500;
        let mut pending_batch = full_batch(1, 500);
        pending_batch.messages = vec![pending];
        store.store_messages(pending_batch).expect("store pending");

        let mut confirmed = message(1, 42, 100);
        confirmed.temp_id = 500;
        store
            .store_messages(StoreBatch {
                messages: vec![confirmed.clone()],
                ..StoreBatch::default()
            })
            .expect("store confirmed");

        assert_eq!(store.get_message(1, 500).expect("read"), None);
        assert_eq!(store.get_message(1, 42).expect("read"), Some(confirmed));
        assert_eq!(meta_row_count(&store), 0);
    }

    #[test]
    fn confirmed_message_replaces_temp_row_from_the_same_batch() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let mut pending = message(1, 500, 100);
        pending.temp_id = 500;
        let mut confirmed = message(1, 42, 100);
        confirmed.temp_id = 500;
        let mut batch = full_batch(1, 500);
        batch.messages = vec![pending, confirmed.clone()];

        store.store_messages(batch).expect("store batch");

        assert_eq!(store.get_message(1, 500).expect("read"), None);
        assert_eq!(store.get_message(1, 42).expect("read"), Some(confirmed));
        assert_eq!(meta_row_count(&store), 0);
    }

    #[test]
    fn pending_message_does_not_remove_itself() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let mut pending = message(1, 500, 100);
        pending.temp_id = 500;

        for _ in 0..2 {
            store
                .store_messages(StoreBatch {
                    messages: vec![pending.clone()],
                    ..StoreBatch::default()
                })
                .expect("store pending");
        }

        assert_eq!(store.message_count(1).expect("count"), 1);
    }

    #[test]
    fn clear_removes_messages_and_every_meta_row_of_the_chat() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        store.store_messages(full_batch(1, 10)).expect("store chat 1");
        store.store_messages(full_batch(2, 20)).expect("store chat 2");

        store.clear_chat_messages(1).expect("clear");

        assert_eq!(store.message_count(1).expect("count"), 0);
        assert_eq!(store.get_rich_preview(10).expect("read"), None);
        assert_eq!(store.get_giphy(10).expect("read"), None);
        assert_eq!(store.get_geolocation(10).expect("read"), None);
        assert!(store.get_nodes(10).expect("read").is_empty());

        assert_eq!(store.message_count(2).expect("count"), 1);
        assert!(store.get_rich_preview(20).expect("read").is_some());
        assert_eq!(store.get_nodes(20).expect("read").len(), 1);
    }

    #[test]
    fn failed_meta_write_rolls_back_the_whole_batch() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        store
            .connection()
            .execute_batch("DROP TABLE chat_geolocations")
            .expect("table should drop");

        let result = store.store_messages(full_batch(1, 10));

        assert!(result.is_err());
        assert_eq!(store.message_count(1).expect("count"), 0);
        assert_eq!(store.get_rich_preview(10).expect("read"), None);
    }

    #[test]
    fn next_message_is_the_closest_later_one() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        store
            .store_messages(StoreBatch {
                messages: vec![message(1, 1, 100), message(1, 3, 300), message(1, 2, 200)],
                ..StoreBatch::default()
            })
            .expect("store");

        let next = store.get_next_message(1, 150).expect("read").expect("row");
        assert_eq!(next.msg_id, 2);
        assert_eq!(
            store.get_next_message(1, 200).expect("read").map(|m| m.msg_id),
            Some(3)
        );
        assert_eq!(store.get_next_message(1, 300).expect("read"), None);
        assert_eq!(store.get_next_message(2, 0).expect("read"), None);
    }

    #[test]
    fn pages_are_newest_first_and_skip_deleted() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        store
            .store_messages(StoreBatch {
                messages: (1..=5).map(|id| message(1, id, id * 10)).collect(),
                ..StoreBatch::default()
            })
            .expect("store");
        assert!(store.delete_message(1, 4).expect("delete"));

        let first = store.load_page(1, 0, 2).expect("page");
        let ids: Vec<i64> = first.items.iter().map(|m| m.msg_id).collect();
        assert_eq!(ids, vec![5, 3]);
        assert_eq!(first.next_key, Some(2));

        let last = store.load_page(1, 2, 2).expect("page");
        let ids: Vec<i64> = last.items.iter().map(|m| m.msg_id).collect();
        assert_eq!(ids, vec![2, 1]);

        let empty = store.load_page(1, 4, 2).expect("page");
        assert!(empty.items.is_empty());
        assert_eq!(empty.next_key, None);
    }

    #[test]
    fn page_past_the_largest_offset_is_empty() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        store
            .store_messages(StoreBatch {
                messages: vec![message(1, 1, 100)],
                ..StoreBatch::default()
            })
            .expect("store");

        let page = store.load_page(1, usize::MAX, 20).expect("page");

        assert!(page.items.is_empty());
        assert_eq!(page.next_key, None);
    }

    #[test]
    fn update_replaces_only_existing_rows() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        store
            .store_messages(StoreBatch {
                messages: vec![message(1, 10, 100)],
                ..StoreBatch::default()
            })
            .expect("store");

        let mut edited = message(1, 10, 100);
        edited.is_edited = true;
        edited.content = Some("edited".to_owned());

        assert!(store.update_message(edited.clone()).expect("update"));
        assert_eq!(store.get_message(1, 10).expect("read"), Some(edited));
        assert!(!store.update_message(message(1, 99, 100)).expect("update"));
        assert_eq!(store.get_message(1, 99).expect("read"), None);
    }

    #[test]
    fn writes_bump_invalidation_generation() {
        let store = SqliteMessageStore::open_in_memory().expect("store should open");
        let rx = store.subscribe_invalidation();

        store.store_messages(full_batch(1, 10)).expect("store");
        store.store_messages(StoreBatch::default()).expect("empty store");
        store.clear_chat_messages(1).expect("clear");

        assert_eq!(*rx.borrow(), 2);
    }

    #[test]
    fn opens_database_file_in_nested_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("messages.db");

        {
            let store = SqliteMessageStore::open(&path).expect("store should open");
            store.store_messages(full_batch(1, 10)).expect("store");
        }

        let reopened = SqliteMessageStore::open(&path).expect("store should reopen");
        assert_eq!(reopened.message_count(1).expect("count"), 1);
    }
}
