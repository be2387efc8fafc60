/// Meta tables reference `typed_messages` by `message_id` only. Deletes are
/// issued explicitly by the store; no cascade is configured.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS typed_messages (
  chat_id INTEGER NOT NULL,
  msg_id INTEGER NOT NULL,
  temp_id INTEGER NOT NULL,
  timestamp INTEGER NOT NULL,
  user_handle INTEGER NOT NULL,
  is_mine INTEGER NOT NULL,
  should_show_avatar INTEGER NOT NULL,
  should_show_time INTEGER NOT NULL,
  kind TEXT NOT NULL,
  status TEXT NOT NULL,
  is_edited INTEGER NOT NULL DEFAULT 0,
  is_deleted INTEGER NOT NULL DEFAULT 0,
  content TEXT,
  reactions TEXT NOT NULL DEFAULT '[]',
  node_exists INTEGER NOT NULL DEFAULT 1,
  PRIMARY KEY (chat_id, msg_id)
);

CREATE INDEX IF NOT EXISTS idx_typed_messages_chat_timestamp
  ON typed_messages(chat_id, timestamp);

CREATE TABLE IF NOT EXISTS rich_previews (
  message_id INTEGER PRIMARY KEY,
  url TEXT NOT NULL,
  title TEXT NOT NULL,
  description TEXT NOT NULL,
  image TEXT,
  icon TEXT,
  domain TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS giphys (
  message_id INTEGER PRIMARY KEY,
  mp4_src TEXT,
  webp_src TEXT,
  title TEXT NOT NULL,
  width INTEGER NOT NULL,
  height INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_geolocations (
  message_id INTEGER PRIMARY KEY,
  longitude REAL NOT NULL,
  latitude REAL NOT NULL,
  image TEXT
);

CREATE TABLE IF NOT EXISTS chat_nodes (
  message_id INTEGER NOT NULL,
  node_id INTEGER NOT NULL,
  name TEXT NOT NULL,
  size INTEGER NOT NULL,
  PRIMARY KEY (message_id, node_id)
);

CREATE TABLE IF NOT EXISTS pending_messages (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  chat_id INTEGER NOT NULL,
  state TEXT NOT NULL,
  transfer_tag INTEGER,
  file_path TEXT,
  timestamp INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pending_messages_chat ON pending_messages(chat_id);
"#;

/// Tables holding rows keyed by a parent message id.
pub const META_TABLES: [&str; 4] = ["rich_previews", "giphys", "chat_geolocations", "chat_nodes"];
