//! Auxiliary content attached to a stored message. Every row references its
//! parent through `message_id` and is removed together with it.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichPreview {
    pub message_id: i64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub icon: Option<String>,
    pub domain: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Giphy {
    pub message_id: i64,
    pub mp4_src: Option<String>,
    pub webp_src: Option<String>,
    pub title: String,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatGeolocation {
    pub message_id: i64,
    pub longitude: f64,
    pub latitude: f64,
    pub image: Option<String>,
}

/// Cloud node referenced by an attachment or voice clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatNode {
    pub message_id: i64,
    pub node_id: i64,
    pub name: String,
    pub size: i64,
}
