/// Direction of a pager load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadType {
    /// Drop the cached history and load from the newest message.
    Refresh,
    /// Load newer messages. History only grows backwards, so this never fetches.
    Prepend,
    /// Load older messages.
    Append,
}

impl LoadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadType::Refresh => "refresh",
            LoadType::Prepend => "prepend",
            LoadType::Append => "append",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingState {
    pub page_size: usize,
    pub initial_load_size: usize,
}

impl Default for PagingState {
    fn default() -> Self {
        Self {
            page_size: 20,
            initial_load_size: 60,
        }
    }
}

/// Observable state of a remote mediator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MediatorState {
    #[default]
    Idle,
    Fetching,
    Success {
        end_reached: bool,
    },
    Error {
        message: String,
    },
}

/// One window of a reverse-chronological read. Keys are row offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub prev_key: Option<usize>,
    pub next_key: Option<usize>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, offset: usize, size: usize) -> Self {
        let prev_key = (offset > 0).then(|| offset.saturating_sub(size));
        let next_key = (size > 0 && items.len() >= size).then(|| offset.saturating_add(size));

        Self {
            items,
            prev_key,
            next_key,
        }
    }
}
