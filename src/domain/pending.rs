use thiserror::Error;

/// Lifecycle of a locally queued message that has not been confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingMessageState {
    #[default]
    Queued,
    Uploading,
    Error,
    Sent,
}

impl PendingMessageState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingMessageState::Queued => "queued",
            PendingMessageState::Uploading => "uploading",
            PendingMessageState::Error => "error",
            PendingMessageState::Sent => "sent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(PendingMessageState::Queued),
            "uploading" => Some(PendingMessageState::Uploading),
            "error" => Some(PendingMessageState::Error),
            "sent" => Some(PendingMessageState::Sent),
            _ => None,
        }
    }

    /// `Sent` is terminal; `Error` only goes back to `Queued` on retry.
    pub fn can_transition_to(&self, next: PendingMessageState) -> bool {
        use PendingMessageState::*;

        matches!(
            (self, next),
            (Queued, Uploading)
                | (Queued, Error)
                | (Queued, Sent)
                | (Uploading, Error)
                | (Uploading, Sent)
                | (Error, Queued)
        )
    }

    pub fn transition(
        self,
        next: PendingMessageState,
    ) -> Result<PendingMessageState, PendingTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PendingTransitionError {
                from: self,
                to: next,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pending message cannot move from {} to {}", .from.as_str(), .to.as_str())]
pub struct PendingTransitionError {
    pub from: PendingMessageState,
    pub to: PendingMessageState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    pub id: i64,
    pub chat_id: i64,
    pub state: PendingMessageState,
    /// Correlates the pending row with the transfer uploading its file.
    pub transfer_tag: Option<i32>,
    pub file_path: Option<String>,
    pub timestamp: i64,
}

/// Data needed to queue a new pending message; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPendingMessage {
    pub chat_id: i64,
    pub file_path: Option<String>,
    pub timestamp: i64,
}
