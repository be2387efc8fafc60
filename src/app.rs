use std::{path::Path, sync::Arc};

use anyhow::Result;
use chrono::DateTime;

use crate::{
    cli::{Cli, Command},
    domain::{
        self,
        message::TypedMessage,
        paging::LoadType,
        pending::PendingMessage,
    },
    infra, sdk,
    sdk::fixture::{FixtureHistory, HistoryFixture},
    storage,
    usecases::{
        self, bootstrap,
        context::AppContext,
        contracts::MessageStore,
        load_messages::{load_messages, LoadMessagesQuery},
        remote_mediator::MediatorResult,
    },
};

const SYNC_PAGE_FAILED: &str = "SYNC_PAGE_FAILED";

pub fn run(cli: Cli) -> Result<()> {
    let (context, _log_guard) = bootstrap::bootstrap(cli.config.as_deref())?;

    tracing::debug!(
        domain = domain::module_name(),
        sdk = sdk::module_name(),
        storage = storage::module_name(),
        usecases = usecases::module_name(),
        infra = infra::module_name(),
        "module boundaries loaded"
    );

    match cli.command {
        Command::Sync {
            chat,
            history,
            pages,
        } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let report = runtime.block_on(sync_chat(&context, chat, &history, pages))?;

            println!(
                "chat {chat}: {} loads, {} messages cached, history {}",
                report.loads,
                report.cached,
                if report.end_reached {
                    "fully loaded"
                } else {
                    "has older messages"
                }
            );
            if let Some(error) = report.error {
                eprintln!("last load failed: {error}");
            }
        }
        Command::Show {
            chat,
            offset,
            limit,
        } => {
            let page = load_messages(
                context.store.as_ref(),
                LoadMessagesQuery {
                    chat_id: chat,
                    offset,
                    limit,
                },
            )?;

            for message in &page.items {
                println!("{}", format_message_line(message));
            }
            if let Some(next) = page.next_key {
                println!("-- more: --offset {next}");
            }
        }
        Command::Clear { chat } => {
            context.store.clear_chat_messages(chat)?;
            println!("chat {chat}: cached history cleared");
        }
        Command::Pending { chat } => {
            for pending in context.pending_messages().list(chat)? {
                println!("{}", format_pending_line(&pending));
            }
        }
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub loads: usize,
    pub cached: usize,
    pub end_reached: bool,
    pub error: Option<String>,
}

/// Refreshes `chat_id` from a history file and appends up to `pages` older pages.
/// A failed load stops the sync; it is reported, not returned as an error.
pub async fn sync_chat(
    context: &AppContext,
    chat_id: i64,
    history_path: &Path,
    pages: usize,
) -> Result<SyncReport> {
    let fixture = HistoryFixture::load(history_path).map_err(infra::error::AppError::from)?;
    let engine = Arc::new(FixtureHistory::new(fixture, context.config.fixture.batch_size));
    let mediator = context.mediator_for(chat_id, engine.my_handle(), engine);
    let paging = context.paging_state();

    let mut report = SyncReport {
        loads: 0,
        cached: 0,
        end_reached: false,
        error: None,
    };

    let mut load_type = LoadType::Refresh;
    while report.loads <= pages {
        report.loads += 1;
        match mediator.load(load_type, &paging).await {
            MediatorResult::Success {
                end_of_pagination_reached,
            } => report.end_reached = end_of_pagination_reached,
            MediatorResult::Error(error) => {
                tracing::warn!(
                    code = SYNC_PAGE_FAILED,
                    chat_id,
                    load_type = load_type.as_str(),
                    error = %error,
                    "sync stopped after failed load"
                );
                report.error = Some(error.to_string());
                break;
            }
        }

        if report.end_reached {
            break;
        }
        load_type = LoadType::Append;
    }

    report.cached = context.store.message_count(chat_id)?;
    Ok(report)
}

pub fn format_message_line(message: &TypedMessage) -> String {
    let time = DateTime::from_timestamp(message.timestamp, 0)
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| message.timestamp.to_string());
    let sender = if message.is_mine {
        "me".to_owned()
    } else {
        message.user_handle.to_string()
    };
    let mut flags = String::new();
    if message.is_edited {
        flags.push_str(" (edited)");
    }
    if !message.exists {
        flags.push_str(" (unavailable)");
    }
    if !message.reactions.is_empty() {
        let reactions: Vec<String> = message
            .reactions
            .iter()
            .map(|reaction| format!("{}x{}", reaction.reaction, reaction.count))
            .collect();
        flags.push_str(&format!(" [{}]", reactions.join(" ")));
    }

    format!(
        "{time} #{} {sender}: {}{flags}",
        message.msg_id,
        message.display_content()
    )
}

pub fn format_pending_line(pending: &PendingMessage) -> String {
    let tag = pending
        .transfer_tag
        .map(|tag| format!(" transfer={tag}"))
        .unwrap_or_default();

    format!(
        "pending #{} {}{tag} {}",
        pending.id,
        pending.state.as_str(),
        pending.file_path.as_deref().unwrap_or("-")
    )
}
