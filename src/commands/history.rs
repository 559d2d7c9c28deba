//! History command implementation

use crate::error::Result;
use crate::logstore::{ChatLogEntry, LogStore};
use tracing::info;

/// Fetch the full transcript of a session
pub async fn cmd_history(logs: &LogStore, session_id: &str) -> Result<Vec<ChatLogEntry>> {
    info!("Fetching history for session {}", session_id);
    logs.session_entries(session_id).await
}

/// Print a session transcript to console
pub fn print_history(session_id: &str, entries: &[ChatLogEntry]) {
    println!("\n💬 Session {}\n", session_id);

    if entries.is_empty() {
        println!("No turns logged for this session.");
        return;
    }

    for entry in entries {
        println!("[{}] you: {}", entry.created_at, entry.user_query);
        println!("{}: {}", entry.model, entry.model_response);
        println!();
    }
}
