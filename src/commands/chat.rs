//! Ask and chat command implementations

use crate::error::Result;
use crate::logstore::LogStore;
use crate::resources::{ChainKey, Resources};
use crate::workflow;
use std::io::{BufRead, Write};
use tracing::info;
use uuid::Uuid;

/// One answered question
#[derive(Debug)]
pub struct AskOutcome {
    pub session_id: String,
    pub answer: String,
}

/// Answer a single question, continuing the session when one is given
pub async fn cmd_ask(
    logs: &LogStore,
    resources: &Resources,
    question: &str,
    session: Option<String>,
) -> Result<AskOutcome> {
    let session_id = session.unwrap_or_else(new_session_id);
    info!("Asking in session {}", session_id);

    let key = ChainKey::from_config(resources.config())?;
    let answer = workflow::chat_turn(logs, resources, &key, &session_id, question).await?;

    Ok(AskOutcome { session_id, answer })
}

/// Run an interactive chat loop on stdin until EOF or 'exit'
pub async fn cmd_chat(
    logs: &LogStore,
    resources: &Resources,
    session: Option<String>,
) -> Result<()> {
    let session_id = session.unwrap_or_else(new_session_id);
    let key = ChainKey::from_config(resources.config())?;

    println!("Chat session {} (type 'exit' to quit)\n", session_id);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        match workflow::chat_turn(logs, resources, &key, &session_id, question).await {
            Ok(answer) => println!("\n{}\n", answer),
            Err(e) => eprintln!("\n✗ {}\n", e),
        }
    }

    println!("Session saved as {}", session_id);
    Ok(())
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Print a single answer to console
pub fn print_answer(outcome: &AskOutcome) {
    println!("{}", outcome.answer);
    println!("\n(session {})", outcome.session_id);
}
