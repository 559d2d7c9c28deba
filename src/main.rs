//! ragchat CLI entry point

use clap::{Parser, Subcommand};
use ragchat::{
    commands::{
        cmd_ask, cmd_chat, cmd_history, cmd_init, cmd_list_documents, cmd_remove, cmd_status,
        cmd_upload, print_answer, print_delete_report, print_documents, print_history,
        print_init_summary, print_status, print_upload_report,
    },
    config::Config,
    error::Result,
    logstore::LogStore,
    resources::Resources,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(version, about = "Chat with your documents: upload, index, ask", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize ragchat configuration and database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Upload and index a document (.pdf, .docx, .html)
    Upload {
        /// Path to the file to upload
        path: PathBuf,
    },

    /// List indexed documents
    Docs,

    /// Delete a document from the index and the registry
    Remove {
        /// Document id (use 'ragchat docs' to list)
        id: i64,
    },

    /// Ask a single question
    Ask {
        /// The question
        question: String,

        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start an interactive chat session
    Chat {
        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Show the transcript of a session
    History {
        /// Session id
        session_id: String,
    },

    /// Show system status
    Status,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Init runs before any config exists
    if let Commands::Init { force } = cli.command {
        let base_dir = cli.config.as_deref().and_then(|p| {
            if p.extension().is_some() {
                p.parent().map(PathBuf::from)
            } else {
                Some(p.to_path_buf())
            }
        });
        let config = cmd_init(base_dir, force).await?;
        print_init_summary(&config);
        return Ok(());
    }

    let config = Config::load_or_default_path(cli.config.as_deref())?;
    let logs = LogStore::connect(&config.paths.db_file).await?;
    logs.init_schema().await?;
    let resources = Resources::new(config);

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Upload { path } => {
            let report = cmd_upload(&logs, &resources, &path).await?;
            print_upload_report(&report);
            if !report.succeeded() {
                std::process::exit(1);
            }
        }

        Commands::Docs => {
            let documents = cmd_list_documents(&logs).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&documents)?);
            } else {
                print_documents(&documents);
            }
        }

        Commands::Remove { id } => {
            let report = cmd_remove(&logs, &resources, id).await?;
            print_delete_report(&report);
            if !report.succeeded() {
                std::process::exit(1);
            }
        }

        Commands::Ask { question, session } => {
            let outcome = cmd_ask(&logs, &resources, &question, session).await?;
            print_answer(&outcome);
        }

        Commands::Chat { session } => {
            cmd_chat(&logs, &resources, session).await?;
        }

        Commands::History { session_id } => {
            let entries = cmd_history(&logs, &session_id).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_history(&session_id, &entries);
            }
        }

        Commands::Status => {
            let status = cmd_status(resources.config(), &logs).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}
