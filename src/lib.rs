//! ragchat: chat with your documents from the terminal
//!
//! Upload PDF, DOCX, or HTML files, index them into Qdrant with Nomic
//! embeddings, and ask questions answered by a Groq-hosted model
//! grounded in the retrieved chunks.

pub mod cache;
pub mod chain;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod logstore;
pub mod resources;
pub mod store;
pub mod workflow;
