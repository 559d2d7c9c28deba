//! History-aware retrieval chain
//!
//! Couples the embedder, vector store, and chat model into the
//! two-step conversational flow: reformulate the question against the
//! session history, retrieve the closest chunks, then answer inside
//! that context only.

use crate::embed::Embedder;
use crate::error::Result;
use crate::llm::{ChatMessage, ChatModel};
use crate::store::{ScoredChunk, VectorStore};
use std::sync::Arc;
use tracing::debug;

/// System prompt for rewriting a follow-up question into a standalone one
pub const CONTEXTUALIZE_SYSTEM_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, formulate a standalone question which can be \
understood without the chat history. Do NOT answer the question, just reformulate it if needed \
and otherwise return it as is.";

/// System prompt for the grounded answer; `{context}` is replaced with
/// the retrieved chunks
pub const ANSWER_SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. If you don't know the \
answer, just say that you don't know. Use three sentences maximum and keep the answer concise.\n\n\
Context: {context}";

/// One chain invocation's result
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub answer: String,
    pub context: Vec<ScoredChunk>,
}

/// A ready-to-invoke retrieval chain
pub struct RetrievalChain {
    embedder: Arc<dyn Embedder>,
    store: Arc<VectorStore>,
    llm: Arc<dyn ChatModel>,
    top_k: usize,
}

impl std::fmt::Debug for RetrievalChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalChain")
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

impl RetrievalChain {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<VectorStore>,
        llm: Arc<dyn ChatModel>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            top_k,
        }
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Answer a question against the indexed documents
    pub async fn ask(&self, question: &str, history: &[ChatMessage]) -> Result<ChainOutput> {
        let standalone = self.reformulate(question, history).await?;
        debug!("Standalone query: {}", standalone);

        let query_vector = self.embedder.embed_query(&standalone).await?;
        let context = self.store.search(query_vector, self.top_k).await?;
        debug!("Retrieved {} context chunks", context.len());

        let answer = self.answer(question, history, &context).await?;
        Ok(ChainOutput { answer, context })
    }

    /// Rewrite a follow-up question into a standalone query
    ///
    /// With no history there is nothing to resolve, so the question
    /// passes through without an LLM round trip. The rewritten query is
    /// internal only and never shown to the user.
    async fn reformulate(&self, question: &str, history: &[ChatMessage]) -> Result<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(CONTEXTUALIZE_SYSTEM_PROMPT));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(question));

        self.llm.complete(&messages).await
    }

    async fn answer(
        &self,
        question: &str,
        history: &[ChatMessage],
        context: &[ScoredChunk],
    ) -> Result<String> {
        let system = ANSWER_SYSTEM_PROMPT.replace("{context}", &format_context(context));

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(question));

        self.llm.complete(&messages).await
    }
}

/// Stuff retrieved chunks into a single context block
pub fn format_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.payload.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
