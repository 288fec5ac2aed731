//! One chat turn at a time: commands, the calculator tool, retrieval and
//! the completion call, with the history saved after each exchange.

use tracing::{debug, warn};

use localchat_core::config::Settings;
use localchat_core::traits::{Completion, Retriever};
use localchat_core::types::ChatMessage;

use crate::calc::try_calculator;
use crate::memory::ChatHistory;
use crate::prompt::augment;

/// Inputs that never reach the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Reset,
    RagOn,
    RagOff,
}

impl Command {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            ":reset" => Some(Command::Reset),
            ":rag on" => Some(Command::RagOn),
            ":rag off" => Some(Command::RagOff),
            _ => None,
        }
    }
}

/// What the loop should show for one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Nothing,
    Notice(String),
    Tool(String),
    Assistant(String),
    Failed(String),
}

pub struct ChatSession<C: Completion, R: Retriever> {
    provider: C,
    retriever: R,
    history: ChatHistory,
    system_prompt: String,
    rag: bool,
    top_k: usize,
    preview_chars: usize,
}

impl<C: Completion, R: Retriever> ChatSession<C, R> {
    pub fn new(provider: C, retriever: R, history: ChatHistory, settings: &Settings) -> Self {
        Self {
            provider,
            retriever,
            history,
            system_prompt: settings.chat.system_prompt.clone(),
            rag: false,
            top_k: settings.rag.top_k,
            preview_chars: settings.rag.preview_chars,
        }
    }

    pub fn set_rag(&mut self, on: bool) { self.rag = on; }

    pub fn rag_enabled(&self) -> bool { self.rag }

    pub fn history(&self) -> &ChatHistory { &self.history }

    pub fn provider_name(&self) -> &str { self.provider.name() }

    pub fn handle(&mut self, line: &str) -> Reply {
        let input = line.trim();
        if input.is_empty() { return Reply::Nothing; }

        if let Some(cmd) = Command::parse(input) {
            return self.run_command(cmd);
        }
        if let Some(result) = try_calculator(input) {
            return Reply::Tool(result);
        }

        let content = self.compose(input);
        self.history.push(ChatMessage::user(content));
        match self.provider.complete(&self.system_prompt, self.history.messages()) {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.clone()));
                self.persist();
                Reply::Assistant(reply)
            }
            Err(e) => {
                self.history.pop();
                warn!(provider = self.provider.name(), error = %e, "completion failed");
                Reply::Failed(e.to_string())
            }
        }
    }

    fn run_command(&mut self, cmd: Command) -> Reply {
        match cmd {
            Command::Reset => {
                self.history.clear();
                self.persist();
                Reply::Notice("Memory cleared.".to_string())
            }
            Command::RagOn => {
                self.rag = true;
                Reply::Notice("RAG enabled (reading local documents).".to_string())
            }
            Command::RagOff => {
                self.rag = false;
                Reply::Notice("RAG disabled.".to_string())
            }
        }
    }

    fn compose(&self, input: &str) -> String {
        if !self.rag { return input.to_string(); }
        let hits = self.retriever.top_k(input, self.top_k);
        debug!(hits = hits.len(), "retrieved context");
        augment(input, &hits, self.preview_chars)
    }

    fn persist(&self) {
        if let Err(e) = self.history.save() {
            warn!(path = %self.history.path().display(), error = %e, "failed to save chat history");
        }
    }
}
