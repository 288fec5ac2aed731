use std::sync::Mutex;

use localchat_cli::calc::INVALID_FORMAT;
use localchat_cli::memory::ChatHistory;
use localchat_cli::prompt::{CONTEXT_INSTRUCTION, NO_DOCS_NOTE};
use localchat_cli::session::{ChatSession, Command, Reply};
use localchat_core::config::Settings;
use localchat_core::error::{Error, Result};
use localchat_core::traits::{Completion, Retriever};
use localchat_core::types::{ChatMessage, Role, ScoredUnit};
use localchat_text::{IndexOptions, LazyIndex};

/// Echoes the last user message and records what it was sent.
#[derive(Default)]
struct Echo {
    seen: Mutex<Vec<(String, usize)>>,
}

impl Completion for Echo {
    fn name(&self) -> &str { "echo" }

    fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
        self.seen.lock().unwrap().push((system_prompt.to_string(), messages.len()));
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        Ok(format!("echo: {last}"))
    }
}

struct Down;

impl Completion for Down {
    fn name(&self) -> &str { "down" }

    fn complete(&self, _system_prompt: &str, _messages: &[ChatMessage]) -> Result<String> {
        Err(Error::ProviderUnavailable("connection refused".to_string()))
    }
}

struct Fixed(Vec<ScoredUnit>);

impl Retriever for Fixed {
    fn top_k(&self, _query: &str, k: usize) -> Vec<ScoredUnit> { self.0.iter().take(k).cloned().collect() }
}

fn hit(id: &str, text: &str, score: f32) -> ScoredUnit { ScoredUnit { id: id.to_string(), text: text.to_string(), score } }

fn history_in(dir: &tempfile::TempDir) -> ChatHistory { ChatHistory::load(dir.path().join("memory.json")) }

#[test]
fn commands_are_recognised_exactly() {
    assert_eq!(Command::parse(":reset"), Some(Command::Reset));
    assert_eq!(Command::parse(":rag on"), Some(Command::RagOn));
    assert_eq!(Command::parse(":rag off"), Some(Command::RagOff));
    assert_eq!(Command::parse(":rag maybe"), None);
    assert_eq!(Command::parse("reset"), None);
}

#[test]
fn plain_turn_is_sent_and_saved() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let mut session = ChatSession::new(Echo::default(), Fixed(vec![]), history_in(&tmp), &settings);

    assert_eq!(session.handle("   "), Reply::Nothing);
    assert_eq!(session.handle("hello there\n"), Reply::Assistant("echo: hello there".to_string()));
    assert_eq!(session.history().len(), 2);

    let reloaded = ChatHistory::load(tmp.path().join("memory.json"));
    assert_eq!(reloaded.messages()[0], ChatMessage::user("hello there"));
    assert_eq!(reloaded.messages()[1].role, Role::Assistant);
}

#[test]
fn system_prompt_and_full_history_reach_the_provider() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let echo = Echo::default();
    let mut session = ChatSession::new(&echo, Fixed(vec![]), history_in(&tmp), &settings);
    session.handle("one");
    session.handle("two");
    let seen = echo.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, settings.chat.system_prompt);
    assert_eq!(seen[0].1, 1);
    assert_eq!(seen[1].1, 3);
}

#[test]
fn rag_toggle_controls_augmentation() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let retriever = Fixed(vec![hit("notes.md#p2", "Paragraph two about cats.", 0.8)]);
    let mut session = ChatSession::new(Echo::default(), retriever, history_in(&tmp), &settings);

    assert!(!session.rag_enabled());
    assert!(matches!(session.handle(":rag on"), Reply::Notice(_)));
    assert!(session.rag_enabled());

    let Reply::Assistant(reply) = session.handle("cats?") else { panic!("expected an assistant reply") };
    assert!(reply.contains(CONTEXT_INSTRUCTION));
    assert!(reply.contains("[1] notes.md#p2: Paragraph two about cats."));
    assert!(reply.ends_with("QUESTION:\ncats?"));

    session.handle(":rag off");
    assert_eq!(session.handle("cats?"), Reply::Assistant("echo: cats?".to_string()));
}

#[test]
fn rag_with_no_hits_adds_note() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = ChatSession::new(Echo::default(), Fixed(vec![]), history_in(&tmp), &Settings::default());
    session.set_rag(true);
    assert_eq!(session.handle("anything"), Reply::Assistant(format!("echo: anything\n\n{NO_DOCS_NOTE}")));
}

#[test]
fn calculator_bypasses_provider_and_history() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = ChatSession::new(Down, Fixed(vec![]), history_in(&tmp), &Settings::default());
    assert_eq!(session.handle("calc: 2+2*3"), Reply::Tool("Result: 8".to_string()));
    assert_eq!(session.handle("CALC: rm -rf"), Reply::Tool(INVALID_FORMAT.to_string()));
    assert!(session.history().is_empty());
    assert!(!tmp.path().join("memory.json").exists());
}

#[test]
fn provider_failure_drops_pending_message() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = ChatSession::new(Down, Fixed(vec![]), history_in(&tmp), &Settings::default());
    let reply = session.handle("are you there?");
    assert!(matches!(reply, Reply::Failed(ref msg) if msg.contains("connection refused")), "{reply:?}");
    assert!(session.history().is_empty());
}

#[test]
fn reset_clears_and_saves() {
    let tmp = tempfile::tempdir().unwrap();
    let mut session = ChatSession::new(Echo::default(), Fixed(vec![]), history_in(&tmp), &Settings::default());
    session.handle("remember me");
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.handle(":reset"), Reply::Notice("Memory cleared.".to_string()));
    assert!(session.history().is_empty());
    assert!(ChatHistory::load(tmp.path().join("memory.json")).is_empty());
}

#[test]
fn session_over_lazy_index_retrieves_from_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("notes.md"), "Paragraph one.\n\nParagraph two about cats.").unwrap();

    let mut settings = Settings::default();
    settings.rag.docs_dir = docs;
    settings.rag.index_dir = tmp.path().join("index");
    let index = LazyIndex::new(IndexOptions::from_settings(&settings));
    let mut session = ChatSession::new(Echo::default(), &index, history_in(&tmp), &settings);

    session.handle("no retrieval yet");
    assert!(!index.is_ready(), "index stays untouched while RAG is off");

    session.set_rag(true);
    let Reply::Assistant(reply) = session.handle("cats") else { panic!("expected an assistant reply") };
    assert!(index.is_ready());
    assert!(reply.contains("[1] notes.md#p2: Paragraph two about cats."), "{reply}");
    assert!(tmp.path().join("index").join("tfidf_units.json").is_file());
}
