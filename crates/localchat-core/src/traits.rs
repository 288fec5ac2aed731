use crate::error::Result;
use crate::types::{ChatMessage, ScoredUnit};

/// Ranked paragraph lookup. Never fails: an empty or unusable index yields
/// an empty result.
pub trait Retriever: Send + Sync {
    fn top_k(&self, query: &str, k: usize) -> Vec<ScoredUnit>;
}

/// Opaque text completion backend.
pub trait Completion: Send + Sync {
    fn name(&self) -> &str;
    fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String>;
}

impl<T: Retriever + ?Sized> Retriever for &T {
    fn top_k(&self, query: &str, k: usize) -> Vec<ScoredUnit> { (**self).top_k(query, k) }
}

impl<T: Completion + ?Sized> Completion for &T {
    fn name(&self) -> &str { (**self).name() }
    fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
        (**self).complete(system_prompt, messages)
    }
}

impl<T: Completion + ?Sized> Completion for Box<T> {
    fn name(&self) -> &str { (**self).name() }
    fn complete(&self, system_prompt: &str, messages: &[ChatMessage]) -> Result<String> {
        (**self).complete(system_prompt, messages)
    }
}
