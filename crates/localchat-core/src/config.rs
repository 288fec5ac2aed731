//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `LOCALCHAT_*` env vars (`__` separates nested keys). Paths are expanded
//! for `~` and `${VAR}` once, at load time.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::loader::DEFAULT_EXTENSIONS;

pub const ENV_PREFIX: &str = "LOCALCHAT_";

/// Longest word n-gram accepted in `tfidf.ngram_range`.
pub const MAX_NGRAM: usize = 8;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub rag: RagConfig,
    pub tfidf: TfidfConfig,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub docs_dir: PathBuf,
    pub index_dir: PathBuf,
    pub extensions: Vec<String>,
    pub top_k: usize,
    pub preview_chars: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("data/docs"),
            index_dir: PathBuf::from("data"),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            top_k: 4,
            preview_chars: 200,
        }
    }
}

/// Document-frequency threshold: an absolute document count or a proportion
/// of the corpus. Integers in TOML select `Count`, floats select `Proportion`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocFrequency {
    Count(usize),
    Proportion(f64),
}

impl DocFrequency {
    /// Threshold expressed as a document count for a corpus of `n_docs`.
    pub fn as_count(self, n_docs: usize) -> f64 {
        match self {
            DocFrequency::Count(c) => c as f64,
            DocFrequency::Proportion(p) => p * n_docs as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StopWords {
    #[default]
    None,
    English,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfidfConfig {
    pub ngram_range: (usize, usize),
    pub max_df: DocFrequency,
    pub min_df: DocFrequency,
    pub stop_words: StopWords,
    pub sublinear_tf: bool,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 2),
            max_df: DocFrequency::Proportion(0.9),
            min_df: DocFrequency::Count(1),
            stop_words: StopWords::None,
            sublinear_tf: false,
        }
    }
}

impl TfidfConfig {
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = self.ngram_range;
        if lo == 0 || lo > hi || hi > MAX_NGRAM {
            return Err(Error::InvalidConfig(format!(
                "tfidf.ngram_range must satisfy 1 <= min <= max <= {}, got ({}, {})",
                MAX_NGRAM, lo, hi
            )));
        }
        for (key, df) in [("max_df", self.max_df), ("min_df", self.min_df)] {
            if let DocFrequency::Proportion(p) = df {
                if !(p > 0.0 && p <= 1.0) {
                    return Err(Error::InvalidConfig(format!("tfidf.{} proportion must be in (0, 1], got {}", key, p)));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub openai_model: String,
    pub openai_base_url: String,
    /// Falls back to `OPENAI_API_KEY` when unset.
    pub openai_api_key: Option<String>,
    pub ollama_model: String,
    pub ollama_host: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_api_key: None,
            ollama_model: "llama3.1".to_string(),
            ollama_host: "http://localhost:11434".to_string(),
            temperature: 0.4,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub memory_path: PathBuf,
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            memory_path: PathBuf::from("memory.json"),
            system_prompt: "You are a helpful, direct and practical assistant. \
                When you use cited CONTEXT, reference [n] and the file. \
                If you don't know something, say so and suggest how to find out."
                .to_string(),
        }
    }
}

impl Settings {
    /// Load using `RUST_ENV` (default `dev`) to pick the overlay file.
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> { Self::from_figment(Self::figment(env_name)) }

    pub fn figment(env_name: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let mut settings: Settings = figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        settings.rag.docs_dir = expand_path(settings.rag.docs_dir.to_string_lossy());
        settings.rag.index_dir = expand_path(settings.rag.index_dir.to_string_lossy());
        settings.chat.memory_path = expand_path(settings.chat.memory_path.to_string_lossy());
        Ok(settings)
    }

    /// Anchor relative paths at `base` (e.g. the directory holding the config).
    pub fn resolve_paths(&mut self, base: &Path) {
        self.rag.docs_dir = resolve_with_base(base, self.rag.docs_dir.to_string_lossy());
        self.rag.index_dir = resolve_with_base(base, self.rag.index_dir.to_string_lossy());
        self.chat.memory_path = resolve_with_base(base, self.chat.memory_path.to_string_lossy());
    }

    pub fn validate(&self) -> Result<()> {
        self.tfidf.validate()?;
        if self.rag.preview_chars == 0 {
            return Err(Error::InvalidConfig("rag.preview_chars must be positive".to_string()));
        }
        if self.rag.extensions.is_empty() {
            return Err(Error::InvalidConfig("rag.extensions must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
