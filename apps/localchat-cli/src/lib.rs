//! Chat loop building blocks: command handling, the calculator tool, prompt
//! augmentation with retrieved paragraphs, and the persisted history.
pub mod calc;
pub mod memory;
pub mod prompt;
pub mod session;

use std::path::PathBuf;

use clap::Args;
use tracing_subscriber::EnvFilter;

use localchat_core::config::{expand_path, Settings};

/// Log to stderr; `RUST_LOG` overrides `default_directive`.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Flags shared by every binary for locating config and data.
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Config overlay to merge (dev, prod, test); defaults to $RUST_ENV or dev
    #[arg(long = "config-env")]
    pub config_env: Option<String>,
    /// Directory holding the .txt/.md corpus
    #[arg(long)]
    pub docs_dir: Option<PathBuf>,
    /// Directory holding the persisted TF-IDF index
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

impl CommonArgs {
    pub fn load_settings(&self) -> localchat_core::Result<Settings> {
        let mut settings = match &self.config_env {
            Some(env) => Settings::load_for_env(env)?,
            None => Settings::load()?,
        };
        self.apply_overrides(&mut settings);
        Ok(settings)
    }

    /// Flag paths get the same `~`/`$VAR` expansion as config-file paths.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(dir) = &self.docs_dir { settings.rag.docs_dir = expand_path(dir.to_string_lossy()); }
        if let Some(dir) = &self.index_dir { settings.rag.index_dir = expand_path(dir.to_string_lossy()); }
    }
}
