//! Chat history persisted as a pretty-printed JSON array of `{role, content}`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use localchat_core::error::{Error, Result};
use localchat_core::types::ChatMessage;

#[derive(Debug, Clone)]
pub struct ChatHistory {
    path: PathBuf,
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    /// Read `path`; a missing or unreadable file starts an empty history.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let messages = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring unparsable chat history");
                Vec::new()
            }),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no chat history loaded");
                Vec::new()
            }
        };
        Self { path, messages }
    }

    pub fn path(&self) -> &Path { &self.path }

    pub fn messages(&self) -> &[ChatMessage] { &self.messages }

    pub fn len(&self) -> usize { self.messages.len() }

    pub fn is_empty(&self) -> bool { self.messages.is_empty() }

    pub fn push(&mut self, message: ChatMessage) { self.messages.push(message); }

    pub fn pop(&mut self) -> Option<ChatMessage> { self.messages.pop() }

    pub fn clear(&mut self) { self.messages.clear(); }

    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| Error::io(&dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &self.messages).map_err(|e| Error::serialization(&self.path, e))?;
            writer.flush().map_err(|e| Error::io(&self.path, e))?;
        }
        tmp.persist(&self.path).map_err(|e| Error::io(&self.path, e.error))?;
        Ok(())
    }
}
