//! Named prompt templates stored as `<prompts_dir>/<name>.txt`

use crate::config::AppConfig;
use crate::error::{AiItError, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PromptStore {
    dir: PathBuf,
}

impl PromptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.prompts_dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", name))
    }

    /// Load a template, trimmed. A missing template is a configuration error.
    pub fn load(&self, name: &str) -> Result<String> {
        let path = self.path_for(name);
        let text = fs::read_to_string(&path).map_err(|e| {
            AiItError::ConfigError(format!(
                "Prompt template '{}' could not be read from {}: {}",
                name,
                path.display(),
                e
            ))
        })?;
        Ok(text.trim().to_string())
    }
}
