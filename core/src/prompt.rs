//! Prompt file loading

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{AgentError, Result};

pub const DEFAULT_PROMPT_FILE: &str = "prompt.txt";

/// Read and trim the prompt at `path`
pub fn load_prompt(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(AgentError::PromptFileMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    let prompt = raw.trim();
    if prompt.is_empty() {
        return Err(AgentError::PromptFileEmpty {
            path: path.to_path_buf(),
        });
    }
    Ok(prompt.to_string())
}
