use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::PromptSource;
use crate::error::{AppError, Result};

const MAX_TEXT_TOKENS: usize = 1_000_000;
const AVG_CHARS_PER_TOKEN: usize = 4;
pub const MAX_PROMPT_CHARS: usize = MAX_TEXT_TOKENS * AVG_CHARS_PER_TOKEN;

/// Builds the final prompt: the primary source followed by each enclosed file.
pub fn build_prompt(source: &PromptSource, enclosures: &[PathBuf]) -> Result<String> {
    let mut prompt = read_source(source)?;

    for path in enclosures {
        let content = read_enclosure(path)?;
        debug!(path = %path.display(), bytes = content.len(), "enclosing file in prompt");
        prompt.push_str(&format!("\n# {}\n{}\n", path.display(), content));
    }

    let chars = prompt.chars().count();
    if chars > MAX_PROMPT_CHARS {
        return Err(AppError::config(format!(
            "prompt size ({chars} chars) exceeds the limit of {MAX_PROMPT_CHARS} chars"
        )));
    }

    Ok(prompt)
}

pub fn read_source(source: &PromptSource) -> Result<String> {
    match source {
        PromptSource::Inline(text) => Ok(strip_trailing_newline(text).to_string()),
        PromptSource::File(path) => read_prompt_file(path),
    }
}

fn strip_trailing_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

fn read_prompt_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| AppError::input(path, err))
}

fn read_enclosure(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|err| AppError::input(path, err))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
