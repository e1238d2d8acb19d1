use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;

use crate::error::AppError;

/// Send a prompt to a hosted Gemini model and dump the response to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "promptdump", version, about)]
pub struct Cli {
    /// API key for the model service (falls back to GOOGLE_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Inline prompt text
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Path to a file containing the prompt text
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Comma-separated list of text files appended to the prompt
    #[arg(long, value_name = "PATHS")]
    pub enclose_files_as_prompt: Option<String>,

    /// Print the constructed prompt and exit without querying the model
    #[arg(long)]
    pub print_prompt_only: bool,

    /// Model name (overrides MODEL)
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Path the response text is written to
    #[arg(long, value_name = "PATH")]
    pub dump_to: Option<PathBuf>,
}

pub enum ParseOutcome {
    Run(Cli),
    /// `--help` or `--version`; the rendered text is ready to print.
    Exit(String),
}

pub fn parse_from<I, T>(args: I) -> Result<ParseOutcome, AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(ParseOutcome::Run(cli)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            Ok(ParseOutcome::Exit(err.to_string()))
        }
        Err(err) => Err(AppError::config(clap_message(&err.to_string()))),
    }
}

fn clap_message(rendered: &str) -> String {
    let trimmed = rendered.trim_end();
    trimmed.strip_prefix("error: ").unwrap_or(trimmed).to_string()
}
