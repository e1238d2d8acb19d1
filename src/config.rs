use std::env;
use std::fmt;
use std::path::PathBuf;

use tracing::warn;

use crate::cli::Cli;
use crate::error::{AppError, Result};

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_MODEL_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Fallback key baked in at build time. Using it is discouraged and warned about.
pub const BUILTIN_API_KEY: Option<&str> = option_env!("PROMPTDUMP_BUILTIN_API_KEY");

#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub model_base_url: String,
    pub model_timeout_secs: Option<u64>,
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            model: non_blank(get_var("MODEL")).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_base_url: non_blank(get_var("MODEL_BASE_URL"))
                .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string()),
            model_timeout_secs: parse_model_timeout_secs(get_var("MODEL_TIMEOUT_SECS").as_deref()),
            api_key: non_blank(get_var("GOOGLE_API_KEY")),
        }
    }

    pub fn with_model_override(mut self, model: Option<&str>) -> Self {
        if let Some(model) = model.map(str::trim).filter(|model| !model.is_empty()) {
            self.model = model.to_string();
        }
        self
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

fn parse_model_timeout_secs(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOrigin {
    Flag,
    Environment,
    BuiltIn,
}

impl CredentialOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Environment => "environment",
            Self::BuiltIn => "built-in",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key: String,
    origin: CredentialOrigin,
}

impl Credential {
    pub fn new(key: impl Into<String>, origin: CredentialOrigin) -> Self {
        Self {
            key: key.into(),
            origin,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn origin(&self) -> CredentialOrigin {
        self.origin
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &"<redacted>")
            .field("origin", &self.origin)
            .finish()
    }
}

/// Picks the first non-blank key from the flag, the environment, then the built-in fallback.
pub fn resolve_credential(
    flag: Option<&str>,
    env_key: Option<&str>,
    builtin: Option<&str>,
) -> Option<Credential> {
    let candidates = [
        (flag, CredentialOrigin::Flag),
        (env_key, CredentialOrigin::Environment),
        (builtin, CredentialOrigin::BuiltIn),
    ];

    let credential = candidates.into_iter().find_map(|(key, origin)| {
        key.map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| Credential::new(key, origin))
    })?;

    if credential.origin() == CredentialOrigin::BuiltIn {
        warn!(
            "no --api-key or GOOGLE_API_KEY given; falling back to the built-in API key, \
             which is discouraged"
        );
    }
    Some(credential)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Inline(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub credential: Option<Credential>,
    pub prompt_source: PromptSource,
    pub enclosures: Vec<PathBuf>,
    pub output_path: PathBuf,
    pub print_prompt_only: bool,
}

impl Invocation {
    pub fn resolve(cli: Cli, cfg: &Config, builtin_key: Option<&str>) -> Result<Self> {
        let prompt_source = match (cli.prompt, cli.input) {
            (Some(_), Some(_)) => {
                return Err(AppError::config(
                    "--prompt and --input are mutually exclusive; supply only one prompt source",
                ));
            }
            (Some(prompt), None) => PromptSource::Inline(prompt),
            (None, Some(path)) => PromptSource::File(path),
            (None, None) => {
                return Err(AppError::config(
                    "no prompt source given; supply --prompt <TEXT> or --input <PATH>",
                ));
            }
        };

        let output_path = cli
            .dump_to
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| AppError::config("missing output path; supply --dump-to <PATH>"))?;

        let credential = resolve_credential(
            cli.api_key.as_deref(),
            cfg.api_key.as_deref(),
            builtin_key,
        );

        Ok(Self {
            credential,
            prompt_source,
            enclosures: parse_enclosures(cli.enclose_files_as_prompt.as_deref()),
            output_path,
            print_prompt_only: cli.print_prompt_only,
        })
    }

    pub fn require_credential(&self) -> Result<&Credential> {
        self.credential.as_ref().ok_or_else(|| {
            AppError::config("no API key available; supply --api-key or set GOOGLE_API_KEY")
        })
    }
}

fn parse_enclosures(raw: Option<&str>) -> Vec<PathBuf> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect()
}
