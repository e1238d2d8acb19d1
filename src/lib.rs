pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model_gateway;
pub mod output;
pub mod prompt;
pub mod providers;

use anyhow::{Context, Result};
use reqwest::Client;
use std::env;
use std::ffi::OsString;
use std::io;
use std::time::Duration;
use tracing::info;

use cli::ParseOutcome;
use config::{BUILTIN_API_KEY, Config, Invocation};
use model_gateway::GeminiClient;

pub use error::AppError;

/// Runs one invocation. The caller is expected to have loaded `.env` and installed logging.
pub async fn run() -> Result<()> {
    run_with_args(env::args_os()).await
}

pub async fn run_with_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match cli::parse_from(args)? {
        ParseOutcome::Run(cli) => cli,
        ParseOutcome::Exit(text) => {
            print!("{text}");
            return Ok(());
        }
    };

    let cfg = Config::from_env().with_model_override(cli.model.as_deref());
    info!(
        model = %cfg.model,
        model_base_url = %cfg.model_base_url,
        model_timeout_secs = ?cfg.model_timeout_secs,
        "loaded runtime configuration"
    );

    let invocation = Invocation::resolve(cli, &cfg, BUILTIN_API_KEY)?;

    let mut builder = Client::builder();
    if let Some(secs) = cfg.model_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    let client = builder
        .build()
        .context("Failed to initialize HTTP client")?;
    let gateway = GeminiClient::new(&client, &cfg);

    let mut stdout = io::stdout().lock();
    app::execute(&invocation, &gateway, &mut stdout).await?;
    Ok(())
}
