use reqwest::Client;
use std::future::Future;
use std::pin::Pin;

use crate::config::{Config, Credential};
use crate::error::Result;
use crate::providers;

pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String>> + 'a>>;

/// The remote model boundary: one prompt in, generated text out.
///
/// Implementations fail with `AppError::Auth`, `AppError::Network` or `AppError::Api`.
pub trait ModelClient {
    fn model_name(&self) -> &str;

    fn generate<'a>(&'a self, prompt: &'a str, credential: &'a Credential) -> GenerateFuture<'a>;
}

pub struct GeminiClient<'a> {
    client: &'a Client,
    cfg: &'a Config,
}

impl<'a> GeminiClient<'a> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self { client, cfg }
    }
}

impl ModelClient for GeminiClient<'_> {
    fn model_name(&self) -> &str {
        &self.cfg.model
    }

    fn generate<'a>(&'a self, prompt: &'a str, credential: &'a Credential) -> GenerateFuture<'a> {
        Box::pin(providers::gemini::generate(
            self.client,
            self.cfg,
            prompt,
            credential,
        ))
    }
}
