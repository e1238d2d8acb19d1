use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Config, Credential};
use crate::error::{AppError, Result};
use crate::providers::http_errors::model_api_request_error;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

fn generate_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/v1beta/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    )
}

fn vendor_error(body: &str) -> Option<ErrorBody> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error)
}

fn is_invalid_key(error: &ErrorBody) -> bool {
    let message_says_so = error
        .message
        .as_deref()
        .map(|message| message.to_ascii_lowercase().contains("api key not valid"))
        .unwrap_or(false);

    message_says_so
        || error
            .details
            .iter()
            .any(|detail| detail.get("reason").and_then(|reason| reason.as_str()) == Some("API_KEY_INVALID"))
}

/// Turns a non-success response into the matching error class.
fn classify_failure(status: StatusCode, body: &str) -> AppError {
    let vendor = vendor_error(body);
    let detail = vendor
        .as_ref()
        .and_then(|error| error.message.clone())
        .unwrap_or_else(|| body.trim().to_string());

    let rejected_key = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || (status == StatusCode::BAD_REQUEST && vendor.as_ref().is_some_and(is_invalid_key));
    if rejected_key {
        return AppError::auth(format!("model API rejected the credential ({status}): {detail}"));
    }

    match vendor.and_then(|error| error.status) {
        Some(vendor_status) => AppError::api(format!(
            "model request failed with status {status} ({vendor_status}): {detail}"
        )),
        None => AppError::api(format!("model request failed with status {status}: {detail}")),
    }
}

fn extract_text(parsed: GenerateContentResponse) -> Result<String> {
    let block_reason = parsed
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason);
    let Some(candidate) = parsed.candidates.into_iter().next() else {
        return Err(match block_reason {
            Some(reason) => AppError::api(format!("prompt was blocked by the model API: {reason}")),
            None => AppError::api("model response contained no candidates"),
        });
    };

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) => AppError::api(format!(
                "model response contained no text (finish reason: {reason})"
            )),
            None => AppError::api("model response contained no text"),
        });
    }

    Ok(text)
}

pub async fn generate(
    client: &Client,
    cfg: &Config,
    prompt: &str,
    credential: &Credential,
) -> Result<String> {
    let api_url = generate_url(&cfg.model_base_url, &cfg.model);
    let body = GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![Part { text: prompt }],
        }],
    };
    debug!(
        api_url = %api_url,
        model = %cfg.model,
        prompt_len = prompt.len(),
        credential_origin = credential.origin().as_str(),
        "sending gemini generateContent request"
    );

    let mut request = client
        .post(&api_url)
        .header(API_KEY_HEADER, credential.key())
        .json(&body);
    if let Some(secs) = cfg.model_timeout_secs {
        request = request.timeout(Duration::from_secs(secs));
    }

    let response = request.send().await.map_err(|err| {
        warn!(
            api_url = %api_url,
            model = %cfg.model,
            error = %err,
            "gemini request failed"
        );
        model_api_request_error(err, &api_url, cfg.model_timeout_secs)
    })?;

    let status = response.status();
    let response_body = response
        .text()
        .await
        .map_err(|err| model_api_request_error(err, &api_url, cfg.model_timeout_secs))?;

    if !status.is_success() {
        warn!(
            api_url = %api_url,
            model = %cfg.model,
            status = %status,
            response_body_len = response_body.len(),
            "gemini returned non-success status"
        );
        return Err(classify_failure(status, &response_body));
    }

    let parsed: GenerateContentResponse = serde_json::from_str(&response_body)
        .map_err(|err| AppError::api(format!("failed to parse model response: {err}")))?;
    let text = extract_text(parsed)?;
    debug!(
        model = %cfg.model,
        response_len = text.len(),
        "received gemini response"
    );
    Ok(text)
}
