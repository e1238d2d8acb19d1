use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::Invocation;
use crate::error::Result;
use crate::model_gateway::ModelClient;
use crate::{output, prompt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    PromptPrinted,
    Written { path: PathBuf, bytes: usize },
}

/// Runs the pipeline once: build the prompt, query the model, dump the response.
///
/// Status lines go to `out` on a best-effort basis. The dump target is only
/// touched after the model call succeeds.
pub async fn execute<M, W>(invocation: &Invocation, model: &M, out: &mut W) -> Result<Outcome>
where
    M: ModelClient + ?Sized,
    W: Write,
{
    let prompt = prompt::build_prompt(&invocation.prompt_source, &invocation.enclosures)?;
    info!(
        prompt_len = prompt.len(),
        enclosures = invocation.enclosures.len(),
        "resolved prompt"
    );

    if invocation.print_prompt_only {
        status(out, "=== Constructed Prompt ===");
        status(out, &prompt);
        status(out, "=== End of Prompt ===");
        return Ok(Outcome::PromptPrinted);
    }

    let credential = invocation.require_credential()?;

    status(out, &format!("Querying {}...", model.model_name()));
    let started = Instant::now();
    let text = model.generate(&prompt, credential).await?;
    info!(
        model = model.model_name(),
        response_len = text.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "model query succeeded"
    );
    status(out, "Query successful.");
    status(out, "--- Output Start ---");
    status(out, &text);
    status(out, "--- Output End ---");

    output::write_output(&invocation.output_path, &text)?;
    status(
        out,
        &format!("Output written to {}", invocation.output_path.display()),
    );

    Ok(Outcome::Written {
        path: invocation.output_path.clone(),
        bytes: text.len(),
    })
}

fn status<W: Write>(out: &mut W, line: &str) {
    if let Err(err) = writeln!(out, "{line}") {
        warn!(error = %err, "failed to write status line to stdout");
    }
}
