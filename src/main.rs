use std::process::ExitCode;

use promptdump::{AppError, logging};
use tracing::{debug, error};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let log_guard = logging::init();

    let code = match promptdump::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // stderr already gets the message below; only file sinks need the event.
            if log_guard.has_file_sink() {
                error!(error = %err, "promptdump failed");
            } else {
                debug!(error = %err, "promptdump failed");
            }
            eprintln!("promptdump: error: {err:#}");
            let code = err
                .downcast_ref::<AppError>()
                .map(AppError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    };

    drop(log_guard);
    code
}
