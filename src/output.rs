use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{AppError, Result};

/// Writes `text` verbatim to `path`, creating or truncating the file.
pub fn write_output(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|err| AppError::output(path, err))?;
    debug!(path = %path.display(), bytes = text.len(), "wrote model response");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::write_output;
    use crate::error::AppError;

    #[test]
    fn writes_text_byte_for_byte() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        let text = "# Heading\n\n  indented\r\nno trailing newline ✅";

        write_output(&path, text).expect("write should succeed");
        assert_eq!(fs::read_to_string(&path).expect("read back"), text);
    }

    #[test]
    fn truncates_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        fs::write(&path, "a much longer previous response").expect("seed file");

        write_output(&path, "short").expect("write should succeed");
        assert_eq!(fs::read_to_string(&path).expect("read back"), "short");
    }

    #[test]
    fn missing_parent_directory_is_output_write_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("no-such-dir").join("out.txt");

        let err = write_output(&path, "text").expect_err("write should fail");
        assert!(matches!(err, AppError::OutputWrite { .. }));
        assert!(err.to_string().contains("out.txt"));
    }
}
