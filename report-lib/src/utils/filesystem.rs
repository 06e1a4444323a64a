use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::utils::utc_timestamp;

/// Centralized function to append error messages to a log file
///
/// # Arguments
/// * `log_file` - The log file, created when missing
/// * `error_type` - A description of the error type/category (e.g., "Data Quality Report")
/// * `error_message` - The actual error message content
pub fn write_error_to_log(log_file: &Path, error_type: &str, error_message: &str) -> Result<()> {
    let timestamp = utc_timestamp();
    let log_entry = format!("\n[{}] {}:\n{}\n", timestamp, error_type, error_message);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;
    writeln!(file, "{}", log_entry)?;
    Ok(())
}

/// Copy `source` into `dest_dir` under `file_name`, creating the folder when needed.
pub fn copy_into_dir(source: &Path, dest_dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dest_dir)?;
    let destination = dest_dir.join(file_name);
    fs::copy(source, &destination)?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_into_dir_creates_folder() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        fs::write(&source, b"png").unwrap();

        let dest_dir = dir.path().join("out").join("others");
        let copied = copy_into_dir(&source, &dest_dir, "R001_photo.png").unwrap();

        assert_eq!(copied, dest_dir.join("R001_photo.png"));
        assert_eq!(fs::read(copied).unwrap(), b"png");
    }
}
