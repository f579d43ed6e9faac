//! Exception reports written to files under a fixed directory.
//!
//! Each report lands in its own file named after the program and the local
//! time, so operators can find failures without scanning the main log.

use crate::time::locale_date_str_with_sep;
use chrono::Local;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Directory exception reports are written to unless configured otherwise.
pub const DEFAULT_EXCEPTION_DIR: &str = "/tmp/exlog/";

/// Returns the file stem of the running executable, e.g. `candlekeep`.
#[must_use]
pub fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_stem)
        .map_or_else(
            || "candlekeep".to_string(),
            |stem| stem.to_string_lossy().into_owned(),
        )
}

/// Writes `text` to `<dir>/<prefix><local date>`, creating `dir` if needed.
///
/// Files are opened in append mode so two reports within the same second
/// are both kept.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn log_to_file(dir: &Path, prefix: &str, text: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let stamp = locale_date_str_with_sep(Local::now().timestamp(), "_");
    let path = dir.join(format!("{prefix}{stamp}"));

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    file.write_all(text.as_bytes())?;

    Ok(path)
}

/// Renders an error, its source chain, and the current backtrace.
#[must_use]
pub fn format_exception<E: Error + ?Sized>(error: &E) -> String {
    let mut report = String::from("EXCEPTION \n");
    let _ = writeln!(report, "    EX_TYPE  : {} ", std::any::type_name::<E>());
    let _ = writeln!(report, "    EX_VAL   : {error} ");

    let mut source = error.source();
    if source.is_some() {
        report.push_str("    EX_CAUSE : \n");
    }
    while let Some(cause) = source {
        let _ = writeln!(report, "        {cause} ");
        source = cause.source();
    }

    report.push_str("    EX_TRACK : \n");
    for line in Backtrace::force_capture().to_string().lines() {
        let _ = writeln!(report, "        {line} ");
    }

    report
}

/// Records an error as an exception report and in the tracing log.
///
/// The report goes to `<dir>/EX_LOG_<program>_<local date>`. Failure to write
/// the file is logged and otherwise ignored; the returned path is `None` in
/// that case.
pub fn write_exception_log<E: Error + ?Sized>(
    dir: &Path,
    program: &str,
    error: &E,
) -> Option<PathBuf> {
    let report = format_exception(error);
    tracing::error!(
        error = %error,
        error_type = std::any::type_name::<E>(),
        "exception recorded"
    );

    let prefix = if program.is_empty() {
        "EX_LOG_".to_string()
    } else {
        format!("EX_LOG_{program}_")
    };

    match log_to_file(dir, &prefix, &report) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to write exception log");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, thiserror::Error)]
    #[error("commit failed")]
    struct Outer(#[source] io::Error);

    #[test]
    fn test_log_to_file_creates_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("exlog");

        let path = log_to_file(&dir, "RUN_test_pid_42_", "RUN_test_pid_42").unwrap();

        assert!(path.starts_with(&dir));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("RUN_test_pid_42_"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "RUN_test_pid_42");
    }

    #[test]
    fn test_format_exception_includes_chain() {
        let error = Outer(io::Error::other("disk full"));
        let report = format_exception(&error);

        assert!(report.starts_with("EXCEPTION \n"));
        assert!(report.contains("EX_TYPE  : "));
        assert!(report.contains("Outer"));
        assert!(report.contains("EX_VAL   : commit failed"));
        assert!(report.contains("disk full"));
        assert!(report.contains("EX_TRACK"));
    }

    #[test]
    fn test_write_exception_log() {
        let temp_dir = TempDir::new().unwrap();
        let error = Outer(io::Error::other("disk full"));

        let path = write_exception_log(temp_dir.path(), "okex_kline", &error).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("EX_LOG_okex_kline_"));
        assert!(fs::read_to_string(&path).unwrap().contains("commit failed"));
    }
}
