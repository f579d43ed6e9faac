//! Detaching the collector into the background.
//!
//! Instead of forking, the running binary re-executes itself with
//! [`DAEMON_RUN_ARG`] in a new process group, with its standard streams
//! attached to the null device and its working directory set to `/`. The
//! parent records the child's PID in a `RUN_<program>_pid_<pid>` file and
//! may exit immediately.
//!
//! The child gets its own process group but not its own session, so it keeps
//! the controlling terminal; it only stops receiving the terminal's job
//! control signals such as Ctrl-C. The file mode creation mask is inherited
//! unchanged.

use crate::exlog::log_to_file;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Environment variable set in the detached child.
pub const DAEMON_ENV: &str = "CANDLEKEEP_DAEMON";

/// Hidden command line flag marking the detached child.
pub const DAEMON_RUN_ARG: &str = "--daemon-run";

/// Errors that can occur while detaching.
#[derive(Error, Debug)]
pub enum DaemonError {
    /// Failed to spawn the detached process.
    #[error("Failed to spawn daemon process '{executable}': {source}")]
    Spawn {
        /// The executable that could not be spawned.
        executable: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to determine the executable path.
    #[error("Failed to determine executable path: {source}")]
    ExecutablePath {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Spawns the current binary as a detached background process.
#[derive(Debug, Clone)]
pub struct Daemonizer {
    executable_path: PathBuf,
    args: Vec<OsString>,
    pid_dir: PathBuf,
    program: String,
}

impl Daemonizer {
    /// Creates a daemonizer for the current executable.
    ///
    /// `pid_dir` receives the `RUN_<program>_pid_<pid>` marker file.
    ///
    /// # Errors
    ///
    /// Returns an error if the current executable path cannot be determined.
    pub fn new(pid_dir: impl Into<PathBuf>) -> Result<Self, DaemonError> {
        let executable_path =
            std::env::current_exe().map_err(|e| DaemonError::ExecutablePath { source: e })?;
        Ok(Self::with_executable(executable_path, pid_dir))
    }

    /// Creates a daemonizer for a specific executable.
    #[must_use]
    pub fn with_executable(executable_path: PathBuf, pid_dir: impl Into<PathBuf>) -> Self {
        let program = executable_path
            .file_stem()
            .map_or_else(|| "candlekeep".to_string(), |s| s.to_string_lossy().into_owned());
        Self {
            executable_path,
            args: Vec::new(),
            pid_dir: pid_dir.into(),
            program,
        }
    }

    /// Appends an argument passed to the detached process after [`DAEMON_RUN_ARG`].
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Returns the executable that will be spawned.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable_path
    }

    /// Returns the arguments passed to the detached process.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Returns true when running inside a process spawned by [`Daemonizer::spawn`].
    #[must_use]
    pub fn is_daemon_child() -> bool {
        std::env::var_os(DAEMON_ENV).is_some()
    }

    /// Spawns the detached process and returns its PID.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned. Failure to write
    /// the PID marker file is logged but not returned.
    pub fn spawn(&self) -> Result<u32, DaemonError> {
        let child = self.spawn_detached()?;
        let pid = child.id();

        let marker = format!("RUN_{}_pid_{pid}", self.program);
        if let Err(e) = log_to_file(&self.pid_dir, &format!("{marker}_"), &marker) {
            tracing::warn!(pid, error = %e, "failed to record daemon pid");
        }

        tracing::info!(pid, executable = %self.executable_path.display(), "daemon started");
        Ok(pid)
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.executable_path);
        command
            .arg(DAEMON_RUN_ARG)
            .args(&self.args)
            .env(DAEMON_ENV, "1")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }

    /// Spawn a detached child process.
    #[cfg(unix)]
    fn spawn_detached(&self) -> Result<std::process::Child, DaemonError> {
        use std::os::unix::process::CommandExt;

        self.command()
            .current_dir("/")
            .process_group(0) // Own process group; terminal job signals no longer reach it
            .spawn()
            .map_err(|e| DaemonError::Spawn {
                executable: self.executable_path.clone(),
                source: e,
            })
    }

    /// Spawn a detached child process on Windows.
    #[cfg(windows)]
    fn spawn_detached(&self) -> Result<std::process::Child, DaemonError> {
        use std::os::windows::process::CommandExt;

        // CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
        const DETACHED_PROCESS: u32 = 0x00000008;

        self.command()
            .creation_flags(CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS)
            .spawn()
            .map_err(|e| DaemonError::Spawn {
                executable: self.executable_path.clone(),
                source: e,
            })
    }

    /// Spawn a detached child process (fallback for other platforms).
    #[cfg(not(any(unix, windows)))]
    fn spawn_detached(&self) -> Result<std::process::Child, DaemonError> {
        self.command().spawn().map_err(|e| DaemonError::Spawn {
            executable: self.executable_path.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_daemonizer_with_executable() {
        let temp_dir = TempDir::new().unwrap();
        let daemonizer = Daemonizer::with_executable(PathBuf::from("/custom/candlekeep"), temp_dir.path())
            .arg("--config")
            .arg("/etc/candlekeep.toml");

        assert_eq!(daemonizer.executable(), Path::new("/custom/candlekeep"));
        assert_eq!(daemonizer.args().len(), 2);
        assert_eq!(daemonizer.program, "candlekeep");
    }

    #[test]
    fn test_spawn_missing_executable() {
        let temp_dir = TempDir::new().unwrap();
        let daemonizer =
            Daemonizer::with_executable(PathBuf::from("/nonexistent/candlekeep"), temp_dir.path());

        assert!(matches!(daemonizer.spawn(), Err(DaemonError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_records_pid() {
        let temp_dir = TempDir::new().unwrap();
        let exe_path = if Path::new("/bin/true").exists() {
            PathBuf::from("/bin/true")
        } else {
            PathBuf::from("/usr/bin/true")
        };

        let daemonizer = Daemonizer::with_executable(exe_path, temp_dir.path());

        // The binary may be missing on minimal systems
        if let Ok(pid) = daemonizer.spawn() {
            let expected = format!("RUN_true_pid_{pid}_");
            let found = std::fs::read_dir(temp_dir.path())
                .unwrap()
                .filter_map(Result::ok)
                .any(|e| e.file_name().to_string_lossy().starts_with(&expected));
            assert!(found);
        }
    }
}
