//! External command execution behind a trait so branch classification can be
//! tested without spawning processes.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs `argv[0]` with the remaining arguments.
///
/// A missing executable is reported as [`io::ErrorKind::NotFound`] and an
/// expired deadline as [`io::ErrorKind::TimedOut`]. A non-zero exit status is
/// not an error: it is returned in [`CommandOutput::exit_code`].
pub trait CommandRunner {
    fn run(&self, argv: &[&str]) -> io::Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, argv: &[&str]) -> io::Result<CommandOutput> {
        (**self).run(argv)
    }
}

/// Spawns real processes in a fixed working directory with a bounded timeout.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    cwd: PathBuf,
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(cwd: &Path, timeout: Duration) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            timeout,
        }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[&str]) -> io::Result<CommandOutput> {
        let Some((program, args)) = argv.split_first() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        };
        let program = which::which(program).map_err(|e| {
            io::Error::new(io::ErrorKind::NotFound, format!("{program}: {e}"))
        })?;

        tracing::debug!(?argv, cwd = %self.cwd.display(), "running command");

        let mut child = Command::new(&program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let child_pid = child.id();

        // Drain both pipes on their own threads so a chatty child cannot
        // block on a full pipe buffer.
        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();
        let stdout_thread = std::thread::spawn(move || read_all(stdout_handle));
        let stderr_thread = std::thread::spawn(move || read_all(stderr_handle));

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(child.wait());
        });

        let status = match rx.recv_timeout(self.timeout) {
            Ok(result) => result?,
            Err(_) => {
                kill_process(child_pid);
                tracing::debug!(?argv, "command timed out");
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("{} timed out after {:?}", argv.join(" "), self.timeout),
                ));
            }
        };

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: stdout_thread.join().unwrap_or_default(),
            stderr: stderr_thread.join().unwrap_or_default(),
        })
    }
}

fn read_all<R: Read>(handle: Option<R>) -> String {
    let mut buf = String::new();
    if let Some(mut r) = handle {
        let _ = r.read_to_string(&mut buf);
    }
    buf
}

/// Best-effort SIGKILL by pid.
fn kill_process(pid: u32) {
    let _ = Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

// ---------------------------------------------------------------------------
// Scripted runner for tests
// ---------------------------------------------------------------------------
