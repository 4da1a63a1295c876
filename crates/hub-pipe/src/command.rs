use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use wait_timeout::ChildExt;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Command `{0}` timed out after {1:?}")]
    Timeout(String, Duration),
    #[error("Command `{0}` failed with status {1}")]
    CommandFailed(String, ExitStatus),
    #[error("Command output was not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// A program invocation: executable, arguments, environment and stdin payload.
///
/// ```rust,ignore
/// let out = CommandSpec::new("/usr/sbin/sendmail")
///     .arg("-i")
///     .arg("--")
///     .arg("someone@example.org")
///     .stdin(raw_message)
///     .timeout(Duration::from_secs(30))
///     .run()?;
/// ```
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    current_dir: Option<PathBuf>,
    input: Vec<u8>,
    timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
            input: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = input.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Printable form used in error messages and log fields.
    pub fn display(&self) -> String {
        let mut s = self.program.display().to_string();
        for arg in &self.args {
            s.push(' ');
            s.push_str(&arg.to_string_lossy());
        }
        s
    }

    /// Runs the command and returns its stdout as UTF-8.
    pub fn run(&self) -> Result<String, ShellError> {
        let bytes = self.run_bytes()?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Runs the command and returns its raw stdout.
    ///
    /// Stdout is drained on a separate thread so a child that writes more than
    /// the pipe buffer cannot deadlock against the stdin write.
    pub fn run_bytes(&self) -> Result<Vec<u8>, ShellError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(command = %self.display(), "spawning child process");
        let mut child = cmd.spawn()?;

        let reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                stdout.read_to_end(&mut buf).map(|_| buf)
            })
        });

        // Fed from its own thread so a child that stops reading cannot
        // stall us past the timeout. Dropping the handle closes stdin.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = self.input.clone();
            thread::spawn(move || match stdin.write_all(&input) {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
                _ => Ok(()),
            })
        });

        let status = self.wait(&mut child)?;

        if let Some(handle) = writer {
            join(handle, "stdin writer")?;
        }
        if !status.success() {
            return Err(ShellError::CommandFailed(self.display(), status));
        }
        match reader {
            Some(handle) => join(handle, "stdout reader"),
            None => Ok(Vec::new()),
        }
    }

    /// Waits for the child. On timeout or a failed wait the child is killed
    /// and reaped before the error is returned.
    fn wait(&self, child: &mut Child) -> Result<ExitStatus, ShellError> {
        let waited = match self.timeout {
            Some(duration) => child.wait_timeout(duration),
            None => child.wait().map(Some),
        };
        match waited {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                reap(child);
                Err(ShellError::Timeout(
                    self.display(),
                    self.timeout.unwrap_or_default(),
                ))
            }
            Err(e) => {
                reap(child);
                Err(e.into())
            }
        }
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn join<T>(handle: JoinHandle<io::Result<T>>, role: &str) -> Result<T, ShellError> {
    match handle.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err(ShellError::Io(io::Error::other(format!(
            "{role} thread panicked"
        )))),
    }
}

/// Execute a shell command line with the given input piped to stdin.
///
/// Returns the command's stdout on success.
pub fn run_piped(
    command_str: &str,
    input: &str,
    timeout: Option<Duration>,
) -> Result<String, ShellError> {
    let spec = if cfg!(target_os = "windows") {
        CommandSpec::new("cmd").arg("/C").arg(command_str)
    } else {
        CommandSpec::new("sh").arg("-c").arg(command_str)
    };
    let spec = spec.stdin(input.as_bytes().to_vec());
    let result = match timeout {
        Some(t) => spec.timeout(t).run(),
        None => spec.run(),
    };
    // Report failures against the shell line rather than `sh -c ...`.
    result.map_err(|e| match e {
        ShellError::Timeout(_, d) => ShellError::Timeout(command_str.to_string(), d),
        ShellError::CommandFailed(_, s) => ShellError::CommandFailed(command_str.to_string(), s),
        other => other,
    })
}
