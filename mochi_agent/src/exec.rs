//! Shell command execution for the toy terminal.
//!
//! One command line is handed to the platform interpreter as a single argument,
//! stdout/stderr are drained concurrently into bounded buffers, and a hard
//! wall-clock timeout kills the child (and its process group on Unix). Every
//! outcome is folded into a [`CommandResult`]; nothing here returns an error to
//! the bridge.

use std::io;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use crate::types::CommandResult;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Per stream (stdout and stderr each).
pub const DEFAULT_MAX_OUTPUT: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Interpreter override; `None` picks `/bin/sh` or `cmd.exe`.
    pub shell: Option<String>,
    pub timeout: Duration,
    pub max_output_bytes: usize,
    /// Regex allow-list. Empty means every command line is accepted.
    pub allow_patterns: Vec<String>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            shell: None,
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT,
            allow_patterns: Vec::new(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Invalid command")]
    InvalidCommand,

    #[error("Command denied: {0}")]
    Denied(String),

    #[error("Execution failed: {0}")]
    Spawn(io::Error),

    #[error("Execution failed: {0}")]
    Io(io::Error),

    #[error("Execution failed: timed out after {0} ms")]
    Timeout(u128),

    #[error("Invalid allow pattern '{0}': {1}")]
    Pattern(String, regex::Error),
}

struct Shell {
    program: String,
    flag: &'static str,
}

impl Shell {
    fn resolve(program: Option<&str>) -> Self {
        #[cfg(windows)]
        let (default, flag) = ("cmd.exe", "/C");
        #[cfg(not(windows))]
        let (default, flag) = ("/bin/sh", "-c");
        Self {
            program: program.unwrap_or(default).to_string(),
            flag,
        }
    }
}

pub struct Executor {
    shell: Shell,
    timeout: Duration,
    max_output_bytes: usize,
    allow: Vec<Regex>,
    spawned: AtomicUsize,
}

impl Executor {
    pub fn new(config: &ExecConfig) -> Result<Self, ExecError> {
        let allow = config
            .allow_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| ExecError::Pattern(p.clone(), e)))
            .collect::<Result<Vec<_>, _>>()?;
        if !allow.is_empty() {
            info!(patterns = allow.len(), "command allow-list active");
        }
        Ok(Self {
            shell: Shell::resolve(config.shell.as_deref()),
            timeout: config.timeout,
            max_output_bytes: config.max_output_bytes,
            allow,
            spawned: AtomicUsize::new(0),
        })
    }

    /// Number of child processes started so far.
    pub fn spawn_count(&self) -> usize {
        self.spawned.load(Ordering::Relaxed)
    }

    /// Run one command line. `None` stands for a payload that was not a string.
    pub async fn execute(&self, command_line: Option<&str>) -> CommandResult {
        let Some(line) = command_line.filter(|l| !l.is_empty()) else {
            return CommandResult::failed("", ExecError::InvalidCommand.to_string());
        };
        if let Err(e) = self.check(line) {
            warn!(command = %line, "{e}");
            return CommandResult::failed("", e.to_string());
        }
        self.run(line).await
    }

    fn check(&self, line: &str) -> Result<(), ExecError> {
        if self.allow.is_empty() || self.allow.iter().any(|p| p.is_match(line)) {
            Ok(())
        } else {
            Err(ExecError::Denied(
                "command does not match any allow pattern".into(),
            ))
        }
    }

    fn build(&self, line: &str) -> Command {
        let mut cmd = Command::new(&self.shell.program);
        cmd.arg(self.shell.flag);
        // cmd.exe does not undo MSVC argument quoting; hand it the line verbatim
        #[cfg(windows)]
        cmd.raw_arg(line);
        #[cfg(not(windows))]
        cmd.arg(line);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        #[cfg(windows)]
        cmd.creation_flags(0x0800_0000); // CREATE_NO_WINDOW
        cmd
    }

    async fn run(&self, line: &str) -> CommandResult {
        let start = Instant::now();
        let mut child = match self.build(line).spawn() {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, shell = %self.shell.program, "failed to spawn interpreter");
                return CommandResult::failed("", ExecError::Spawn(e).to_string());
            }
        };
        self.spawned.fetch_add(1, Ordering::Relaxed);
        debug!(command = %line, pid = ?child.id(), "command started");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let cap = self.max_output_bytes;
        let mut out_buf = Vec::new();
        let mut err_buf = Vec::new();

        // Buffers live outside the timed future so partial output survives a timeout.
        let outcome = tokio::time::timeout(self.timeout, async {
            let (out, err) = tokio::join!(
                drain(stdout, &mut out_buf, cap),
                drain(stderr, &mut err_buf, cap)
            );
            let out_truncated = out?;
            err?;
            let status = child.wait().await?;
            Ok::<_, io::Error>((status, out_truncated))
        })
        .await;

        let mut output = String::from_utf8_lossy(&out_buf).into_owned();
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok((status, truncated))) => {
                let code = status.code().unwrap_or(-1);
                if truncated {
                    if !output.ends_with('\n') {
                        output.push('\n');
                    }
                    output.push_str(&format!("[output truncated at {cap} bytes]"));
                }
                let stderr_text = String::from_utf8_lossy(&err_buf).into_owned();
                info!(command = %line, exit_code = code, elapsed_ms, "command finished");
                if !status.success() && !stderr_text.is_empty() {
                    CommandResult::failed(
                        output,
                        format!("Command failed (exit code {code}): {stderr_text}"),
                    )
                } else if output.is_empty() {
                    CommandResult::ok(format!("[OK] exit code {code}"))
                } else {
                    CommandResult::ok(output)
                }
            }
            Ok(Err(e)) => {
                error!(command = %line, error = %e, "command i/o failed");
                terminate(&mut child).await;
                CommandResult::failed(output, ExecError::Io(e).to_string())
            }
            Err(_) => {
                warn!(command = %line, timeout_ms = self.timeout.as_millis() as u64, "command timed out, killing");
                terminate(&mut child).await;
                CommandResult::failed(output, ExecError::Timeout(self.timeout.as_millis()).to_string())
            }
        }
    }
}

/// Read a pipe to EOF, keeping at most `cap` bytes. Returns whether anything was dropped.
async fn drain<R: AsyncRead + Unpin>(
    reader: Option<R>,
    buf: &mut Vec<u8>,
    cap: usize,
) -> io::Result<bool> {
    let Some(mut reader) = reader else {
        return Ok(false);
    };
    let mut chunk = [0u8; 4096];
    let mut truncated = false;
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(truncated);
        }
        // Keep reading past the cap so the child never blocks on a full pipe.
        let take = n.min(cap.saturating_sub(buf.len()));
        buf.extend_from_slice(&chunk[..take]);
        if take < n {
            truncated = true;
        }
    }
}

/// Kill the child and everything in its process group, then reap it.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: plain signal delivery to the group the child leads; no memory is shared.
        unsafe {
            libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
        }
    }
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "child already exited");
    }
    if let Err(e) = child.wait().await {
        warn!(error = %e, "failed to reap child");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor(timeout: Duration) -> Executor {
        Executor::new(&ExecConfig {
            timeout,
            ..ExecConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn empty_or_non_string_input_is_rejected_without_spawning() {
        let ex = executor(DEFAULT_TIMEOUT);
        for input in [None, Some("")] {
            let r = ex.execute(input).await;
            assert_eq!(r, CommandResult::failed("", "Invalid command"));
        }
        assert_eq!(ex.spawn_count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn echo_returns_stdout_and_empty_error() {
        let ex = executor(DEFAULT_TIMEOUT);
        let r = ex.execute(Some("echo hello")).await;
        assert_eq!(r.output, "hello\n");
        assert_eq!(r.error, "");
        assert_eq!(ex.spawn_count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn pipes_are_interpreted_by_the_shell() {
        let ex = executor(DEFAULT_TIMEOUT);
        let r = ex.execute(Some("printf 'b\\na\\n' | sort")).await;
        assert_eq!(r.output, "a\nb\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn quoted_arguments_reach_the_shell_intact() {
        let ex = executor(DEFAULT_TIMEOUT);
        let r = ex.execute(Some(r#"printf '%s|' "a b" c"#)).await;
        assert_eq!(r.output, "a b|c|");
    }

    #[cfg(windows)]
    #[tokio::test]
    async fn quoted_arguments_reach_cmd_intact() {
        let ex = executor(DEFAULT_TIMEOUT);
        let r = ex.execute(Some(r#"echo "a b""#)).await;
        assert_eq!(r.error, "");
        assert_eq!(r.output.trim_end(), r#""a b""#);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn silent_success_reports_exit_code_marker() {
        let ex = executor(DEFAULT_TIMEOUT);
        let r = ex.execute(Some("true")).await;
        assert_eq!(r, CommandResult::ok("[OK] exit code 0"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failure_with_stderr_keeps_stdout_and_reports_code() {
        let ex = executor(DEFAULT_TIMEOUT);
        let r = ex.execute(Some("echo partial; echo boom >&2; exit 3")).await;
        assert_eq!(r.output, "partial\n");
        assert_eq!(r.error, "Command failed (exit code 3): boom\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failure_without_stderr_is_not_an_error() {
        let ex = executor(DEFAULT_TIMEOUT);
        let r = ex.execute(Some("exit 4")).await;
        assert_eq!(r, CommandResult::ok("[OK] exit code 4"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_the_child_and_keeps_partial_output() {
        let ex = executor(Duration::from_millis(400));
        let start = Instant::now();
        let r = ex.execute(Some("echo $$; sleep 30")).await;
        assert!(start.elapsed() < Duration::from_secs(3), "executor hung");
        assert_eq!(r.error, "Execution failed: timed out after 400 ms");

        let pid: libc::pid_t = r.output.trim().parse().expect("shell pid in partial output");
        // The shell was our direct child and has been reaped, so it no longer exists.
        let alive = unsafe { libc::kill(pid, 0) } == 0;
        assert!(!alive, "child {pid} still running after timeout");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn output_beyond_cap_is_truncated() {
        let ex = Executor::new(&ExecConfig {
            max_output_bytes: 8,
            ..ExecConfig::default()
        })
        .unwrap();
        let r = ex.execute(Some("printf '0123456789abcdef'")).await;
        assert_eq!(r.output, "01234567\n[output truncated at 8 bytes]");
        assert_eq!(r.error, "");
    }

    #[tokio::test]
    async fn missing_interpreter_is_an_execution_failure() {
        let ex = Executor::new(&ExecConfig {
            shell: Some("/definitely/not/a/shell".into()),
            ..ExecConfig::default()
        })
        .unwrap();
        let r = ex.execute(Some("echo hi")).await;
        assert_eq!(r.output, "");
        assert!(r.error.starts_with("Execution failed: "), "{}", r.error);
        assert_eq!(ex.spawn_count(), 0);
    }

    #[tokio::test]
    async fn allow_list_denies_unmatched_commands_without_spawning() {
        let ex = Executor::new(&ExecConfig {
            allow_patterns: vec![r"^echo\b".into()],
            ..ExecConfig::default()
        })
        .unwrap();
        let r = ex.execute(Some("rm -rf /tmp/x")).await;
        assert_eq!(r.output, "");
        assert!(r.error.starts_with("Command denied: "));
        assert_eq!(ex.spawn_count(), 0);
    }

    #[test]
    fn bad_allow_pattern_is_reported() {
        let err = Executor::new(&ExecConfig {
            allow_patterns: vec!["(".into()],
            ..ExecConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, ExecError::Pattern(ref p, _) if p == "("));
    }
}
