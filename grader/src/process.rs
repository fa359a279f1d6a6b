//! One candidate invocation: spawn, feed the request, collect the reply.
//!
//! The call deadline covers the whole exchange. A candidate that exits but
//! leaves a subprocess holding its output pipes open has not finished; once
//! the deadline passes its readers are abandoned and the call is a timeout.

use std::io::{self, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Extra time a killed candidate gets to release its pipes.
const RELEASE_GRACE: Duration = Duration::from_millis(100);

/// Limits applied to every candidate process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallLimits {
    /// Deadline for the whole call, output included.
    pub timeout: Duration,
    /// Bytes kept from each output stream; more is an invocation fault.
    pub output_limit_bytes: usize,
}

/// Bytes read from one output stream.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Captured {
    pub bytes: Vec<u8>,
    /// Bytes read past the limit and thrown away.
    pub dropped: u64,
    /// False when the stream was still open at the deadline.
    pub closed: bool,
}

impl Captured {
    fn abandoned() -> Self {
        Self::default()
    }
}

/// What one candidate invocation produced.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Captured,
    pub stderr: Captured,
    pub timed_out: bool,
}

impl ProcessOutput {
    /// Describe why the call cannot be trusted, if it can't.
    pub fn failure(&self, limits: CallLimits) -> Option<String> {
        if self.timed_out {
            return Some(format!(
                "timed out after {}s",
                limits.timeout.as_secs_f64()
            ));
        }
        if !self.status.success() {
            let code = self
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |code| code.to_string());
            let stderr = String::from_utf8_lossy(&self.stderr.bytes);
            return Some(match stderr.trim() {
                "" => format!("exited with status {code}"),
                detail => format!("exited with status {code}: {detail}"),
            });
        }
        if self.stdout.dropped > 0 {
            return Some(format!(
                "output exceeded {} bytes",
                limits.output_limit_bytes
            ));
        }
        None
    }
}

/// Run one candidate invocation under `limits`.
#[instrument(skip_all, fields(timeout_secs = limits.timeout.as_secs_f64()))]
pub fn run_with_limits(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    limits: CallLimits,
) -> Result<ProcessOutput> {
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let deadline = Instant::now() + limits.timeout;
    let mut child = cmd.spawn().context("spawn candidate")?;
    debug!(pid = child.id(), "candidate spawned");

    if let (Some(input), Some(pipe)) = (stdin, child.stdin.take()) {
        send_request(pipe, input.to_vec());
    }
    let stdout = child
        .stdout
        .take()
        .map(|pipe| OutputReader::spawn(pipe, limits.output_limit_bytes))
        .ok_or_else(|| anyhow!("candidate stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .map(|pipe| OutputReader::spawn(pipe, limits.output_limit_bytes))
        .ok_or_else(|| anyhow!("candidate stderr was not captured"))?;

    let (status, mut timed_out) = match child
        .wait_timeout(limits.timeout)
        .context("wait for candidate")?
    {
        Some(status) => (status, false),
        None => {
            warn!("candidate hit its deadline, killing");
            child.kill().context("kill candidate")?;
            (child.wait().context("reap candidate")?, true)
        }
    };

    let release_by = deadline.max(Instant::now()) + RELEASE_GRACE;
    let stdout = stdout.finish(release_by)?;
    let stderr = stderr.finish(release_by)?;
    if !stdout.closed || !stderr.closed {
        warn!("candidate output still open after the deadline, abandoning it");
        timed_out = true;
    }
    if stdout.dropped > 0 || stderr.dropped > 0 {
        warn!(
            stdout_dropped = stdout.dropped,
            stderr_dropped = stderr.dropped,
            "candidate output over limit"
        );
    }

    debug!(exit_code = ?status.code(), timed_out, "candidate finished");
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
        timed_out,
    })
}

/// Write the request off-thread; a candidate that never reads must not stall us.
fn send_request(mut pipe: impl Write + Send + 'static, input: Vec<u8>) {
    thread::spawn(move || {
        if let Err(err) = pipe.write_all(&input) {
            // Exiting without reading is allowed; the exit status tells more.
            debug!(err = %err, "candidate closed stdin early");
        }
    });
}

/// Drains one output pipe on its own thread.
struct OutputReader {
    result: Receiver<io::Result<Captured>>,
}

impl OutputReader {
    fn spawn(pipe: impl Read + Send + 'static, limit: usize) -> Self {
        let (tx, result) = mpsc::channel();
        thread::spawn(move || {
            // The receiver is gone when the reader was abandoned.
            let _ = tx.send(capture(pipe, limit));
        });
        Self { result }
    }

    /// Wait until `release_by` for the pipe to close.
    fn finish(self, release_by: Instant) -> Result<Captured> {
        let wait = release_by.saturating_duration_since(Instant::now());
        match self.result.recv_timeout(wait) {
            Ok(captured) => captured.context("read candidate output"),
            Err(RecvTimeoutError::Timeout) => Ok(Captured::abandoned()),
            Err(RecvTimeoutError::Disconnected) => {
                Err(anyhow!("candidate output reader stopped without a result"))
            }
        }
    }
}

fn capture(mut pipe: impl Read, limit: usize) -> io::Result<Captured> {
    let mut bytes = Vec::new();
    (&mut pipe).take(limit as u64).read_to_end(&mut bytes)?;
    let dropped = io::copy(&mut pipe, &mut io::sink())?;
    Ok(Captured {
        bytes,
        dropped,
        closed: true,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn limits(timeout_ms: u64, output_limit_bytes: usize) -> CallLimits {
        CallLimits {
            timeout: Duration::from_millis(timeout_ms),
            output_limit_bytes,
        }
    }

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn echoes_stdin() {
        let limits = limits(5_000, 1024);
        let output = run_with_limits(sh("cat"), Some(b"hello"), limits).expect("run");
        assert_eq!(output.stdout.bytes, b"hello");
        assert!(output.stdout.closed);
        assert!(output.failure(limits).is_none());
    }

    #[test]
    fn oversized_output_is_a_failure() {
        let limits = limits(5_000, 4);
        let output = run_with_limits(sh("printf 'abcdef'"), None, limits).expect("run");
        assert_eq!(output.stdout.bytes, b"abcd");
        assert_eq!(output.stdout.dropped, 2);
        assert_eq!(
            output.failure(limits).as_deref(),
            Some("output exceeded 4 bytes")
        );
    }

    #[test]
    fn chatty_stderr_is_tolerated() {
        let limits = limits(5_000, 4);
        let output =
            run_with_limits(sh("printf 'warning' >&2; printf ok"), None, limits).expect("run");
        assert_eq!(output.stderr.dropped, 3);
        assert!(output.failure(limits).is_none());
    }

    #[test]
    fn reports_non_zero_exit_with_stderr() {
        let limits = limits(5_000, 1024);
        let output = run_with_limits(sh("echo boom >&2; exit 3"), None, limits).expect("run");
        assert_eq!(
            output.failure(limits).as_deref(),
            Some("exited with status 3: boom")
        );
    }

    #[test]
    fn candidate_that_never_reads_stdin_still_finishes() {
        let limits = limits(5_000, 1024);
        let request = vec![b'x'; 1 << 20];
        let output = run_with_limits(sh("printf done"), Some(&request), limits).expect("run");
        assert_eq!(output.stdout.bytes, b"done");
        assert!(!output.timed_out);
    }

    #[test]
    fn kills_hanging_candidate() {
        let limits = limits(200, 1024);
        let output = run_with_limits(sh("exec sleep 5"), None, limits).expect("run");
        assert!(output.timed_out);
        assert_eq!(output.failure(limits).as_deref(), Some("timed out after 0.2s"));
    }

    #[test]
    fn deadline_holds_when_a_subprocess_keeps_the_pipes() {
        let limits = limits(300, 1024);
        let started = Instant::now();
        let output = run_with_limits(sh("sleep 6; echo done"), None, limits).expect("run");
        let elapsed = started.elapsed();
        assert!(output.timed_out);
        assert!(elapsed < Duration::from_secs(2), "blocked for {elapsed:?}");
        assert_eq!(output.failure(limits).as_deref(), Some("timed out after 0.3s"));
    }

    #[test]
    fn exited_candidate_with_background_writer_times_out() {
        let limits = limits(300, 1024);
        let started = Instant::now();
        let output = run_with_limits(sh("sleep 6 & printf partial"), None, limits).expect("run");
        let elapsed = started.elapsed();
        assert!(output.status.success());
        assert!(output.timed_out);
        assert!(!output.stdout.closed);
        assert!(elapsed < Duration::from_secs(2), "blocked for {elapsed:?}");
    }
}
