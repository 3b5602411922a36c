use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context as _;

use crate::encode::filter::{FilterGraph, LavfiSource};
use crate::encode::probe::{MediaInfo, parse_probe_json};
use crate::encode::profile::EncodeProfile;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::format_time;
use crate::foundation::error::{ReelError, ReelResult};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const DIAGNOSTIC_TAIL_LINES: usize = 40;

/// Default bound on a single encoder run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// One fully described run of the external encoder.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    label: String,
    args: Vec<String>,
    output: PathBuf,
}

impl Invocation {
    /// Wrap an already assembled argument vector. `output` must be the file the run produces.
    pub fn new(label: impl Into<String>, args: Vec<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            args,
            output: output.into(),
        }
    }

    pub fn builder(label: impl Into<String>) -> InvocationBuilder {
        InvocationBuilder::new(label)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// The `-filter_complex` argument, if any.
    pub fn filter_complex(&self) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == "-filter_complex")
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Every `-i` argument in order.
    pub fn inputs(&self) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| w[1].as_str())
            .collect()
    }
}

/// Builds ffmpeg argument vectors in the order ffmpeg expects: global options, inputs, graph,
/// maps, codec profile, output.
#[derive(Clone, Debug)]
pub struct InvocationBuilder {
    label: String,
    args: Vec<String>,
}

impl InvocationBuilder {
    fn new(label: impl Into<String>) -> Self {
        let args = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            label: label.into(),
            args,
        }
    }

    fn push(mut self, items: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(items);
        self
    }

    pub fn input(self, path: &Path) -> Self {
        self.push(["-i".to_string(), path.to_string_lossy().into_owned()])
    }

    /// Input-side seek: decode only `[start, start + duration)` of `path`.
    pub fn trimmed_input(self, path: &Path, start: f64, duration: f64) -> Self {
        self.push([
            "-ss".to_string(),
            format_time(start),
            "-t".to_string(),
            format_time(duration),
        ])
        .input(path)
    }

    pub fn lavfi_input(self, source: &LavfiSource) -> Self {
        self.push([
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            source.to_string(),
        ])
    }

    pub fn filter_complex(self, graph: &FilterGraph) -> Self {
        self.push(["-filter_complex".to_string(), graph.to_string()])
    }

    /// Map a filter graph output pad (`outv` becomes `[outv]`).
    pub fn map_pad(self, pad: &str) -> Self {
        self.push(["-map".to_string(), format!("[{pad}]")])
    }

    /// Map a plain stream specifier such as `0:a:0`.
    pub fn map_stream(self, spec: &str) -> Self {
        self.push(["-map".to_string(), spec.to_string()])
    }

    pub fn output_duration(self, seconds: f64) -> Self {
        self.push(["-t".to_string(), format_time(seconds)])
    }

    pub fn profile(mut self, profile: &EncodeProfile) -> Self {
        profile.push_to(&mut self.args);
        self
    }

    pub fn args(self, extra: &[&str]) -> Self {
        self.push(extra.iter().map(|s| s.to_string()))
    }

    pub fn finish(mut self, output: impl Into<PathBuf>) -> Invocation {
        let output = output.into();
        self.args.push(output.to_string_lossy().into_owned());
        Invocation {
            label: self.label,
            args: self.args,
            output,
        }
    }
}

/// Extract a mono 16 kHz PCM WAV from `source`, the input most speech recognizers expect.
pub fn audio_extraction(source: &Path, output: &Path) -> Invocation {
    Invocation::builder("extract-audio")
        .input(source)
        .map_stream("0:a:0")
        .args(&["-vn", "-ac", "1", "-ar", "16000", "-c:a", "pcm_s16le"])
        .finish(output)
}

/// The external media tool suite (`ffmpeg` + `ffprobe`).
///
/// Implementations must block until the run finished; a returned `Ok` means the output file is
/// complete.
pub trait Encoder: Send + Sync {
    fn run(&self, invocation: &Invocation) -> ReelResult<()>;

    fn probe(&self, path: &Path) -> ReelResult<MediaInfo>;
}

/// Program locations and the per-run deadline for [`SystemEncoder`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub timeout_secs: u64,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl EncoderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.timeout_secs == 0 {
            return Err(ReelError::validation("encoder timeout_secs must be >= 1"));
        }
        if self.ffmpeg.as_os_str().is_empty() || self.ffprobe.as_os_str().is_empty() {
            return Err(ReelError::validation(
                "encoder ffmpeg/ffprobe program paths must be non-empty",
            ));
        }
        Ok(())
    }
}

/// Runs the system `ffmpeg`/`ffprobe` binaries with a deadline and cooperative cancellation.
///
/// stderr is drained on a helper thread so a chatty child can never block on a full pipe; it is
/// attached to [`ReelError::Encoder`] when the run fails. On timeout or cancellation the child is
/// killed and reaped before returning.
#[derive(Clone, Debug)]
pub struct SystemEncoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    timeout: Duration,
    cancel: CancelToken,
}

struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl SystemEncoder {
    pub fn new(settings: &EncoderSettings, cancel: CancelToken) -> Self {
        Self {
            ffmpeg: settings.ffmpeg.clone(),
            ffprobe: settings.ffprobe.clone(),
            timeout: settings.timeout(),
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// `true` when the configured `ffmpeg` can be invoked.
    pub fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn run_bounded(&self, program: &Path, args: &[String], label: &str) -> ReelResult<Captured> {
        if self.cancel.is_cancelled() {
            return Err(ReelError::cancelled(format!("{label} not started")));
        }

        tracing::debug!(label, program = %program.display(), ?args, "spawning");
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group so a kill also reaches wrapper scripts' children.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt as _;
            command.process_group(0);
        }
        let mut child = command
            .spawn()
            .with_context(|| {
                format!(
                    "failed to spawn '{}' (is it installed and on PATH?)",
                    program.display()
                )
            })?;

        let stdout_drain = drain(child.stdout.take());
        let stderr_drain = drain(child.stderr.take());

        // A killed run returns without joining the drains: a surviving descendant may still hold
        // the pipes, and the detached threads finish once it lets go.
        let status = self.wait_bounded(&mut child, label)?;
        let stdout = join_drain(stdout_drain)?;
        let stderr = join_drain(stderr_drain)?;

        Ok(Captured {
            status,
            stdout,
            stderr,
        })
    }

    fn wait_bounded(&self, child: &mut Child, label: &str) -> ReelResult<ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("failed to poll {label}"))?
            {
                return Ok(status);
            }
            if self.cancel.is_cancelled() {
                kill_and_reap(child, label);
                return Err(ReelError::cancelled(format!("{label} killed")));
            }
            if Instant::now() >= deadline {
                kill_and_reap(child, label);
                tracing::warn!(label, timeout = ?self.timeout, "encoder timed out");
                return Err(ReelError::Timeout {
                    label: label.to_string(),
                    timeout: self.timeout,
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Encoder for SystemEncoder {
    fn run(&self, invocation: &Invocation) -> ReelResult<()> {
        ensure_parent_dir(invocation.output())?;
        let captured = self.run_bounded(&self.ffmpeg, invocation.args(), invocation.label())?;
        if !captured.status.success() {
            return Err(ReelError::Encoder {
                label: invocation.label().to_string(),
                status: captured.status.to_string(),
                stderr: diagnostic_tail(&captured.stderr),
            });
        }
        Ok(())
    }

    fn probe(&self, path: &Path) -> ReelResult<MediaInfo> {
        let args = [
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ]
        .into_iter()
        .map(String::from)
        .chain(std::iter::once(path.to_string_lossy().into_owned()))
        .collect::<Vec<_>>();
        let label = format!("probe {}", path.display());
        let captured = self.run_bounded(&self.ffprobe, &args, &label)?;
        if !captured.status.success() {
            return Err(ReelError::Encoder {
                label,
                status: captured.status.to_string(),
                stderr: diagnostic_tail(&captured.stderr),
            });
        }
        parse_probe_json(&captured.stdout)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<std::io::Result<Vec<u8>>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            pipe.read_to_end(&mut bytes)?;
            Ok(bytes)
        })
    })
}

fn join_drain(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> ReelResult<Vec<u8>> {
    match handle {
        Some(handle) => {
            let bytes = handle
                .join()
                .map_err(|_| anyhow::anyhow!("encoder pipe drain thread panicked"))?
                .context("failed to read encoder output")?;
            Ok(bytes)
        }
        None => Ok(Vec::new()),
    }
}

fn kill_and_reap(child: &mut Child, label: &str) {
    kill_process_group(child, label);
    if let Err(err) = child.kill() {
        tracing::debug!(label, %err, "kill failed (child already exited?)");
    }
    if let Err(err) = child.wait() {
        tracing::warn!(label, %err, "failed to reap killed encoder");
    }
}

#[cfg(unix)]
fn kill_process_group(child: &Child, label: &str) {
    let group = format!("-{}", child.id());
    let killed = Command::new("kill")
        .args(["-KILL", "--", &group])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match killed {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::debug!(label, %status, "process group kill reported failure"),
        Err(err) => tracing::debug!(label, %err, "could not run kill for process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child, _label: &str) {}

/// Last lines of the encoder's stderr, trimmed.
pub fn diagnostic_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    let skip = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    lines[skip..].join("\n")
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
