//! Rasterization of Typst markup through the external Typst CLI.
//!
//! # Overview
//!
//! The layout and emitter stages are pure; turning markup into pixels is
//! delegated to `typst compile`. Each call writes the markup into a scratch
//! directory, runs the engine as a child process on a current-thread
//! `tokio` runtime, and reads the produced artifact back.
//!
//! The configured timeout bounds the whole call, engine version check
//! included. A child still running at the deadline is killed and the call
//! fails with [`QollageError::RenderTimeout`]. A non-zero exit surfaces the
//! engine's stderr verbatim as [`QollageError::RenderBackendFailure`].
//!
//! The engine version is checked once per command line
//! (`<command> --version`); the result is kept in a process-wide cache
//! shared by all rasterizers.
//!
//! When called from inside a `tokio` runtime, the child is driven on a
//! dedicated thread that owns its own runtime. The calling thread blocks
//! until it finishes.

use std::{
    collections::HashMap,
    fs,
    path::Path,
    process::{Output, Stdio},
    sync::{OnceLock, PoisonError, RwLock},
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, trace, warn};
use tokio::{process::Command, runtime};

use crate::{
    QollageError,
    config::{ImageFormat, RenderConfig},
};

/// Converts Typst markup into image bytes.
pub trait Rasterizer: Send + Sync {
    /// Compiles `markup` into an image of the requested `format`.
    fn rasterize(&self, markup: &str, format: ImageFormat) -> Result<Vec<u8>, QollageError>;
}

/// What the engine version check found out about a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInfo {
    program: String,
    version: Option<String>,
}

impl EngineInfo {
    pub fn program(&self) -> &str {
        &self.program
    }

    /// First line of `--version` output, when the version check succeeded.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

type EngineCache = RwLock<HashMap<Vec<String>, EngineInfo>>;

fn engine_cache() -> &'static EngineCache {
    static ENGINES: OnceLock<EngineCache> = OnceLock::new();
    ENGINES.get_or_init(|| RwLock::new(HashMap::new()))
}

/// [`Rasterizer`] backed by the `typst` command line tool.
#[derive(Debug, Clone)]
pub struct TypstCli {
    command: Vec<String>,
    ppi: u32,
    timeout: Duration,
}

impl TypstCli {
    /// Creates a rasterizer invoking `command` (program plus leading arguments).
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            ppi: 144,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.typst_command().to_vec())
            .with_ppi(config.ppi())
            .with_timeout(config.timeout())
    }

    pub fn with_ppi(mut self, ppi: u32) -> Self {
        self.ppi = ppi;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the engine info for this command line, checking it on a cache miss.
    pub fn engine(&self) -> Result<EngineInfo, QollageError> {
        self.engine_before(Instant::now() + self.timeout)
    }

    fn engine_before(&self, deadline: Instant) -> Result<EngineInfo, QollageError> {
        {
            let cache = engine_cache()
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(info) = cache.get(&self.command) {
                trace!(program = info.program(); "Engine cache hit");
                return Ok(info.clone());
            }
        }

        let info = self.query_version(deadline)?;
        let mut cache = engine_cache()
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // A concurrent check may have won; keep the first entry.
        let info = cache
            .entry(self.command.clone())
            .or_insert(info)
            .clone();
        Ok(info)
    }

    fn query_version(&self, deadline: Instant) -> Result<EngineInfo, QollageError> {
        let program = self.program()?.to_string();
        let output = self.run(["--version"], None, deadline)?;

        let version = match output {
            Some(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty()),
            Some(output) => {
                warn!(program, status:% = output.status; "Engine version check failed");
                None
            }
            None => {
                warn!(program; "Engine version check timed out");
                None
            }
        };

        info!(program, version:?; "Render engine checked");
        Ok(EngineInfo { program, version })
    }

    fn program(&self) -> Result<&str, QollageError> {
        self.command
            .first()
            .map(String::as_str)
            .ok_or_else(|| QollageError::Config("typst command is empty".to_string()))
    }

    /// Runs the command line with `extra` arguments appended.
    ///
    /// Returns `Ok(None)` when the child was killed at `deadline`.
    fn run<I, S>(
        &self,
        extra: I,
        cwd: Option<&Path>,
        deadline: Instant,
    ) -> Result<Option<Output>, QollageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let program = self.program()?;
        let mut command = Command::new(program);
        command
            .args(&self.command[1..])
            .args(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        trace!(program, remaining:?; "Running render engine");

        block_on(async move {
            let child = match command.spawn() {
                Ok(child) => child,
                Err(err) => {
                    return Err(QollageError::RenderBackendFailure {
                        diagnostic: format!("failed to launch `{program}`: {err}"),
                    });
                }
            };

            // Dropping the pending future drops the child, which kills it.
            match tokio::time::timeout(remaining, child.wait_with_output()).await {
                Ok(Ok(output)) => Ok(Some(output)),
                Ok(Err(err)) => Err(QollageError::RenderBackendFailure {
                    diagnostic: format!("failed to wait for `{program}`: {err}"),
                }),
                Err(_) => Ok(None),
            }
        })?
    }
}

/// Drives `future` to completion on a fresh current-thread runtime.
///
/// A runtime cannot be started from a thread that already runs one, so in
/// that case the future moves to a scoped worker thread.
fn block_on<F>(future: F) -> Result<F::Output, QollageError>
where
    F: Future + Send,
    F::Output: Send,
{
    let drive = move || {
        runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map(|runtime| runtime.block_on(future))
            .map_err(|err| QollageError::RenderBackendFailure {
                diagnostic: format!("failed to start async runtime: {err}"),
            })
    };

    if runtime::Handle::try_current().is_err() {
        return drive();
    }

    debug!("Inside an async runtime, driving the render engine on a worker thread");
    thread::scope(|scope| {
        scope
            .spawn(drive)
            .join()
            .unwrap_or_else(|_| {
                Err(QollageError::RenderBackendFailure {
                    diagnostic: "render engine worker thread panicked".to_string(),
                })
            })
    })
}

impl Rasterizer for TypstCli {
    fn rasterize(&self, markup: &str, format: ImageFormat) -> Result<Vec<u8>, QollageError> {
        let deadline = Instant::now() + self.timeout;
        let engine = self.engine_before(deadline)?;
        debug!(
            program = engine.program(),
            version:? = engine.version(),
            format:%;
            "Rasterizing markup"
        );

        let scratch = tempfile::tempdir()
            .map_err(|err| QollageError::io_failure(std::env::temp_dir(), err))?;
        let input = scratch.path().join("circuit.typ");
        let output = scratch
            .path()
            .join(format!("circuit.{}", format.extension()));
        fs::write(&input, markup).map_err(|err| QollageError::io_failure(&input, err))?;

        let mut args = vec![
            "compile".to_string(),
            "circuit.typ".to_string(),
            format!("circuit.{}", format.extension()),
            "--format".to_string(),
            format.extension().to_string(),
        ];
        if format == ImageFormat::Png {
            args.push("--ppi".to_string());
            args.push(self.ppi.to_string());
        }

        let result = self
            .run(&args, Some(scratch.path()), deadline)?
            .ok_or(QollageError::RenderTimeout {
                timeout: self.timeout,
            })?;
        if !result.status.success() {
            let diagnostic = String::from_utf8_lossy(&result.stderr).into_owned();
            debug!(status:% = result.status; "Render engine reported failure");
            return Err(QollageError::RenderBackendFailure { diagnostic });
        }

        let bytes = fs::read(&output).map_err(|err| QollageError::io_failure(&output, err))?;
        info!(format:%, bytes = bytes.len(); "Image rasterized");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = RenderConfig::default();
        config.set_timeout(Duration::from_secs(5));
        config.set_typst_command(vec!["typst-nightly".to_string()]);

        let rasterizer = TypstCli::from_config(&config);
        assert_eq!(rasterizer.timeout(), Duration::from_secs(5));
        assert_eq!(rasterizer.program().unwrap(), "typst-nightly");
    }

    #[test]
    fn test_empty_command_is_config_error() {
        let rasterizer = TypstCli::new(Vec::new());
        let err = rasterizer
            .rasterize("#set page()", ImageFormat::Png)
            .unwrap_err();
        assert!(matches!(err, QollageError::Config(_)));
    }

    #[test]
    fn test_missing_program_is_backend_failure() {
        let rasterizer = TypstCli::new(vec!["qollage-no-such-engine-binary".to_string()]);
        let err = rasterizer.engine().unwrap_err();
        match err {
            QollageError::RenderBackendFailure { diagnostic } => {
                assert!(diagnostic.contains("qollage-no-such-engine-binary"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_engine_info_is_cached() {
        let rasterizer = TypstCli::new(vec!["echo".to_string(), "typst 0.0.0".to_string()]);
        let first = rasterizer.engine().unwrap();
        let second = rasterizer.engine().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.program(), "echo");
        assert_eq!(first.version(), Some("typst 0.0.0 --version"));
    }
}
