//! Worker process ownership and stdio plumbing.

use crate::commands::build_frame;
use crate::config::SidecarConfig;
use crate::data::locate_data_dir;
use crate::error::HostError;
use async_trait::async_trait;
use engine_bridge::{TransportError, WorkerTransport};
use engine_bus::{OutputEvent, OutputPublisher};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type WorkerStdin = Box<dyn AsyncWrite + Send + Unpin>;

/// A running worker.
///
/// Implements [`WorkerTransport`] by writing one frame per request to the
/// worker's stdin. Output travels the other way on the event bus.
pub struct Sidecar {
    stdin: Mutex<Option<WorkerStdin>>,
    child: Mutex<Option<Child>>,
    running: Arc<AtomicBool>,
    data_dir: PathBuf,
    pumps: Vec<JoinHandle<()>>,
}

impl Sidecar {
    /// Start the worker process described by `config`.
    pub async fn spawn(
        config: &SidecarConfig,
        publisher: Arc<dyn OutputPublisher>,
    ) -> Result<Self, HostError> {
        config.validate()?;

        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HostError::Spawn {
                program: config.program.clone(),
                source: Arc::new(e),
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or(HostError::StdioNotCaptured("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(HostError::StdioNotCaptured("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(HostError::StdioNotCaptured("stderr"))?;

        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir().await,
        };

        info!(
            program = %config.program.display(),
            pid = ?child.id(),
            data_dir = %data_dir.display(),
            "Worker started"
        );

        let mut sidecar = Self::attach(
            stdin,
            stdout,
            publisher,
            config.output_event.clone(),
            data_dir,
        );
        sidecar.pumps.push(tokio::spawn(pump_stderr(stderr)));
        sidecar.child = Mutex::new(Some(child));
        Ok(sidecar)
    }

    /// Host a worker reachable through arbitrary streams.
    pub fn attach<W, R>(
        stdin: W,
        stdout: R,
        publisher: Arc<dyn OutputPublisher>,
        output_event: String,
        data_dir: PathBuf,
    ) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let pump = tokio::spawn(pump_stdout(
            stdout,
            publisher,
            output_event,
            running.clone(),
        ));

        Self {
            stdin: Mutex::new(Some(Box::new(stdin))),
            child: Mutex::new(None),
            running,
            data_dir,
            pumps: vec![pump],
        }
    }

    /// True until the worker's stdout closes or the host is shut down.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Close the worker's stdin and kill the process.
    pub async fn shutdown(&self) -> Result<(), HostError> {
        self.running.store(false, Ordering::Release);
        self.stdin.lock().await.take();

        if let Some(mut child) = self.child.lock().await.take() {
            child
                .kill()
                .await
                .map_err(|e| HostError::Shutdown(Arc::new(e)))?;
            info!("Worker stopped");
        }
        Ok(())
    }
}

#[async_trait]
impl WorkerTransport for Sidecar {
    async fn dispatch(&self, command: &str, payload: Value) -> Result<(), TransportError> {
        if !self.is_running() {
            return Err(TransportError::WorkerUnavailable);
        }

        let frame = build_frame(command, payload, &self.data_dir).await?;
        let line = frame.to_line()?;

        let mut stdin = self.stdin.lock().await;
        let writer = stdin.as_mut().ok_or(TransportError::WorkerUnavailable)?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;

        debug!(
            command = command,
            cmd = frame.cmd,
            request_id = %frame.request_id,
            "Wrote frame to worker"
        );
        Ok(())
    }
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        for pump in &self.pumps {
            pump.abort();
        }
    }
}

async fn default_data_dir() -> PathBuf {
    let start = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    locate_data_dir(&start).await
}

async fn pump_stdout<R>(
    stdout: R,
    publisher: Arc<dyn OutputPublisher>,
    event_name: String,
    running: Arc<AtomicBool>,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                if !line.is_empty() {
                    publisher
                        .publish(OutputEvent::new(event_name.as_str(), line))
                        .await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to read worker stdout");
                break;
            }
        }
    }

    running.store(false, Ordering::Release);
    info!(event = %event_name, "Worker stdout closed");
}

async fn pump_stderr<R>(stderr: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                warn!(worker_stderr = %line.trim_end(), "Worker stderr");
            }
            Err(e) => {
                warn!(error = %e, "Failed to read worker stderr");
                break;
            }
        }
    }
}
