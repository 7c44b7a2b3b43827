//! Managed Instance
//!
//! Wraps one out-of-process Alertmanager: its configuration artifact, its
//! pre-allocated listen address, the process lifecycle and an API client
//! bound to that address. Alert and silence operations are not executed
//! directly but registered with the test's scheduler.

use std::fmt;
use std::io::{Seek, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use shared::{instance_debug, instance_error, instance_info, instance_warn};
use tempfile::NamedTempFile;
use tokio::process::{Child, Command};
use tokio::time::sleep;

use super::address::free_address;
use super::api_client::{AlertmanagerApi, ApiClient};
use super::output::CapturedOutput;
use crate::clock::VirtualClock;
use crate::config::AcceptanceOpts;
use crate::error::{HarnessError, HarnessResult};
use crate::scheduler::ActionScheduler;
use crate::testing::alert::{SilenceHandle, TestAlert, expand_batch};

/// Process control signals understood by Alertmanager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Graceful shutdown
    Terminate,
    /// Re-read the configuration file
    Reload,
}

impl ControlSignal {
    fn name(self) -> &'static str {
        match self {
            ControlSignal::Terminate => "SIGTERM",
            ControlSignal::Reload => "SIGHUP",
        }
    }
}

pub struct ManagedInstance {
    name: String,
    address: SocketAddr,
    opts: AcceptanceOpts,
    clock: VirtualClock,
    scheduler: ActionScheduler,
    client: Arc<dyn AlertmanagerApi>,
    config_file: Mutex<Option<NamedTempFile>>,
    config_path: PathBuf,
    process: Mutex<Option<Child>>,
    output: CapturedOutput,
}

impl fmt::Debug for ManagedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedInstance")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("config_path", &self.config_path)
            .field("running", &self.is_running())
            .finish()
    }
}

impl ManagedInstance {
    /// Allocate an address and configuration artifact and bind an HTTP
    /// client to the address. Failures here are fatal for the test.
    pub fn new(
        name: impl Into<String>,
        document: &str,
        opts: AcceptanceOpts,
        clock: VirtualClock,
        scheduler: ActionScheduler,
    ) -> HarnessResult<Self> {
        let address = free_address()?;
        let client = ApiClient::new(address, opts.request_timeout)?;
        Self::with_client(name, address, document, opts, clock, scheduler, Arc::new(client))
    }

    /// Like [`new`](Self::new) with an explicit address and client
    pub fn with_client(
        name: impl Into<String>,
        address: SocketAddr,
        document: &str,
        opts: AcceptanceOpts,
        clock: VirtualClock,
        scheduler: ActionScheduler,
        client: Arc<dyn AlertmanagerApi>,
    ) -> HarnessResult<Self> {
        let name = name.into();

        let mut config_file = tempfile::Builder::new()
            .prefix("am_config")
            .tempfile()
            .map_err(|source| HarnessError::ConfigArtifact {
                operation: "create",
                path: std::env::temp_dir(),
                source,
            })?;
        let config_path = config_file.path().to_path_buf();
        write_document(&mut config_file, document).map_err(|source| HarnessError::ConfigArtifact {
            operation: "write",
            path: config_path.clone(),
            source,
        })?;

        instance_info!(name, "🧩 Instance on {} (config {})", address, config_path.display());

        Ok(Self {
            name,
            address,
            opts,
            clock,
            scheduler,
            client,
            config_file: Mutex::new(Some(config_file)),
            config_path,
            process: Mutex::new(None),
            output: CapturedOutput::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> &CapturedOutput {
        &self.output
    }

    pub fn is_running(&self) -> bool {
        self.process.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Rewrite the configuration artifact. Does not reload a running
    /// process.
    pub fn configure(&self, document: &str) -> HarnessResult<()> {
        self.write_config(document).map_err(|source| HarnessError::ConfigArtifact {
            operation: "write",
            path: self.config_path.clone(),
            source,
        })
    }

    fn write_config(&self, document: &str) -> std::io::Result<()> {
        let mut guard = self.config_file.lock().unwrap_or_else(PoisonError::into_inner);
        let file = guard.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "configuration artifact already removed")
        })?;

        write_document(file, document)?;
        instance_debug!(self.name, "📝 Configuration rewritten ({} bytes)", document.len());
        Ok(())
    }

    /// Launch the process and give it the warm-up period to start listening
    pub async fn start(&self) -> HarnessResult<()> {
        {
            let mut process = self.process.lock().unwrap_or_else(PoisonError::into_inner);
            if process.is_some() {
                return Err(HarnessError::AlreadyRunning {
                    instance: self.name.clone(),
                });
            }

            instance_info!(self.name, "🚀 Starting {} on {}", self.opts.binary.display(), self.address);

            let mut cmd = Command::new(&self.opts.binary);
            cmd.args(self.opts.to_args(&self.config_path, self.address))
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .stdin(Stdio::null())
                .kill_on_drop(true);

            let mut child = cmd.spawn().map_err(|source| HarnessError::ProcessLaunch {
                binary: self.opts.binary.clone(),
                source,
            })?;
            self.output.attach(&mut child);

            instance_debug!(self.name, "Spawned PID {:?}", child.id());
            *process = Some(child);
        }

        sleep(self.opts.warmup).await;
        instance_info!(self.name, "✅ Instance started");
        Ok(())
    }

    /// Send a control signal to the running process
    pub fn signal(&self, signal: ControlSignal) -> HarnessResult<()> {
        let process = self.process.lock().unwrap_or_else(PoisonError::into_inner);
        let pid = process
            .as_ref()
            .and_then(Child::id)
            .ok_or_else(|| HarnessError::NotRunning {
                instance: self.name.clone(),
            })?;

        send_signal(pid, signal).map_err(|message| HarnessError::Signal {
            instance: self.name.clone(),
            signal: signal.name(),
            message,
        })?;

        instance_debug!(self.name, "📤 Sent {} to PID {}", signal.name(), pid);
        Ok(())
    }

    /// Ask the process to shut down gracefully; does not wait for it to exit
    pub fn terminate(&self) -> HarnessResult<()> {
        let result = self.signal(ControlSignal::Terminate);

        if let Some(mut child) = self.process.lock().unwrap_or_else(PoisonError::into_inner).take() {
            let name = self.name.clone();
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) => instance_debug!(name, "🏁 Exited with {}", status),
                    Err(e) => instance_warn!(name, "⚠️ Error waiting for exit: {}", e),
                }
            });
        }

        result
    }

    /// Ask the process to reload its configuration
    pub fn reload(&self) -> HarnessResult<()> {
        instance_info!(self.name, "🔄 Reloading configuration");
        self.signal(ControlSignal::Reload)
    }

    /// Remove the configuration artifact. Idempotent.
    pub fn cleanup(&self) {
        if let Some(file) = self.config_file.lock().unwrap_or_else(PoisonError::into_inner).take() {
            match file.close() {
                Ok(()) => instance_debug!(self.name, "🧹 Removed {}", self.config_path.display()),
                Err(e) => instance_warn!(self.name, "⚠️ Failed to remove {}: {}", self.config_path.display(), e),
            }
        }
    }

    /// Push `alerts` to the instance at relative time `at`
    pub fn push(&self, at: f64, alerts: &[TestAlert]) {
        let batch = expand_batch(alerts, &self.clock);
        let client = self.client.clone();
        let name = self.name.clone();

        self.scheduler
            .schedule(at, format!("push {} alerts to {}", batch.len(), self.name), move || async move {
                client.push_alerts(&batch).await?;
                instance_debug!(name, "📤 Pushed {} alerts", batch.len());
                Ok(())
            });
    }

    /// Create or update `silence` at relative time `at`; its identifier is
    /// stored back into the handle once the action ran
    pub fn set_silence(&self, at: f64, silence: &SilenceHandle) {
        let silence = silence.clone();
        let client = self.client.clone();
        let clock = self.clock;
        let name = self.name.clone();

        self.scheduler
            .schedule(at, format!("set silence on {}", self.name), move || async move {
                let id = client.set_silence(&silence.to_silence(&clock)).await?;
                silence.assign_id(id)?;
                instance_info!(name, "🔇 Silence {} active", silence);
                Ok(())
            });
    }

    /// Delete `silence` at relative time `at`. The silence must have been
    /// set by an action scheduled no later than this one.
    pub fn delete_silence(&self, at: f64, silence: &SilenceHandle) {
        let silence = silence.clone();
        let client = self.client.clone();
        let name = self.name.clone();

        self.scheduler
            .schedule(at, format!("delete silence on {}", self.name), move || async move {
                let id = silence.id().ok_or_else(|| HarnessError::MissingSilenceId {
                    silence: silence.to_string(),
                })?;
                client.delete_silence(id).await?;
                instance_info!(name, "🔊 Silence {} removed", silence);
                Ok(())
            });
    }

    /// Rewrite the configuration at relative time `at`; a failed write is
    /// recorded against that time
    pub fn configure_at(self: &Arc<Self>, at: f64, document: impl Into<String>) {
        let instance = self.clone();
        let document = document.into();
        self.scheduler
            .schedule(at, format!("configure {}", self.name), move || async move {
                instance.configure(&document)
            });
    }

    /// Send the reload signal at relative time `at`
    pub fn reload_at(self: &Arc<Self>, at: f64) {
        let instance = self.clone();
        self.scheduler
            .schedule(at, format!("reload {}", self.name), move || async move { instance.reload() });
    }

    /// Log captured process output
    pub fn log_output(&self) {
        let stdout = self.output().stdout();
        let stderr = self.output().stderr();
        if !stdout.is_empty() {
            instance_debug!(self.name, "stdout:\n{}", stdout);
        }
        if !stderr.is_empty() {
            instance_debug!(self.name, "stderr:\n{}", stderr);
        }
    }
}

impl Drop for ManagedInstance {
    fn drop(&mut self) {
        let process = self.process.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut child) = process.take() {
            instance_error!(self.name, "🚨 Emergency cleanup: killing instance that was never terminated");
            let _ = child.start_kill();
        }
    }
}

fn write_document(file: &mut NamedTempFile, document: &str) -> std::io::Result<()> {
    let handle = file.as_file_mut();
    handle.set_len(0)?;
    handle.rewind()?;
    handle.write_all(document.as_bytes())?;
    handle.sync_all()
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: ControlSignal) -> Result<(), String> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let signal = match signal {
        ControlSignal::Terminate => Signal::SIGTERM,
        ControlSignal::Reload => Signal::SIGHUP,
    };
    signal::kill(Pid::from_raw(pid as i32), signal).map_err(|e| e.to_string())
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, signal: ControlSignal) -> Result<(), String> {
    Err(format!("{} is not supported on this platform", signal.name()))
}
