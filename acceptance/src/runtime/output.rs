//! Helper to capture child process stdout/stderr
//!
//! Output is piped and consumed line by line so the child never blocks on
//! a full pipe; the lines are kept for the teardown log.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;

#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    stdout: Arc<Mutex<String>>,
    stderr: Arc<Mutex<String>>,
}

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the child's pipes and spawn consumers appending to this buffer
    pub fn attach(&self, child: &mut Child) {
        if let Some(stdout) = child.stdout.take() {
            spawn_consumer(stdout, self.stdout.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_consumer(stderr, self.stderr.clone());
        }
    }

    pub fn stdout(&self) -> String {
        self.stdout.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn stderr(&self) -> String {
        self.stderr.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

fn spawn_consumer<R>(stream: R, buffer: Arc<Mutex<String>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
            buffer.push_str(&line);
            buffer.push('\n');
        }
    });
}
