//! Background persistence of the config override layer
//!
//! Writes happen on a dedicated thread so command handling never blocks on
//! disk. Jobs are applied in submission order; every submission hands back a
//! `PendingWrite` the caller may wait on or simply drop.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, error, info};

struct WriteJob {
    contents: String,
    done: Sender<Result<()>>,
}

/// Completion signal for one queued write
#[derive(Debug)]
#[must_use = "drop it to fire-and-forget, or call wait() to block until the file is written"]
pub struct PendingWrite {
    completion: Receiver<Result<()>>,
}

impl PendingWrite {
    /// Block until the writer thread has handled this write
    pub fn wait(self) -> Result<()> {
        self.completion
            .recv()
            .map_err(|_| anyhow!("Override writer stopped before the write completed"))?
    }

    /// A write that failed before it could be queued
    pub(crate) fn failed(err: anyhow::Error) -> Self {
        let (done, completion) = mpsc::channel();
        let _ = done.send(Err(err));
        Self { completion }
    }
}

/// Owns the override file and the thread that writes it
pub struct OverrideWriter {
    path: PathBuf,
    sender: Option<Sender<WriteJob>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl OverrideWriter {
    /// Spawn the writer thread for `path`
    pub fn spawn(path: PathBuf) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<WriteJob>();
        let thread_path = path.clone();

        let handle = thread::Builder::new()
            .name("override-writer".to_string())
            .spawn(move || {
                debug!(path = %thread_path.display(), "Override writer started");
                for job in receiver {
                    let result = write_file(&thread_path, &job.contents);
                    match &result {
                        Ok(()) => info!(path = %thread_path.display(), "Saved config overrides"),
                        Err(e) => error!(
                            path = %thread_path.display(),
                            error = ?e,
                            "Failed to save config overrides"
                        ),
                    }
                    // Nobody listening is fine: the caller chose fire-and-forget
                    let _ = job.done.send(result);
                }
                debug!("Override writer stopped");
            })
            .context("Failed to spawn override writer thread")?;

        Ok(Self {
            path,
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue a full rewrite of the override file
    pub fn submit(&self, contents: String) -> PendingWrite {
        let (done, completion) = mpsc::channel();
        let job = WriteJob { contents, done };

        let sent = self.sender.as_ref().map(|sender| sender.send(job));
        if !matches!(sent, Some(Ok(()))) {
            error!(
                path = %self.path.display(),
                "Override writer is not running, change kept in memory only"
            );
        }
        PendingWrite { completion }
    }
}

impl Drop for OverrideWriter {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain queued writes and exit
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Override writer thread panicked");
            }
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write overrides to {:?}", path))
}
