//! Persisted summary with marker files.
//!
//! `summary.json.pending` is created exclusively by the one caller computing
//! the summary and acts as a mutex; other callers poll until the summary or
//! a `summary.json.fail` marker shows up.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::config::SummaryConfig;
use crate::core::error::{Error, Result};
use crate::summary::engine::Summary;
use crate::utils::fs::{remove_if_exists, write_atomic};

pub const PENDING_SUFFIX: &str = ".pending";
pub const FAIL_SUFFIX: &str = ".fail";

/// State of the persisted summary of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    NotStarted,
    InProgress,
    Failed,
    Done,
}

impl std::fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Failed => "failed",
            Self::Done => "done",
        };
        write!(f, "{label}")
    }
}

/// Removes the pending marker when the computing caller is done
struct PendingMarker {
    path: PathBuf,
}

impl Drop for PendingMarker {
    fn drop(&mut self) {
        if let Err(e) = remove_if_exists(&self.path) {
            warn!("Could not remove {}: {}", self.path.display(), e);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryStore {
    path: PathBuf,
    pending: PathBuf,
    fail: PathBuf,
    config: SummaryConfig,
}

impl SummaryStore {
    pub fn new(path: impl Into<PathBuf>, config: SummaryConfig) -> Self {
        let path = path.into();
        let sibling = |suffix: &str| {
            let mut name = path.as_os_str().to_owned();
            name.push(suffix);
            PathBuf::from(name)
        };
        Self {
            pending: sibling(PENDING_SUFFIX),
            fail: sibling(FAIL_SUFFIX),
            path,
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status(&self) -> SummaryStatus {
        if self.path.is_file() {
            SummaryStatus::Done
        } else if self.pending.exists() {
            SummaryStatus::InProgress
        } else if self.fail.exists() {
            SummaryStatus::Failed
        } else {
            SummaryStatus::NotStarted
        }
    }

    /// Read the persisted summary, if any
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` or `Error::Json` if the file exists but cannot be read.
    pub fn load(&self) -> Result<Option<Summary>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Message recorded by the last failed computation
    pub fn failure(&self) -> Option<String> {
        std::fs::read_to_string(&self.fail).ok()
    }

    /// Return the stored summary, computing it if nobody has yet.
    ///
    /// If another caller is already computing, poll with exponential backoff
    /// instead of computing twice.
    ///
    /// # Errors
    ///
    /// Returns the error of `compute` (after leaving a fail marker),
    /// `Error::SummaryFailed` if the other caller failed, and
    /// `Error::SummaryBusy` if it is still running after every poll.
    pub fn get_or_compute<F>(&self, compute: F) -> Result<Summary>
    where
        F: FnOnce() -> Result<Summary>,
    {
        loop {
            if let Some(summary) = self.load()? {
                return Ok(summary);
            }
            if let Some(marker) = self.acquire()? {
                return self.run(marker, compute);
            }
            if let Some(summary) = self.wait()? {
                return Ok(summary);
            }
            debug!("Pending marker released without a result, retrying");
        }
    }

    /// Drop stale markers so the next call computes afresh
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if a marker cannot be removed.
    pub fn clear_markers(&self) -> Result<()> {
        remove_if_exists(&self.pending)?;
        remove_if_exists(&self.fail)?;
        Ok(())
    }

    fn acquire(&self) -> Result<Option<PendingMarker>> {
        match OpenOptions::new().write(true).create_new(true).open(&self.pending) {
            Ok(_) => {
                debug!("Acquired {}", self.pending.display());
                Ok(Some(PendingMarker {
                    path: self.pending.clone(),
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn run<F>(&self, marker: PendingMarker, compute: F) -> Result<Summary>
    where
        F: FnOnce() -> Result<Summary>,
    {
        remove_if_exists(&self.fail)?;
        let result = compute().and_then(|summary| {
            write_atomic(&self.path, |w: &mut dyn Write| {
                serde_json::to_writer(&mut *w, &summary)?;
                Ok::<_, Error>(())
            })?;
            Ok(summary)
        });

        match &result {
            Ok(_) => info!("Summary written to {}", self.path.display()),
            Err(e) => {
                warn!("Summary computation failed: {}", e);
                let report = e.report();
                write_atomic(&self.fail, |w: &mut dyn Write| {
                    serde_json::to_writer(&mut *w, &report)?;
                    Ok::<_, Error>(())
                })?;
            }
        }
        drop(marker);
        result
    }

    /// Poll while another caller holds the pending marker.
    ///
    /// Returns `None` when the marker disappeared without a summary or a
    /// failure being recorded.
    fn wait(&self) -> Result<Option<Summary>> {
        let mut delay = self.config.poll_initial_ms;
        for attempt in 1..=self.config.poll_attempts {
            debug!("Summary in progress, poll {} in {} ms", attempt, delay);
            std::thread::sleep(Duration::from_millis(delay));
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss
            )]
            let next = (delay as f64 * self.config.poll_backoff) as u64;
            delay = next.min(self.config.poll_max_ms);

            match self.status() {
                SummaryStatus::Done => return self.load(),
                SummaryStatus::Failed => {
                    let message = self
                        .failure()
                        .unwrap_or_else(|| "unknown failure".to_string());
                    return Err(Error::SummaryFailed(message));
                }
                SummaryStatus::NotStarted => return Ok(None),
                SummaryStatus::InProgress => {}
            }
        }
        Err(Error::SummaryBusy {
            attempts: self.config.poll_attempts,
        })
    }
}
