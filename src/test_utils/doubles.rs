//! In-memory stand-ins for the capabilities the update protocol depends on.

use crate::core::UpdateError;
use crate::upgrade::backup::Renamer;
use crate::upgrade::process::{ProcessLauncher, ProcessSpec};
use crate::upgrade::remote::{Remote, RemoteStream};
use chrono::{DateTime, Utc};
use reqwest::Url;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

const CHUNK_SIZE: usize = 1024;

/// Records every spawn instead of starting a process.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    spawned: Mutex<Vec<ProcessSpec>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Specs passed to [`ProcessLauncher::spawn_detached`], in call order.
    pub fn spawned(&self) -> Vec<ProcessSpec> {
        self.spawned.lock().map(|specs| specs.clone()).unwrap_or_default()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn spawn_detached(&self, spec: &ProcessSpec) -> Result<(), UpdateError> {
        if let Ok(mut specs) = self.spawned.lock() {
            specs.push(spec.clone());
        }
        Ok(())
    }
}

/// A [`Renamer`] simulating a file held open by another process.
///
/// The first `n` renames fail with `PermissionDenied`; later ones go to the
/// real filesystem.
#[derive(Debug)]
pub struct LockedRenamer {
    remaining_failures: AtomicU32,
    calls: AtomicU32,
}

impl LockedRenamer {
    pub const fn failing(failures: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    pub const fn always_locked() -> Self {
        Self::failing(u32::MAX)
    }

    /// Number of rename attempts so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Renamer for LockedRenamer {
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let locked = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if locked {
            Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "file is locked by another process",
            ))
        } else {
            std::fs::rename(from, to)
        }
    }
}

/// A [`Remote`] serving fixed bytes and an optional modification time.
#[derive(Debug)]
pub struct FakeRemote {
    content: Option<Vec<u8>>,
    truncated: bool,
    modified: Option<DateTime<Utc>>,
    opens: AtomicU32,
    queries: AtomicU32,
}

impl FakeRemote {
    pub const fn new(content: Vec<u8>) -> Self {
        Self {
            content: Some(content),
            truncated: false,
            modified: None,
            opens: AtomicU32::new(0),
            queries: AtomicU32::new(0),
        }
    }

    /// A remote that fails every request.
    pub const fn unreachable() -> Self {
        Self {
            content: None,
            truncated: false,
            modified: None,
            opens: AtomicU32::new(0),
            queries: AtomicU32::new(0),
        }
    }

    /// A remote whose stream delivers `partial` and then breaks off.
    pub const fn truncated(partial: Vec<u8>) -> Self {
        Self {
            content: Some(partial),
            truncated: true,
            modified: None,
            opens: AtomicU32::new(0),
            queries: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn modified(mut self, time: DateTime<Utc>) -> Self {
        self.modified = Some(time);
        self
    }

    /// Number of times the remote was opened.
    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of last-modified queries.
    pub fn queries(&self) -> u32 {
        self.queries.load(Ordering::SeqCst)
    }

    fn unreachable_error(url: &Url) -> UpdateError {
        UpdateError::Fetch {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        }
    }
}

impl Remote for FakeRemote {
    type Stream = MemoryStream;

    async fn open(&self, url: &Url) -> Result<MemoryStream, UpdateError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let content = self.content.as_ref().ok_or_else(|| Self::unreachable_error(url))?;
        Ok(MemoryStream {
            chunks: content.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect(),
            failure: self.truncated.then(|| UpdateError::Fetch {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            }),
        })
    }

    async fn last_modified(&self, url: &Url) -> Result<Option<DateTime<Utc>>, UpdateError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.content.is_none() {
            return Err(Self::unreachable_error(url));
        }
        Ok(self.modified)
    }
}

/// Stream returned by [`FakeRemote`].
#[derive(Debug)]
pub struct MemoryStream {
    chunks: VecDeque<Vec<u8>>,
    failure: Option<UpdateError>,
}

impl RemoteStream for MemoryStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, UpdateError> {
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(Some(chunk));
        }
        match self.failure.take() {
            Some(error) => Err(error),
            None => Ok(None),
        }
    }
}
