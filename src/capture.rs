//! One owned capture process per interface, plus resolution of the
//! artifacts it writes. The producer rewrites its files continuously and
//! we never coordinate with it: missing, empty, and half-written artifacts
//! are all normal and handled by skipping the cycle.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::devices::AccessPoint;
use crate::snapshot;

/// Root under which every interface gets its own working directory.
pub const WORKDIR_ROOT: &str = ".airsnitch";

/// Extension of the parseable survey tables.
pub const SURVEY_EXT: &str = ".csv";
/// Extension of the raw capture that may hold a handshake.
pub const CAPTURE_EXT: &str = ".cap";

pub struct CaptureSession {
    workdir: PathBuf,
    prefix: String,
    process: Option<Child>,
}

impl CaptureSession {
    /// Spawns the capture tool for `interface`, optionally locked to one
    /// access point's bssid and channel. Creating the working directory is
    /// idempotent; the spawn happens exactly once per session.
    pub fn new(interface: &str, scope: Option<&AccessPoint>) -> Result<CaptureSession> {
        let workdir = Path::new(WORKDIR_ROOT).join(interface);
        fs::create_dir_all(&workdir).with_context(|| {
            format!("failed to create working directory {}", workdir.display())
        })?;

        let prefix = match scope {
            Some(ap) => format!("{}_{}", interface, ap.essid),
            None => interface.to_string(),
        };

        let mut command = Command::new("airodump-ng");
        command
            .arg(interface)
            .arg("--write")
            .arg(workdir.join(&prefix))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(ap) = scope {
            command.arg("--bssid").arg(&ap.bssid);
            command.arg("--channel").arg(ap.channel.to_string());
        }
        let process = command.spawn().context("failed to start airodump-ng")?;

        Ok(CaptureSession {
            workdir,
            prefix,
            process: Some(process),
        })
    }

    /// Session over an existing working directory with no owned process.
    /// Used by tests that stage artifacts by hand.
    #[cfg(test)]
    fn detached(workdir: PathBuf, prefix: &str) -> CaptureSession {
        CaptureSession {
            workdir,
            prefix: prefix.to_string(),
            process: None,
        }
    }

    /// Latest non-empty artifact with `extension`. The capture tool's
    /// numbering sorts lexicographically in creation order, so the
    /// greatest basename is the current file.
    pub fn latest_artifact(&self, extension: &str) -> Option<PathBuf> {
        latest_artifact(&self.workdir, &self.prefix, extension)
    }

    /// One parse attempt against the current survey artifact. `None` means
    /// nothing usable this cycle: no file yet, or a torn write.
    pub fn fetch(&self) -> Option<Vec<AccessPoint>> {
        let path = self.latest_artifact(SURVEY_EXT)?;
        snapshot::parse_survey(&path).ok()
    }

    pub fn stream(&self, refresh: Duration) -> SnapshotStream<'_> {
        SnapshotStream {
            session: self,
            refresh,
            emitted: self.latest_artifact(SURVEY_EXT),
        }
    }

    pub fn is_running(&mut self) -> bool {
        match self.process.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Kill the owned process. Nothing is flushed; the last artifact may
    /// stay incomplete, which the parser already treats as transient.
    /// Idempotent, and also run on drop.
    pub fn release(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

pub fn latest_artifact(dir: &Path, prefix: &str, extension: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let marker = format!("{}-", prefix);

    let mut best: Option<String> = None;
    for entry in entries.flatten() {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if !name.starts_with(&marker) || !name.ends_with(extension) {
            continue;
        }
        // Zero bytes: the producer created the file but has not written
        // it yet.
        match entry.metadata() {
            Ok(meta) if meta.len() > 0 => {}
            _ => continue,
        }
        if best.as_deref().map_or(true, |current| name.as_str() > current) {
            best = Some(name);
        }
    }
    best.map(|name| dir.join(name))
}

/// Debounced polling stream over a session's survey artifacts.
///
/// `tick` suspends for the refresh interval, then emits only when the
/// resolved artifact differs from the last one emitted. Artifacts that
/// already existed when the stream was created are treated as emitted, so
/// a stale file from an earlier run never surfaces.
///
/// The stream never ends on its own, even after the owned process dies;
/// whether that is the right lifetime is genuinely unclear, so the
/// never-terminating shape is kept and termination is owned by the
/// consumer: a wall-clock budget, a cancellation flag, or dropping the
/// session.
pub struct SnapshotStream<'a> {
    session: &'a CaptureSession,
    refresh: Duration,
    emitted: Option<PathBuf>,
}

impl SnapshotStream<'_> {
    /// One poll cycle. `None` means no new artifact, or a torn write that
    /// will be retried as long as the same artifact stays current.
    pub fn tick(&mut self) -> Option<Vec<AccessPoint>> {
        thread::sleep(self.refresh);
        self.poll()
    }

    fn poll(&mut self) -> Option<Vec<AccessPoint>> {
        let latest = self.session.latest_artifact(SURVEY_EXT)?;
        if self.emitted.as_deref() == Some(latest.as_path()) {
            return None;
        }
        let parsed = snapshot::parse_survey(&latest).ok()?;
        self.emitted = Some(latest);
        Some(parsed)
    }
}

impl Iterator for SnapshotStream<'_> {
    type Item = Vec<AccessPoint>;

    // Blocks until the next fresh snapshot; by design never yields `None`.
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(parsed) = self.tick() {
                return Some(parsed);
            }
        }
    }
}
