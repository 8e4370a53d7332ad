//! Detection of a completed WPA handshake inside a raw capture artifact.
//! Validity is decided entirely by the external validator's output; this
//! module only remembers which artifact has already been confirmed.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Line the validator prints once a capture holds a full handshake.
pub const HANDSHAKE_MARKER: &str =
    "Collected all necessary data to mount crack against WPA2/PSK passphrase.";

/// Synchronous; blocks for the lifetime of the validator process.
pub fn contains_valid_handshake(cap_file: &Path) -> Result<bool> {
    let output = Command::new("cowpatty")
        .arg("-c")
        .arg("-r")
        .arg(cap_file)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .context("failed to run cowpatty")?;
    Ok(String::from_utf8_lossy(&output.stdout).contains(HANDSHAKE_MARKER))
}

type Validator = fn(&Path) -> Result<bool>;

/// Reports the first sighting of a valid handshake exactly once per
/// distinct artifact. Re-checking a confirmed artifact is free; checking
/// anything else runs the validator and stalls the calling tick for the
/// duration of the external process.
pub struct HandshakeMonitor {
    confirmed: Option<PathBuf>,
    validator: Validator,
}

impl HandshakeMonitor {
    pub fn new() -> Self {
        Self::with_validator(contains_valid_handshake)
    }

    pub fn with_validator(validator: Validator) -> Self {
        HandshakeMonitor {
            confirmed: None,
            validator,
        }
    }

    /// `Ok(true)` exactly once per distinct artifact that validates.
    pub fn check(&mut self, cap_file: &Path) -> Result<bool> {
        if self.confirmed.as_deref() == Some(cap_file) {
            return Ok(false);
        }
        if (self.validator)(cap_file)? {
            self.confirmed = Some(cap_file.to_path_buf());
            return Ok(true);
        }
        Ok(false)
    }

    pub fn confirmed(&self) -> Option<&Path> {
        self.confirmed.as_deref()
    }
}

impl Default for HandshakeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_valid(_: &Path) -> Result<bool> {
        Ok(true)
    }

    fn never_valid(_: &Path) -> Result<bool> {
        Ok(false)
    }

    #[test]
    fn reports_new_detection_exactly_once() {
        let mut monitor = HandshakeMonitor::with_validator(always_valid);
        let cap = Path::new("wlan0mon-01.cap");

        assert!(monitor.check(cap).unwrap());
        assert!(!monitor.check(cap).unwrap());
        assert!(!monitor.check(cap).unwrap());
        assert_eq!(monitor.confirmed(), Some(cap));
    }

    #[test]
    fn a_new_artifact_detects_again() {
        let mut monitor = HandshakeMonitor::with_validator(always_valid);
        assert!(monitor.check(Path::new("wlan0mon-01.cap")).unwrap());
        assert!(monitor.check(Path::new("wlan0mon-02.cap")).unwrap());
        assert_eq!(monitor.confirmed(), Some(Path::new("wlan0mon-02.cap")));
    }

    #[test]
    fn invalid_artifact_leaves_state_unchanged() {
        let mut monitor = HandshakeMonitor::with_validator(never_valid);
        assert!(!monitor.check(Path::new("wlan0mon-01.cap")).unwrap());
        assert_eq!(monitor.confirmed(), None);
    }
}
