//! Headless discovery: watch the air for a fixed wall-clock budget and
//! report the viable targets seen, without bringing up the interactive UI.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::capture::CaptureSession;
use crate::devices::{AccessPoint, WifiAdapter};
use crate::monitor;
use crate::status::{MessageLog, MessageType, StatusMessage};
use crate::targets;

/// Polls until the budget runs out or `cancel` flips, logging each fresh
/// snapshot's viable-target ranking. Returns the most recent snapshot
/// observed, which may be empty when nothing ever parsed within budget.
pub fn run_survey(
    adapter: &mut WifiAdapter,
    budget: Duration,
    refresh: Duration,
    cancel: Arc<AtomicBool>,
    log: &mut MessageLog,
) -> Result<Vec<AccessPoint>> {
    if !adapter.monitoring_enabled() {
        log.add_message(StatusMessage::new(
            MessageType::Status,
            format!("Enabling monitor mode on {}", adapter.interface),
        ));
        monitor::start_monitoring(adapter)?;
        log.add_message(StatusMessage::new(
            MessageType::Status,
            format!("Monitoring on {}", adapter.interface),
        ));
    }

    let session = CaptureSession::new(&adapter.interface, None)?;
    log.add_message(StatusMessage::new(
        MessageType::Status,
        format!("Looking for viable targets on {}", adapter.interface),
    ));

    let deadline = Instant::now() + budget;
    let mut stream = session.stream(refresh);
    let mut latest: Vec<AccessPoint> = Vec::new();

    while Instant::now() < deadline && !cancel.load(Ordering::SeqCst) {
        let snapshot = match stream.tick() {
            Some(snapshot) => snapshot,
            None => continue,
        };

        log.add_message(StatusMessage::new(
            MessageType::Status,
            format!("Access points: {}", snapshot.len()),
        ));
        for target in targets::viable_targets(&snapshot) {
            log.add_message(StatusMessage::new(
                MessageType::Info,
                format!(
                    "- {} [{}] stations: {}",
                    target.essid,
                    target.bssid,
                    target.num_stations()
                ),
            ));
        }

        latest = snapshot;
    }

    // Budget exhausted (or cancelled): the best we have is the most
    // recent snapshot, not a longer wait.
    Ok(latest)
}
