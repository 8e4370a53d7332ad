//! Adapter discovery and monitor-mode toggling through the external
//! monitor-mode tool. The tool may rename the interface as part of a
//! toggle; when it does, the adapter record is corrected in place.

use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use regex::Regex;

use crate::devices::WifiAdapter;

const ADAPTER_HEADER: [&str; 4] = ["PHY", "Interface", "Driver", "Chipset"];

/// Lists attached wireless adapters. An empty listing is not an error;
/// callers poll until hardware shows up.
pub fn discover_adapters() -> Result<Vec<WifiAdapter>> {
    let output = run_airmon(&[])?;
    parse_adapter_listing(&output)
}

pub fn start_monitoring(adapter: &mut WifiAdapter) -> Result<()> {
    let output = run_airmon(&["start", &adapter.interface])?;

    let already = format!(
        "monitor mode already enabled for [{}]{}",
        adapter.phy, adapter.interface
    );
    if output.contains(&already) {
        return Ok(());
    }

    apply_renamed_interface(adapter, &output)
        .with_context(|| format!("enabling monitor mode on {} failed", adapter.interface))
}

pub fn stop_monitoring(adapter: &mut WifiAdapter) -> Result<()> {
    let output = run_airmon(&["stop", &adapter.interface])?;

    // The tool reports the station-mode vif it re-created; the rename
    // pattern below matches that line too.
    apply_renamed_interface(adapter, &output)
        .with_context(|| format!("disabling monitor mode on {} failed", adapter.interface))
}

fn run_airmon(args: &[&str]) -> Result<String> {
    let output = Command::new("airmon-ng")
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .context("failed to run airmon-ng")?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn parse_adapter_listing(output: &str) -> Result<Vec<WifiAdapter>> {
    let mut lines = output
        .lines()
        .map(|line| {
            line.split('\t')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .map(str::to_string)
                .collect::<Vec<String>>()
        })
        .filter(|fields| !fields.is_empty());

    let header = match lines.next() {
        Some(header) => header,
        None => return Ok(Vec::new()),
    };
    if header != ADAPTER_HEADER {
        bail!("unexpected adapter listing header: {header:?}");
    }

    let mut adapters = Vec::new();
    for fields in lines {
        match <[String; 4]>::try_from(fields) {
            Ok([phy, interface, driver, chipset]) => adapters.push(WifiAdapter {
                phy,
                interface,
                driver,
                chipset,
            }),
            Err(fields) => bail!("unexpected adapter listing row: {fields:?}"),
        }
    }
    Ok(adapters)
}

/// Extracts the vif name the tool ended up with and adopts it when it
/// differs from what we tracked. Output matching neither pattern means the
/// toggle went somewhere we cannot follow, which is fatal for the
/// operation that triggered it.
fn apply_renamed_interface(adapter: &mut WifiAdapter, output: &str) -> Result<()> {
    let generic = Regex::new(r"mode vif enabled on \[\w+\](\w+)")?;
    let scoped = Regex::new(&format!(
        r"monitor mode vif enabled for \[{}\]{} on \[\w+\](\w+)",
        regex::escape(&adapter.phy),
        regex::escape(&adapter.interface)
    ))?;

    let captures = match generic.captures(output).or_else(|| scoped.captures(output)) {
        Some(captures) => captures,
        None => bail!("unrecognized monitor-mode tool output:\n{output}"),
    };

    let interface = captures[1].to_string();
    if interface != adapter.interface {
        adapter.rename_interface(interface);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> WifiAdapter {
        WifiAdapter {
            phy: "phy0".to_string(),
            interface: "wlan0".to_string(),
            driver: "ath9k".to_string(),
            chipset: "Atheros AR9271".to_string(),
        }
    }

    #[test]
    fn parses_adapter_listing() {
        let listing = "\n\nPHY\tInterface\tDriver\tChipset\n\nphy0\twlan0\tath9k\tAtheros AR9271\n";
        let adapters = parse_adapter_listing(listing).unwrap();
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].phy, "phy0");
        assert_eq!(adapters[0].interface, "wlan0");
        assert_eq!(adapters[0].chipset, "Atheros AR9271");
    }

    #[test]
    fn empty_listing_yields_no_adapters() {
        assert!(parse_adapter_listing("\n\n").unwrap().is_empty());
    }

    #[test]
    fn bad_header_is_rejected() {
        let listing = "PHY\tIface\tDriver\tChipset\nphy0\twlan0\tath9k\tAtheros\n";
        assert!(parse_adapter_listing(listing).is_err());
    }

    #[test]
    fn rename_is_applied_from_tool_output() {
        let mut adapter = adapter();
        let output = "\n(mac80211 monitor mode vif enabled on [phy0]wlan0mon)\n";
        apply_renamed_interface(&mut adapter, output).unwrap();
        assert_eq!(adapter.interface, "wlan0mon");
        assert!(adapter.monitoring_enabled());
    }

    #[test]
    fn unchanged_interface_is_left_alone() {
        let mut adapter = adapter();
        let output = "(mac80211 station mode vif enabled on [phy0]wlan0)";
        apply_renamed_interface(&mut adapter, output).unwrap();
        assert_eq!(adapter.interface, "wlan0");
    }

    #[test]
    fn unrecognized_output_is_fatal() {
        let mut adapter = adapter();
        assert!(apply_renamed_interface(&mut adapter, "airmon-ng blew up").is_err());
        assert_eq!(adapter.interface, "wlan0");
    }
}
