use chrono::NaiveDateTime;
use std::fmt;

/// Marker bssid the capture tool writes for stations that are not joined
/// to any network. Rows carrying it never attach to an access point.
pub const NOT_ASSOCIATED: &str = "(not associated)";

// airmon-ng renames an interface with this suffix when it creates the
// monitor-mode vif.
const MONITOR_SUFFIX: &str = "mon";

/// Sentinel the capture tables use for "unknown" signal readings.
pub const UNKNOWN_POWER: i32 = -1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WifiAdapter {
    pub phy: String,
    pub interface: String,
    pub driver: String,
    pub chipset: String,
}

impl WifiAdapter {
    /// Derived from the interface naming convention, never stored.
    pub fn monitoring_enabled(&self) -> bool {
        self.interface.ends_with(MONITOR_SUFFIX)
    }

    /// Adopt the interface name the monitor-mode tool reports after a
    /// toggle. `monitor::apply_renamed_interface` is the only caller; any
    /// other mutation of an adapter is a bug.
    pub fn rename_interface(&mut self, interface: String) {
        self.interface = interface;
    }
}

impl fmt::Display for WifiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "phy: {}\tinterface: {}\tdriver: {}\tchipset: {}",
            self.phy, self.interface, self.driver, self.chipset
        )
    }
}

/// One observed network. Rebuilt from scratch on every snapshot parse;
/// identity across polling cycles is the bssid, never the value itself.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessPoint {
    pub bssid: String,
    pub first_seen: NaiveDateTime,
    pub last_seen: NaiveDateTime,
    pub channel: i32,
    pub speed: i32,
    pub privacy: String,
    pub cipher: String,
    pub authentication: String,
    pub power: i32,
    pub beacons: u64,
    pub ivs: u64,
    pub lan_ip: String,
    pub id_length: u32,
    pub essid: String,
    pub key: String,
    pub stations: Vec<Station>,
}

impl AccessPoint {
    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }

    pub fn power_human(&self) -> String {
        power_human(self.power)
    }

    /// Hidden networks beacon an empty essid but still advertise the
    /// length of the real one.
    pub fn is_hidden(&self) -> bool {
        self.essid.is_empty() && self.id_length > 0
    }
}

/// A client seen talking to one access point.
#[derive(Clone, Debug, PartialEq)]
pub struct Station {
    pub mac: String,
    pub first_seen: NaiveDateTime,
    pub last_seen: NaiveDateTime,
    pub power: i32,
    pub packets: u64,
    pub bssid: String,
    pub probed_essids: Vec<String>,
}

impl Station {
    pub fn power_human(&self) -> String {
        power_human(self.power)
    }

    pub fn probes_human(&self) -> String {
        self.probed_essids.join(", ")
    }
}

pub fn power_human(power: i32) -> String {
    if power == UNKNOWN_POWER {
        "?".to_string()
    } else {
        format!("{} dBm", power)
    }
}

/// Re-key into the current snapshot. Consumers tracking a network across
/// polls must do this every cycle instead of holding on to an old value.
pub fn find_by_bssid<'a>(access_points: &'a [AccessPoint], bssid: &str) -> Option<&'a AccessPoint> {
    access_points.iter().find(|ap| ap.bssid == bssid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn sample_ap(bssid: &str) -> AccessPoint {
        AccessPoint {
            bssid: bssid.to_string(),
            first_seen: timestamp(),
            last_seen: timestamp(),
            channel: 6,
            speed: 54,
            privacy: "WPA2".to_string(),
            cipher: "CCMP".to_string(),
            authentication: "PSK".to_string(),
            power: -52,
            beacons: 10,
            ivs: 0,
            lan_ip: "0.0.0.0".to_string(),
            id_length: 7,
            essid: "TestNet".to_string(),
            key: String::new(),
            stations: Vec::new(),
        }
    }

    #[test]
    fn monitoring_derived_from_interface_suffix() {
        let mut adapter = WifiAdapter {
            phy: "phy0".to_string(),
            interface: "wlan0".to_string(),
            driver: "ath9k".to_string(),
            chipset: "Atheros".to_string(),
        };
        assert!(!adapter.monitoring_enabled());

        adapter.rename_interface("wlan0mon".to_string());
        assert!(adapter.monitoring_enabled());
    }

    #[test]
    fn power_uses_unknown_sentinel() {
        let mut ap = sample_ap("AA:AA:AA:AA:AA:AA");
        assert_eq!(ap.power_human(), "-52 dBm");

        ap.power = UNKNOWN_POWER;
        assert_eq!(ap.power_human(), "?");
    }

    #[test]
    fn find_by_bssid_rekeys_into_snapshot() {
        let snapshot = vec![sample_ap("AA:AA:AA:AA:AA:AA"), sample_ap("BB:BB:BB:BB:BB:BB")];
        assert!(find_by_bssid(&snapshot, "BB:BB:BB:BB:BB:BB").is_some());
        assert!(find_by_bssid(&snapshot, "CC:CC:CC:CC:CC:CC").is_none());
    }

    #[test]
    fn hidden_network_detection() {
        let mut ap = sample_ap("AA:AA:AA:AA:AA:AA");
        assert!(!ap.is_hidden());

        ap.essid = String::new();
        assert!(ap.is_hidden());
    }
}
