//! Parser for the dual-table survey file the capture tool rewrites while it
//! runs. The producer owns the file and may be mid-write whenever we read
//! it, so parsing is strict and every failure is transient: the session
//! layer skips the cycle and tries again on the next artifact.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::devices::{AccessPoint, Station, NOT_ASSOCIATED};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const AP_HEADER: [&str; 15] = [
    "BSSID",
    "First time seen",
    "Last time seen",
    "channel",
    "Speed",
    "Privacy",
    "Cipher",
    "Authentication",
    "Power",
    "# beacons",
    "# IV",
    "LAN IP",
    "ID-length",
    "ESSID",
    "Key",
];

const STATION_HEADER: [&str; 7] = [
    "Station MAC",
    "First time seen",
    "Last time seen",
    "Power",
    "# packets",
    "BSSID",
    "Probed ESSIDs",
];

#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    /// The file has not yet been written out as both tables. Happens for
    /// the lifetime of a capture whenever we read between two writes.
    #[error("survey file is not split into both tables yet")]
    Incomplete,
    #[error("malformed survey row: {0}")]
    Malformed(String),
    #[error("failed to read survey file")]
    Io(#[from] std::io::Error),
}

pub fn parse_survey(path: &Path) -> Result<Vec<AccessPoint>, SnapshotError> {
    let raw = fs::read_to_string(path)?;
    parse_survey_str(&raw)
}

/// Returns access points in first-row order, each carrying its stations in
/// row order. The whole collection is rebuilt per call; nothing is merged
/// with earlier parses.
pub fn parse_survey_str(raw: &str) -> Result<Vec<AccessPoint>, SnapshotError> {
    let normalized = raw.replace("\r\n", "\n");
    let trimmed = normalized.trim();

    let mut blocks = trimmed.split("\n\n");
    let (ap_block, station_block) = match (blocks.next(), blocks.next(), blocks.next()) {
        (Some(access_points), Some(stations), None) => (access_points, stations),
        _ => return Err(SnapshotError::Incomplete),
    };

    let mut access_points = parse_access_points(ap_block)?;
    attach_stations(station_block, &mut access_points)?;
    Ok(access_points)
}

fn parse_access_points(block: &str) -> Result<Vec<AccessPoint>, SnapshotError> {
    let mut lines = block.lines();
    check_header(lines.next(), &AP_HEADER)?;

    let mut access_points: Vec<AccessPoint> = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != AP_HEADER.len() {
            return Err(SnapshotError::Malformed(format!(
                "expected {} access point fields, got {}",
                AP_HEADER.len(),
                fields.len()
            )));
        }

        let access_point = AccessPoint {
            bssid: fields[0].to_string(),
            first_seen: parse_timestamp(fields[1])?,
            last_seen: parse_timestamp(fields[2])?,
            channel: parse_number(fields[3])?,
            speed: parse_number(fields[4])?,
            privacy: fields[5].to_string(),
            cipher: fields[6].to_string(),
            authentication: fields[7].to_string(),
            power: parse_number(fields[8])?,
            beacons: parse_number(fields[9])?,
            ivs: parse_number(fields[10])?,
            lan_ip: fields[11].to_string(),
            id_length: parse_number(fields[12])?,
            essid: fields[13].to_string(),
            key: fields[14].to_string(),
            stations: Vec::new(),
        };

        // A repeated bssid replaces the earlier row but keeps its position.
        match access_points.iter_mut().find(|ap| ap.bssid == access_point.bssid) {
            Some(existing) => *existing = access_point,
            None => access_points.push(access_point),
        }
    }
    Ok(access_points)
}

fn attach_stations(
    block: &str,
    access_points: &mut [AccessPoint],
) -> Result<(), SnapshotError> {
    let mut lines = block.lines();
    check_header(lines.next(), &STATION_HEADER)?;

    for line in lines {
        // The probed-ESSID list is the tail and may itself contain commas.
        let fields: Vec<&str> = line.splitn(STATION_HEADER.len(), ',').collect();
        if fields.len() != STATION_HEADER.len() {
            return Err(SnapshotError::Malformed(format!(
                "expected {} station fields, got {}",
                STATION_HEADER.len(),
                fields.len()
            )));
        }

        let bssid = fields[5].trim();
        if bssid == NOT_ASSOCIATED {
            continue;
        }

        let station = Station {
            mac: fields[0].trim().to_string(),
            first_seen: parse_timestamp(fields[1].trim())?,
            last_seen: parse_timestamp(fields[2].trim())?,
            power: parse_number(fields[3].trim())?,
            packets: parse_number(fields[4].trim())?,
            bssid: bssid.to_string(),
            probed_essids: fields[6]
                .split(',')
                .map(str::trim)
                .filter(|probe| !probe.is_empty())
                .map(str::to_string)
                .collect(),
        };

        match access_points.iter_mut().find(|ap| ap.bssid == bssid) {
            Some(ap) => ap.stations.push(station),
            None => {
                return Err(SnapshotError::Malformed(format!(
                    "station {} references unknown access point {}",
                    station.mac, bssid
                )))
            }
        }
    }
    Ok(())
}

fn check_header(line: Option<&str>, expected: &[&str]) -> Result<(), SnapshotError> {
    let line = line.ok_or(SnapshotError::Incomplete)?;
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields != expected {
        return Err(SnapshotError::Malformed(format!(
            "unexpected table header: {line}"
        )));
    }
    Ok(())
}

fn parse_timestamp(field: &str) -> Result<NaiveDateTime, SnapshotError> {
    NaiveDateTime::parse_from_str(field, TIMESTAMP_FORMAT)
        .map_err(|_| SnapshotError::Malformed(format!("bad timestamp: {field}")))
}

fn parse_number<T: FromStr>(field: &str) -> Result<T, SnapshotError> {
    field
        .parse()
        .map_err(|_| SnapshotError::Malformed(format!("bad number: {field}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURVEY: &str = "\
BSSID, First time seen, Last time seen, channel, Speed, Privacy, Cipher, Authentication, Power, # beacons, # IV, LAN IP, ID-length, ESSID, Key
AA:AA:AA:AA:AA:AA, 2026-08-01 10:00:00, 2026-08-01 10:05:00, 6, 54, WPA2, CCMP, PSK, -52, 120, 30, 0.0.0.0, 7, TestNet,
BB:BB:BB:BB:BB:BB, 2026-08-01 10:01:00, 2026-08-01 10:04:00, 11, 130, WPA2 WPA, CCMP TKIP, PSK, -71, 44, 0, 0.0.0.0, 9, OtherNet1,

Station MAC, First time seen, Last time seen, Power, # packets, BSSID, Probed ESSIDs
CC:CC:CC:CC:CC:CC, 2026-08-01 10:01:00, 2026-08-01 10:04:00, -60, 42, AA:AA:AA:AA:AA:AA, TestNet
DD:DD:DD:DD:DD:DD, 2026-08-01 10:02:00, 2026-08-01 10:03:00, -80, 3, (not associated), TestNet,FreeWifi
";

    #[test]
    fn parses_both_tables() {
        let access_points = parse_survey_str(SURVEY).unwrap();
        assert_eq!(access_points.len(), 2);

        let first = &access_points[0];
        assert_eq!(first.bssid, "AA:AA:AA:AA:AA:AA");
        assert_eq!(first.essid, "TestNet");
        assert_eq!(first.channel, 6);
        assert_eq!(first.id_length, 7);
        assert_eq!(first.stations.len(), 1);
        assert_eq!(first.stations[0].mac, "CC:CC:CC:CC:CC:CC");
        assert_eq!(first.stations[0].packets, 42);

        // Row order of the artifact is preserved.
        assert_eq!(access_points[1].bssid, "BB:BB:BB:BB:BB:BB");
        assert!(access_points[1].stations.is_empty());
    }

    #[test]
    fn parsing_is_deterministic() {
        let first = parse_survey_str(SURVEY).unwrap();
        let second = parse_survey_str(SURVEY).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unassociated_stations_are_dropped() {
        let access_points = parse_survey_str(SURVEY).unwrap();
        for ap in &access_points {
            assert!(ap.stations.iter().all(|s| s.mac != "DD:DD:DD:DD:DD:DD"));
        }
    }

    #[test]
    fn probed_essids_keep_their_commas() {
        let survey = SURVEY.replace(
            "AA:AA:AA:AA:AA:AA, TestNet\n",
            "AA:AA:AA:AA:AA:AA, TestNet,FreeWifi, CoffeeShop\n",
        );
        let access_points = parse_survey_str(&survey).unwrap();
        assert_eq!(
            access_points[0].stations[0].probed_essids,
            vec!["TestNet", "FreeWifi", "CoffeeShop"]
        );
    }

    #[test]
    fn single_block_is_incomplete() {
        let truncated = SURVEY.split("\n\n").next().unwrap();
        assert!(matches!(
            parse_survey_str(truncated),
            Err(SnapshotError::Incomplete)
        ));
    }

    #[test]
    fn extra_blank_line_is_incomplete() {
        let torn = format!("{}\n\nleftover", SURVEY.trim());
        assert!(matches!(
            parse_survey_str(&torn),
            Err(SnapshotError::Incomplete)
        ));
    }

    #[test]
    fn missing_field_fails_whole_parse() {
        // Drop the Key column from the first AP row.
        let torn = SURVEY.replace("0.0.0.0, 7, TestNet,", "0.0.0.0, 7, TestNet");
        assert!(matches!(
            parse_survey_str(&torn),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn unexpected_header_fails() {
        let torn = SURVEY.replace("# beacons", "beacons");
        assert!(matches!(
            parse_survey_str(&torn),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_power_sentinel_is_accepted() {
        let survey = SURVEY.replace("-52", "-1");
        let access_points = parse_survey_str(&survey).unwrap();
        assert_eq!(access_points[0].power, -1);
        assert_eq!(access_points[0].power_human(), "?");
    }

    #[test]
    fn station_referencing_unknown_bssid_fails() {
        let torn = SURVEY.replace(
            "42, AA:AA:AA:AA:AA:AA",
            "42, EE:EE:EE:EE:EE:EE",
        );
        assert!(matches!(
            parse_survey_str(&torn),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn crlf_artifacts_parse() {
        let crlf = SURVEY.replace('\n', "\r\n");
        assert_eq!(parse_survey_str(&crlf).unwrap(), parse_survey_str(SURVEY).unwrap());
    }

    #[test]
    fn hidden_network_has_empty_essid() {
        let survey = SURVEY.replace("7, TestNet,", "7, ,");
        let access_points = parse_survey_str(&survey).unwrap();
        assert!(access_points[0].is_hidden());
    }
}
