// End-to-end checks over the survey pipeline: artifact bytes in, ranked
// viable targets out, without touching any external tool.

use std::fs::File;
use std::io::Write;

use airsnitch::capture::{latest_artifact, SURVEY_EXT};
use airsnitch::snapshot::parse_survey_str;
use airsnitch::targets;

const SURVEY: &str = "\
BSSID, First time seen, Last time seen, channel, Speed, Privacy, Cipher, Authentication, Power, # beacons, # IV, LAN IP, ID-length, ESSID, Key
AA:AA:AA:AA:AA:AA, 2026-08-01 10:00:00, 2026-08-01 10:05:00, 6, 54, WPA2, CCMP, PSK, -52, 120, 30, 0.0.0.0, 7, TestNet,

Station MAC, First time seen, Last time seen, Power, # packets, BSSID, Probed ESSIDs
CC:CC:CC:CC:CC:CC, 2026-08-01 10:01:00, 2026-08-01 10:04:00, -60, 42, AA:AA:AA:AA:AA:AA, TestNet
";

#[test]
fn one_network_with_a_station_is_a_viable_target() {
    let access_points = parse_survey_str(SURVEY).unwrap();
    assert_eq!(access_points.len(), 1);

    let ap = &access_points[0];
    assert_eq!(ap.bssid, "AA:AA:AA:AA:AA:AA");
    assert_eq!(ap.essid, "TestNet");
    assert_eq!(ap.privacy, "WPA2");
    assert_eq!(ap.id_length, 7);
    assert_eq!(ap.stations.len(), 1);
    assert_eq!(ap.stations[0].bssid, ap.bssid);

    assert!(targets::is_viable(ap));
    assert_eq!(targets::viable_targets(&access_points).len(), 1);
}

#[test]
fn zero_id_length_is_not_viable() {
    let survey = SURVEY.replace("0.0.0.0, 7, TestNet,", "0.0.0.0, 0, TestNet,");
    let access_points = parse_survey_str(&survey).unwrap();
    assert_eq!(access_points.len(), 1);
    assert!(!targets::is_viable(&access_points[0]));
    assert!(targets::viable_targets(&access_points).is_empty());
}

#[test]
fn unassociated_station_appears_nowhere() {
    let survey = format!(
        "{}DD:DD:DD:DD:DD:DD, 2026-08-01 10:02:00, 2026-08-01 10:03:00, -80, 3, (not associated), FreeWifi\n",
        SURVEY
    );
    let access_points = parse_survey_str(&survey).unwrap();
    for ap in &access_points {
        assert!(ap.stations.iter().all(|s| s.mac != "DD:DD:DD:DD:DD:DD"));
    }
    // Still exactly the one associated station.
    assert_eq!(access_points[0].stations.len(), 1);
}

#[test]
fn latest_artifact_skips_the_zero_byte_candidate() {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in [
        ("wlan0mon-01.csv", SURVEY),
        ("wlan0mon-02.csv", SURVEY),
        ("wlan0mon-03.csv", ""),
    ] {
        let mut file = File::create(dir.path().join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    let latest = latest_artifact(dir.path(), "wlan0mon", SURVEY_EXT).unwrap();
    assert_eq!(latest, dir.path().join("wlan0mon-02.csv"));

    // The winner still parses into the same model the parser test saw.
    let raw = std::fs::read_to_string(latest).unwrap();
    let access_points = parse_survey_str(&raw).unwrap();
    assert!(targets::is_viable(&access_points[0]));
}
