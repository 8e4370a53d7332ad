//! Viability filter and ranking over one parsed snapshot. Pure views; the
//! snapshot itself is never reordered or mutated.

use crate::devices::AccessPoint;

/// Substring of the privacy column that marks a WPA-protected network.
const WPA_MARKER: &str = "WPA";

/// A network is worth going after when someone is actually talking to it,
/// it advertises an essid length, and it runs WPA.
pub fn is_viable(access_point: &AccessPoint) -> bool {
    !access_point.stations.is_empty()
        && access_point.id_length > 0
        && access_point.privacy.contains(WPA_MARKER)
}

/// Descending station count. Stable: equal counts keep snapshot order.
pub fn rank(access_points: &[AccessPoint]) -> Vec<&AccessPoint> {
    let mut ranked: Vec<&AccessPoint> = access_points.iter().collect();
    ranked.sort_by(|a, b| b.num_stations().cmp(&a.num_stations()));
    ranked
}

pub fn viable_targets(access_points: &[AccessPoint]) -> Vec<&AccessPoint> {
    rank(access_points)
        .into_iter()
        .filter(|ap| is_viable(ap))
        .collect()
}
