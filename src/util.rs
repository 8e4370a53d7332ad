use chrono::{Local, NaiveDateTime};

/// Compact "how long ago" rendering for last-seen columns. Artifact
/// timestamps are local time without an offset.
pub fn elapsed_human(seen: NaiveDateTime) -> String {
    let elapsed = Local::now().naive_local().signed_duration_since(seen);
    let seconds = elapsed.num_seconds().max(0);
    if seconds > 3600 {
        format!("{}h", seconds / 3600)
    } else if seconds > 60 {
        format!("{}m", seconds / 60)
    } else {
        format!("{}s", seconds)
    }
}

/// Width of each column when every cell and its header must fit.
pub fn max_column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut max_widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < max_widths.len() {
                max_widths[i] = max_widths[i].max(cell.chars().count());
            }
        }
    }

    max_widths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_cover_headers_and_cells() {
        let headers = vec!["BSSID".to_string(), "CH".to_string()];
        let rows = vec![
            vec!["AA:AA:AA:AA:AA:AA".to_string(), "6".to_string()],
            vec!["BB:BB:BB:BB:BB:BB".to_string(), "112".to_string()],
        ];
        assert_eq!(max_column_widths(&headers, &rows), vec![17, 3]);
    }

    #[test]
    fn widths_fall_back_to_headers() {
        let headers = vec!["Interface".to_string()];
        assert_eq!(max_column_widths(&headers, &[]), vec![9]);
    }
}
