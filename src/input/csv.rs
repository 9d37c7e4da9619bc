use anyhow::{Context, Result};
use crate::core::{Track, TrackPoint};

/// Parse track points from CSV text
///
/// Expects a header row with at least these columns (extra columns are
/// ignored):
/// - latitude,longitude,eventGeneratedTime
///
/// Coordinates are decimal-degree strings, the timestamp is an integer
/// epoch-millisecond string. Malformed fields are kept as sentinels
/// (NaN for coordinates, 0 for the timestamp) rather than filtered, so a
/// bad row degrades rendering instead of shifting indices.
pub fn parse_rows(text: &str) -> Result<Track> {
    let mut rdr = csv::Reader::from_reader(text.as_bytes());

    let headers = rdr.headers()?;
    let (lat_idx, lon_idx, time_idx) = detect_columns(headers)?;

    let mut points = Vec::new();

    for (sequence_index, result) in rdr.records().enumerate() {
        let record = result.context("Failed to read CSV row")?;

        let latitude = record
            .get(lat_idx)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN);

        let longitude = record
            .get(lon_idx)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(f64::NAN);

        let timestamp = record
            .get(time_idx)
            .and_then(|s| s.trim().parse::<i64>().ok())
            .unwrap_or(0);

        points.push(TrackPoint { latitude, longitude, timestamp, sequence_index });
    }

    Ok(Track::new(points))
}

/// Detect column indices from CSV headers
fn detect_columns(headers: &csv::StringRecord) -> Result<(usize, usize, usize)> {
    let lat_idx = find_column(headers, &["latitude", "lat"])?;
    let lon_idx = find_column(headers, &["longitude", "lng", "lon"])?;
    let time_idx = find_column(headers, &["eventgeneratedtime", "timestamp", "time"])?;

    Ok((lat_idx, lon_idx, time_idx))
}

/// Find a column by checking possible names
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize> {
    for (idx, header) in headers.iter().enumerate() {
        let header_lower = header.trim().to_lowercase();
        if names.iter().any(|&name| header_lower == name) {
            return Ok(idx);
        }
    }

    anyhow::bail!("Could not find column with names: {:?}", names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_row_order() {
        let csv = "latitude,longitude,eventGeneratedTime\n\
                   12.90,74.91,1000\n\
                   12.91,74.92,2000\n\
                   12.92,74.93,3000";
        let track = parse_rows(csv).unwrap();

        assert_eq!(track.len(), 3);
        for (i, point) in track.points().iter().enumerate() {
            assert_eq!(point.sequence_index, i);
        }
        assert_eq!(track.get(0).unwrap().timestamp, 1000);
        assert_eq!(track.get(2).unwrap().latitude, 12.92);
        assert_eq!(track.get(2).unwrap().longitude, 74.93);
    }

    #[test]
    fn test_parse_header_only() {
        let track = parse_rows("latitude,longitude,eventGeneratedTime\n").unwrap();
        assert!(track.is_empty());
    }

    #[test]
    fn test_parse_ignores_extra_columns() {
        let csv = "deviceId,latitude,longitude,speed,eventGeneratedTime\n\
                   abc-1,12.90,74.91,14.2,1000";
        let track = parse_rows(csv).unwrap();
        assert_eq!(track.len(), 1);
        assert_eq!(track.get(0).unwrap().latitude, 12.90);
        assert_eq!(track.get(0).unwrap().timestamp, 1000);
    }

    #[test]
    fn test_malformed_fields_become_sentinels() {
        let csv = "latitude,longitude,eventGeneratedTime\n\
                   not-a-number,74.91,1000\n\
                   12.91,74.92,garbage";
        let track = parse_rows(csv).unwrap();

        // Rows are kept, not filtered
        assert_eq!(track.len(), 2);
        assert!(track.get(0).unwrap().latitude.is_nan());
        assert_eq!(track.get(0).unwrap().timestamp, 1000);
        assert_eq!(track.get(1).unwrap().timestamp, 0);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "latitude,longitude\n12.90,74.91";
        assert!(parse_rows(csv).is_err());
    }
}
