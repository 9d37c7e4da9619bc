use chrono::{DateTime, Local, TimeZone, Utc};

/// A single recorded GPS sample
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    /// Latitude in decimal degrees
    pub latitude: f64,

    /// Longitude in decimal degrees
    pub longitude: f64,

    /// Recording timestamp in epoch milliseconds
    pub timestamp: i64,

    /// Position of this sample in the source file (row order)
    pub sequence_index: usize,
}

impl TrackPoint {
    /// Get the timestamp as a UTC datetime, None if out of chrono's range
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// An ordered sequence of track points, built once per load and immutable
/// afterwards. The empty track is valid and leaves playback inert.
#[derive(Debug, Clone, Default)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackPoint> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&TrackPoint> {
        self.points.first()
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Index of the last point, None when empty
    pub fn last_index(&self) -> Option<usize> {
        self.points.len().checked_sub(1)
    }
}

/// Format an epoch-millisecond timestamp as local wall-clock time
pub fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Invalid timestamp".to_string(),
    }
}
