use crate::core::Track;
use crate::playback::PlaybackState;
use std::time::Duration;
use tracing::info;

/// Playback engine for a loaded track
///
/// Advances one point per tick while playing; the tick period is
/// `1000 / speed` milliseconds of wall time, accumulated from the frame
/// loop's `update` calls. The accumulator is re-armed whenever the play
/// state or speed changes, so a new speed takes effect on the next tick
/// without moving the current index.
pub struct PlaybackEngine {
    track: Track,
    state: PlaybackState,
    speed: f64,
    current_index: usize,
    current_timestamp: Option<i64>,
    elapsed: Duration,
}

impl PlaybackEngine {
    pub fn new(track: Track) -> Self {
        let current_timestamp = track.first().map(|p| p.timestamp);
        Self {
            track,
            state: PlaybackState::Paused,
            speed: 1.0,
            current_index: 0,
            current_timestamp,
            elapsed: Duration::ZERO,
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_timestamp(&self) -> Option<i64> {
        self.current_timestamp
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Wall-time interval between ticks at the current speed
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.speed)
    }

    /// Start playback; no-op when already playing or the track is empty
    pub fn play(&mut self) {
        if self.is_playing() || self.track.is_empty() {
            return;
        }
        info!("Played");
        self.state = PlaybackState::Playing;
        self.elapsed = Duration::ZERO;
    }

    /// Pause playback; no-op when already paused
    pub fn pause(&mut self) {
        if !self.is_playing() {
            return;
        }
        info!("Paused");
        self.state = PlaybackState::Paused;
        self.elapsed = Duration::ZERO;
    }

    /// Set the speed multiplier; play state and index are untouched, the
    /// tick timer restarts at the new rate. Non-positive speeds are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if !(speed > 0.0) {
            return;
        }
        info!("Speed changed to {}x", speed);
        self.speed = speed;
        self.elapsed = Duration::ZERO;
    }

    /// Jump to a point, independent of play state. Indices past the end
    /// clamp to the last point.
    pub fn seek(&mut self, index: usize) {
        let Some(last) = self.track.last_index() else {
            return;
        };
        self.current_index = index.min(last);
        self.current_timestamp = self.track.get(self.current_index).map(|p| p.timestamp);
    }

    /// Advance playback by a slice of wall time (call each frame)
    pub fn update(&mut self, delta: Duration) {
        if !self.is_playing() || self.track.is_empty() {
            return;
        }

        self.elapsed += delta;
        let interval = self.tick_interval();

        while self.elapsed >= interval {
            self.elapsed -= interval;
            self.tick();
            if !self.is_playing() {
                self.elapsed = Duration::ZERO;
                break;
            }
        }
    }

    /// One playback step: advance the index, pause at the end of the track
    fn tick(&mut self) {
        let Some(last) = self.track.last_index() else {
            self.state = PlaybackState::Paused;
            return;
        };

        if self.current_index < last {
            self.current_index += 1;
            self.current_timestamp = self.track.get(self.current_index).map(|p| p.timestamp);
        }

        if self.current_index >= last {
            self.state = PlaybackState::Paused;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TrackPoint;

    fn three_point_track() -> Track {
        Track::new(vec![
            TrackPoint { latitude: 12.90, longitude: 74.91, timestamp: 1000, sequence_index: 0 },
            TrackPoint { latitude: 12.91, longitude: 74.92, timestamp: 2000, sequence_index: 1 },
            TrackPoint { latitude: 12.92, longitude: 74.93, timestamp: 3000, sequence_index: 2 },
        ])
    }

    #[test]
    fn test_initial_state() {
        let engine = PlaybackEngine::new(three_point_track());
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.current_timestamp(), Some(1000));
        assert!(!engine.is_playing());
        assert_eq!(engine.speed(), 1.0);
    }

    #[test]
    fn test_play_to_end_pauses() {
        let mut engine = PlaybackEngine::new(three_point_track());
        engine.play();
        assert!(engine.is_playing());

        // ~2000ms at 1x: two ticks, landing on the last point
        engine.update(Duration::from_millis(2000));
        assert_eq!(engine.current_index(), 2);
        assert_eq!(engine.current_timestamp(), Some(3000));
        assert!(!engine.is_playing());
    }

    #[test]
    fn test_ticks_accumulate_across_frames() {
        let mut engine = PlaybackEngine::new(three_point_track());
        engine.play();

        for _ in 0..62 {
            engine.update(Duration::from_millis(16));
        }
        // 992ms elapsed, not yet a full tick
        assert_eq!(engine.current_index(), 0);

        engine.update(Duration::from_millis(16));
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.current_timestamp(), Some(2000));
        assert!(engine.is_playing());
    }

    #[test]
    fn test_speed_scales_tick_period() {
        let mut engine = PlaybackEngine::new(three_point_track());
        engine.set_speed(5.0);
        engine.play();

        engine.update(Duration::from_millis(200));
        assert_eq!(engine.current_index(), 1);
    }

    #[test]
    fn test_speed_change_keeps_index_and_play_state() {
        let mut engine = PlaybackEngine::new(three_point_track());
        engine.play();
        engine.update(Duration::from_millis(1000));
        assert_eq!(engine.current_index(), 1);

        engine.set_speed(2.0);
        assert!(engine.is_playing());
        assert_eq!(engine.current_index(), 1);

        // New period is 500ms, counted from the speed change
        engine.update(Duration::from_millis(499));
        assert_eq!(engine.current_index(), 1);
        engine.update(Duration::from_millis(1));
        assert_eq!(engine.current_index(), 2);
    }

    #[test]
    fn test_seek_updates_timestamp_regardless_of_state() {
        let mut engine = PlaybackEngine::new(three_point_track());
        engine.seek(2);
        assert_eq!(engine.current_timestamp(), Some(3000));

        engine.seek(0);
        engine.play();
        engine.seek(1);
        assert_eq!(engine.current_index(), 1);
        assert_eq!(engine.current_timestamp(), Some(2000));
        assert!(engine.is_playing());
    }

    #[test]
    fn test_seek_clamps_past_end() {
        let mut engine = PlaybackEngine::new(three_point_track());
        engine.seek(99);
        assert_eq!(engine.current_index(), 2);
        assert_eq!(engine.current_timestamp(), Some(3000));
    }

    #[test]
    fn test_play_pause_are_guarded() {
        let mut engine = PlaybackEngine::new(three_point_track());
        engine.pause();
        assert!(!engine.is_playing());

        engine.play();
        engine.play();
        assert!(engine.is_playing());
        engine.pause();
        assert!(!engine.is_playing());
    }

    #[test]
    fn test_empty_track_is_inert() {
        let mut engine = PlaybackEngine::new(Track::default());
        assert_eq!(engine.current_timestamp(), None);

        engine.play();
        assert!(!engine.is_playing());

        engine.seek(3);
        assert_eq!(engine.current_index(), 0);

        engine.update(Duration::from_millis(5000));
        assert_eq!(engine.current_index(), 0);
        assert_eq!(engine.current_timestamp(), None);
    }

    #[test]
    fn test_nonpositive_speed_ignored() {
        let mut engine = PlaybackEngine::new(three_point_track());
        engine.set_speed(0.0);
        assert_eq!(engine.speed(), 1.0);
        engine.set_speed(-2.0);
        assert_eq!(engine.speed(), 1.0);
    }
}
