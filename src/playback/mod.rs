pub mod engine;

pub use engine::PlaybackEngine;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackState {
    Paused,
    Playing,
}

/// Speed multipliers offered by the control surface
pub const SPEED_STEPS: &[f64] = &[0.25, 0.5, 1.0, 1.5, 2.0, 5.0];
