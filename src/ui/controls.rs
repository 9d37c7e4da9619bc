use imgui::{StyleColor, Ui};
use crate::core::track::format_timestamp;
use crate::playback::{PlaybackEngine, SPEED_STEPS};

/// Actions emitted by the transport controls
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransportAction {
    None,
    Play,
    Pause,
    SetSpeed(f64),
    Seek(usize),
}

/// Transport window: play/pause, speed buttons, scrub slider and the
/// timestamp readout
pub struct TransportWindow;

impl Default for TransportWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportWindow {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&mut self, ui: &Ui, engine: &PlaybackEngine, is_open: &mut bool) -> TransportAction {
        let mut action = TransportAction::None;

        ui.window("Transport")
            .size([860.0, 170.0], imgui::Condition::FirstUseEver)
            .position([10.0, 600.0], imgui::Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                action = self.render_content(ui, engine);
            });

        action
    }

    fn render_content(&mut self, ui: &Ui, engine: &PlaybackEngine) -> TransportAction {
        let mut action = TransportAction::None;
        let playing = engine.is_playing();

        {
            let _tok = ui.begin_disabled(playing);
            if ui.button_with_size("Play", [70.0, 0.0]) {
                action = TransportAction::Play;
            }
        }
        ui.same_line();
        {
            let _tok = ui.begin_disabled(!playing);
            if ui.button_with_size("Pause", [70.0, 0.0]) {
                action = TransportAction::Pause;
            }
        }

        // Speed buttons stay enabled mid-animation
        for &speed in SPEED_STEPS {
            let active = (engine.speed() - speed).abs() < f64::EPSILON;
            let _tok = if active {
                Some(ui.push_style_color(StyleColor::Text, [0.3, 0.9, 0.4, 1.0]))
            } else {
                None
            };
            if ui.button_with_size(format_speed(speed), [56.0, 0.0]) {
                action = TransportAction::SetSpeed(speed);
            }
            drop(_tok);
            ui.same_line();
        }
        ui.new_line();

        // Scrub slider, bound to the current index; a single disabled
        // notch when the track is empty
        ui.set_next_item_width(-1.0);
        match engine.track().last_index() {
            Some(last) => {
                let mut value = engine.current_index() as i32;
                if ui.slider("##scrub", 0, last as i32, &mut value) {
                    action = TransportAction::Seek(value as usize);
                }
            }
            None => {
                let _tok = ui.begin_disabled(true);
                let mut value = 0i32;
                ui.slider("##scrub", 0, 0, &mut value);
            }
        }

        match engine.current_timestamp() {
            Some(ts) => ui.text(format_timestamp(ts)),
            None => ui.text("No timestamp"),
        }

        action
    }
}

/// Format a speed multiplier the way it reads on a button ("0.25x", "1x")
fn format_speed(speed: f64) -> String {
    if speed.fract() == 0.0 {
        format!("{}x", speed as i64)
    } else {
        format!("{}x", speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_speed_labels() {
        let labels: Vec<String> = SPEED_STEPS.iter().map(|&s| format_speed(s)).collect();
        assert_eq!(labels, vec!["0.25x", "0.5x", "1x", "1.5x", "2x", "5x"]);
    }
}
