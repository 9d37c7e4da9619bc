//! Map surface rendered into an imgui draw list
//!
//! The track is drawn on a Web Mercator plane at a fixed zoom level with a
//! graticule background. Tile imagery is out of scope; a missing provider
//! key is surfaced as a notice on the map itself.

use imgui::Ui;
use crate::core::Track;
use crate::core::track::format_timestamp;

/// Square tile size in pixels, the usual web-map convention
pub const TILE_SIZE: f64 = 256.0;

/// Web Mercator is undefined at the poles; clamp like every slippy map does
const MAX_LATITUDE: f64 = 85.05112878;

/// Fixed view zoom
const DEFAULT_ZOOM: f64 = 10.0;

/// Starting view center until a track is loaded
pub const DEFAULT_CENTER: LatLon = LatLon { lat: 12.9294916, lon: 74.9173533 };

/// Path prefix color (#7C4DFF)
const PATH_COLOR: [f32; 4] = [0.486, 0.302, 1.0, 1.0];

/// Map-provider API key, baked in at build time. Without it the surface
/// runs degraded (grid only) and says so.
const MAPS_API_KEY: Option<&str> = option_env!("TRACKVIZ_MAPS_API_KEY");

/// A geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// World size in pixels at a zoom level
fn world_scale(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project a coordinate onto the Web Mercator pixel plane
pub fn project(pos: LatLon, zoom: f64) -> [f64; 2] {
    let scale = world_scale(zoom);
    let lat = pos.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (pos.lon + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * scale;
    [x, y]
}

/// Inverse of [`project`]
pub fn unproject(world: [f64; 2], zoom: f64) -> LatLon {
    let scale = world_scale(zoom);

    let lon = world[0] / scale * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * world[1] / scale);
    let lat = n.sinh().atan().to_degrees();
    LatLon { lat, lon }
}

/// Graticule spacing in degrees, chosen so grid lines stay readable
fn graticule_step(zoom: f64) -> f64 {
    const STEPS: &[f64] = &[
        0.01, 0.02, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 45.0,
    ];
    let px_per_degree = world_scale(zoom) / 360.0;
    for &step in STEPS {
        if step * px_per_degree >= 80.0 {
            return step;
        }
    }
    45.0
}

/// View state for the map surface
///
/// The center starts pinned: every frame snaps the view back to the pinned
/// coordinate, mirroring a map widget that is handed a fixed center on each
/// render. The first user drag clears the pin for the rest of the session
/// and panning takes over.
pub struct MapView {
    pinned_center: Option<LatLon>,
    center: LatLon,
    zoom: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self::new()
    }
}

impl MapView {
    pub fn new() -> Self {
        Self {
            pinned_center: Some(DEFAULT_CENTER),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }

    pub fn center(&self) -> LatLon {
        self.center
    }

    pub fn pinned_center(&self) -> Option<LatLon> {
        self.pinned_center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Re-pin the view on a new coordinate, but never override a user pan
    pub fn recenter_if_pinned(&mut self, pos: LatLon) {
        if self.pinned_center.is_some() {
            self.pinned_center = Some(pos);
            self.center = pos;
        }
    }

    /// Snap to the pinned center while one is set (call once per frame)
    pub fn begin_frame(&mut self) {
        if let Some(pinned) = self.pinned_center {
            self.center = pinned;
        }
    }

    /// Pan by a screen-pixel delta; the first pan unpins the center
    pub fn pan_by(&mut self, delta: [f32; 2]) {
        if self.pinned_center.take().is_some() {
            tracing::debug!("map center unpinned");
        }

        let world = project(self.center, self.zoom);
        // Dragging content right moves the center west
        self.center = unproject(
            [world[0] - delta[0] as f64, world[1] - delta[1] as f64],
            self.zoom,
        );
    }
}

/// Map window drawing the track, playback marker and graticule
pub struct MapWindow {
    view: MapView,
}

impl Default for MapWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl MapWindow {
    pub fn new() -> Self {
        Self { view: MapView::new() }
    }

    pub fn view_mut(&mut self) -> &mut MapView {
        &mut self.view
    }

    pub fn render(
        &mut self,
        ui: &Ui,
        track: &Track,
        current_index: usize,
        current_timestamp: Option<i64>,
        is_open: &mut bool,
    ) {
        ui.window("Map")
            .size([860.0, 560.0], imgui::Condition::FirstUseEver)
            .position([10.0, 30.0], imgui::Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                self.render_content(ui, track, current_index, current_timestamp);
            });
    }

    fn render_content(
        &mut self,
        ui: &Ui,
        track: &Track,
        current_index: usize,
        current_timestamp: Option<i64>,
    ) {
        self.view.begin_frame();

        let size = ui.content_region_avail();
        if size[0] < 50.0 || size[1] < 50.0 {
            ui.text("Window too small");
            return;
        }

        let origin = ui.cursor_screen_pos();
        ui.invisible_button("map_surface", size);

        // Drag to pan
        if ui.is_item_active() {
            let delta = ui.io().mouse_delta;
            if delta[0] != 0.0 || delta[1] != 0.0 {
                self.view.pan_by(delta);
            }
        }

        let draw_list = ui.get_window_draw_list();

        // Surface background
        draw_list
            .add_rect(origin, [origin[0] + size[0], origin[1] + size[1]], [0.09, 0.10, 0.12, 1.0])
            .filled(true)
            .build();

        let zoom = self.view.zoom();
        let center_world = project(self.view.center(), zoom);
        let half = [size[0] as f64 / 2.0, size[1] as f64 / 2.0];

        let to_screen = |pos: LatLon| -> [f32; 2] {
            let world = project(pos, zoom);
            [
                (origin[0] as f64 + half[0] + world[0] - center_world[0]) as f32,
                (origin[1] as f64 + half[1] + world[1] - center_world[1]) as f32,
            ]
        };

        self.draw_graticule(&draw_list, origin, size, center_world, half);

        // Path prefix up to the playback position
        if !track.is_empty() {
            let end = current_index.min(track.len() - 1);
            let points = track.points();
            for i in 1..=end {
                let a = to_screen(LatLon { lat: points[i - 1].latitude, lon: points[i - 1].longitude });
                let b = to_screen(LatLon { lat: points[i].latitude, lon: points[i].longitude });
                draw_list.add_line(a, b, PATH_COLOR).thickness(3.0).build();
            }

            // Marker with timestamp label; malformed coordinates degenerate
            // silently, exactly like the label-less NaN case in a browser map
            if let (Some(ts), Some(point)) = (current_timestamp, track.get(end)) {
                let pos = to_screen(LatLon { lat: point.latitude, lon: point.longitude });

                draw_list
                    .add_circle(pos, 7.0, PATH_COLOR)
                    .filled(true)
                    .num_segments(20)
                    .build();
                draw_list
                    .add_circle(pos, 7.0, [1.0, 1.0, 1.0, 0.9])
                    .thickness(1.5)
                    .num_segments(20)
                    .build();

                let label = format_timestamp(ts);
                let text_width = label.len() as f32 * 7.0;
                draw_list
                    .add_rect(
                        [pos[0] - text_width / 2.0 - 4.0, pos[1] - 32.0],
                        [pos[0] + text_width / 2.0 + 4.0, pos[1] - 14.0],
                        [0.15, 0.15, 0.18, 0.85],
                    )
                    .filled(true)
                    .rounding(4.0)
                    .build();
                draw_list.add_text(
                    [pos[0] - text_width / 2.0, pos[1] - 30.0],
                    [0.95, 0.95, 0.98, 1.0],
                    &label,
                );
            }
        }

        // Degraded-surface notice when no provider key was baked in
        if MAPS_API_KEY.is_none() {
            draw_list.add_text(
                [origin[0] + 8.0, origin[1] + size[1] - 20.0],
                [0.6, 0.6, 0.65, 0.8],
                "Map imagery unavailable: TRACKVIZ_MAPS_API_KEY not set",
            );
        }
    }

    fn draw_graticule(
        &self,
        draw_list: &imgui::DrawListMut,
        origin: [f32; 2],
        size: [f32; 2],
        center_world: [f64; 2],
        half: [f64; 2],
    ) {
        let zoom = self.view.zoom();
        let step = graticule_step(zoom);
        let line_color = [0.2, 0.22, 0.26, 1.0];
        let label_color = [0.45, 0.48, 0.55, 0.8];

        let top_left = unproject([center_world[0] - half[0], center_world[1] - half[1]], zoom);
        let bottom_right = unproject([center_world[0] + half[0], center_world[1] + half[1]], zoom);

        // Meridians
        let mut lon = (top_left.lon / step).floor() * step;
        let mut guard = 0;
        while lon <= bottom_right.lon && guard < 256 {
            let world_x = project(LatLon { lat: 0.0, lon }, zoom)[0];
            let x = (origin[0] as f64 + half[0] + world_x - center_world[0]) as f32;
            draw_list
                .add_line([x, origin[1]], [x, origin[1] + size[1]], line_color)
                .build();
            draw_list.add_text(
                [x + 3.0, origin[1] + size[1] - 36.0],
                label_color,
                format!("{:.2}", lon),
            );
            lon += step;
            guard += 1;
        }

        // Parallels (top of the view has the larger latitude)
        let mut lat = (bottom_right.lat / step).floor() * step;
        let mut guard = 0;
        while lat <= top_left.lat && guard < 256 {
            let world_y = project(LatLon { lat, lon: 0.0 }, zoom)[1];
            let y = (origin[1] as f64 + half[1] + world_y - center_world[1]) as f32;
            draw_list
                .add_line([origin[0], y], [origin[0] + size[0], y], line_color)
                .build();
            draw_list.add_text([origin[0] + 4.0, y + 2.0], label_color, format!("{:.2}", lat));
            lat += step;
            guard += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_world_center() {
        let world = project(LatLon { lat: 0.0, lon: 0.0 }, 10.0);
        let scale = world_scale(10.0);
        assert!((world[0] - scale / 2.0).abs() < 1e-6);
        assert!((world[1] - scale / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_project_unproject_roundtrip() {
        let pos = LatLon { lat: 12.9294916, lon: 74.9173533 };
        let back = unproject(project(pos, 10.0), 10.0);
        assert!((back.lat - pos.lat).abs() < 1e-9);
        assert!((back.lon - pos.lon).abs() < 1e-9);
    }

    #[test]
    fn test_project_clamps_poles() {
        let north = project(LatLon { lat: 90.0, lon: 0.0 }, 10.0);
        assert!(north[1].abs() < 1.0);
        let south = project(LatLon { lat: -90.0, lon: 0.0 }, 10.0);
        assert!((south[1] - world_scale(10.0)).abs() < 1.0);
    }

    #[test]
    fn test_graticule_step_is_readable() {
        // At zoom 10 one degree is ~728px; 0.2 deg clears the 80px floor
        assert_eq!(graticule_step(10.0), 0.2);
        assert_eq!(graticule_step(0.0), 45.0);
    }

    #[test]
    fn test_pan_unpins_once() {
        let mut view = MapView::new();
        assert!(view.pinned_center().is_some());

        view.pan_by([10.0, 0.0]);
        assert!(view.pinned_center().is_none());
        let after_first = view.center();

        // Second pan moves the view but the pin stays cleared
        view.pan_by([0.0, 10.0]);
        assert!(view.pinned_center().is_none());
        assert_ne!(view.center(), after_first);
    }

    #[test]
    fn test_begin_frame_snaps_while_pinned() {
        let mut view = MapView::new();
        view.begin_frame();
        assert_eq!(view.center(), DEFAULT_CENTER);
    }

    #[test]
    fn test_recenter_only_while_pinned() {
        let target = LatLon { lat: 48.85, lon: 2.35 };

        let mut view = MapView::new();
        view.recenter_if_pinned(target);
        assert_eq!(view.pinned_center(), Some(target));
        assert_eq!(view.center(), target);

        let mut panned = MapView::new();
        panned.pan_by([5.0, 5.0]);
        let center = panned.center();
        panned.recenter_if_pinned(target);
        assert_eq!(panned.pinned_center(), None);
        assert_eq!(panned.center(), center);
    }

    #[test]
    fn test_pan_moves_center_west_on_right_drag() {
        let mut view = MapView::new();
        let before = view.center();
        view.pan_by([50.0, 0.0]);
        assert!(view.center().lon < before.lon);
        assert!((view.center().lat - before.lat).abs() < 1e-9);
    }
}
