mod core;
mod input;
mod playback;
mod ui;

use crate::core::Track;
use input::load_track;
use playback::PlaybackEngine;
use ui::{FileDialogs, LatLon, MapWindow, TransportAction, TransportWindow};

use imgui::{Context, FontConfig, FontSource};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

use glutin::prelude::*;
use glutin::display::GetGlDisplay;
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasRawWindowHandle;
use glow::HasContext;

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::time::Instant;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Result of a background track load
enum LoadUpdate {
    Complete(Track),
    Error(String),
}

/// Persistent application settings
#[derive(Serialize, Deserialize)]
struct AppSettings {
    last_track: Option<PathBuf>,
    speed: f64,
    show_map: bool,
    show_transport: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            last_track: None,
            speed: 1.0,
            show_map: true,
            show_transport: true,
        }
    }
}

impl AppSettings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("track-viz").join("settings.json"))
    }

    fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(contents) = fs::read_to_string(&path) {
                    if let Ok(settings) = serde_json::from_str(&contents) {
                        return settings;
                    }
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                let _ = fs::create_dir_all(parent);
            }
            if let Ok(json) = serde_json::to_string_pretty(self) {
                let _ = fs::write(&path, json);
            }
        }
    }
}

struct AppState {
    playback: PlaybackEngine,
    map: MapWindow,
    transport: TransportWindow,
    track_path: Option<PathBuf>,
    status_message: Option<String>,
    // Window visibility
    show_map: bool,
    show_transport: bool,
    show_open_pending: bool,
    // Async loading state
    loading: bool,
    loading_receiver: Option<Receiver<LoadUpdate>>,
}

impl AppState {
    fn new() -> Self {
        let settings = AppSettings::load();

        let mut playback = PlaybackEngine::new(Track::default());
        playback.set_speed(settings.speed);

        let mut state = Self {
            playback,
            map: MapWindow::new(),
            transport: TransportWindow::new(),
            track_path: None,
            status_message: None,
            show_map: settings.show_map,
            show_transport: settings.show_transport,
            show_open_pending: false,
            loading: false,
            loading_receiver: None,
        };

        // Reopen the last track, falling back to the bundled sample
        let startup = settings
            .last_track
            .filter(|p| p.exists())
            .or_else(|| {
                let sample = PathBuf::from("Data.csv");
                sample.exists().then_some(sample)
            });
        if let Some(path) = startup {
            state.load_track_file(path);
        }

        state
    }

    fn save_settings(&self) {
        let settings = AppSettings {
            last_track: self.track_path.clone(),
            speed: self.playback.speed(),
            show_map: self.show_map,
            show_transport: self.show_transport,
        };
        settings.save();
    }

    /// Start loading a track on a background thread
    fn load_track_file(&mut self, path: PathBuf) {
        self.loading = true;
        self.status_message = Some(format!("Loading {}...", path.display()));
        self.track_path = Some(path.clone());

        let (tx, rx) = channel();
        self.loading_receiver = Some(rx);

        std::thread::spawn(move || {
            match load_track(&path) {
                Ok(track) => {
                    let _ = tx.send(LoadUpdate::Complete(track));
                }
                Err(e) => {
                    let _ = tx.send(LoadUpdate::Error(e.to_string()));
                }
            }
        });
    }

    /// Drain the load channel on the UI thread
    fn process_loading(&mut self) {
        let receiver = match self.loading_receiver.take() {
            Some(r) => r,
            None => return,
        };

        match receiver.try_recv() {
            Ok(LoadUpdate::Complete(track)) => {
                self.finish_loading(track);
                self.loading = false;
            }
            Ok(LoadUpdate::Error(e)) => {
                // Failed loads leave the track empty; controls stay inert
                warn!("Failed to load track: {}", e);
                self.status_message = Some(format!("Failed to load track: {}", e));
                self.loading = false;
            }
            Err(_) => {
                self.loading_receiver = Some(receiver);
            }
        }
    }

    fn finish_loading(&mut self, track: Track) {
        let point_count = track.len();
        let speed = self.playback.speed();

        if let Some(first) = track.first() {
            self.map
                .view_mut()
                .recenter_if_pinned(LatLon { lat: first.latitude, lon: first.longitude });
        }

        self.playback = PlaybackEngine::new(track);
        self.playback.set_speed(speed);

        self.status_message = Some(format!("Loaded {} points", point_count));
        info!("Loaded {} points", point_count);
    }

    fn process_file_dialogs(&mut self) {
        if self.show_open_pending {
            if let Some(path) = FileDialogs::open_track_file() {
                self.load_track_file(path);
            }
            self.show_open_pending = false;
        }
    }

    fn apply(&mut self, action: TransportAction) {
        match action {
            TransportAction::Play => self.playback.play(),
            TransportAction::Pause => self.playback.pause(),
            TransportAction::SetSpeed(speed) => self.playback.set_speed(speed),
            TransportAction::Seek(index) => self.playback.seek(index),
            TransportAction::None => {}
        }
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Create event loop
    let event_loop = EventLoop::new().expect("Failed to create EventLoop");

    // Build the window and GL display using glutin-winit
    let (window, gl_config) = DisplayBuilder::new()
        .with_window_builder(Some(
            WindowBuilder::new()
                .with_title("Track-Viz - Interactive GPS Playback with Controls")
                .with_inner_size(winit::dpi::LogicalSize::new(900.0, 820.0)),
        ))
        .build(&event_loop, glutin::config::ConfigTemplateBuilder::new(), |mut iter| {
            iter.next().unwrap()
        })
        .expect("Failed to create window and display");

    let window = window.expect("Failed to create window");
    let gl_display = gl_config.display();

    let context = unsafe {
        gl_display.create_context(
            &gl_config,
            &glutin::context::ContextAttributesBuilder::new()
                .build(Some(window.raw_window_handle())),
        )
    }
    .expect("Failed to create GL context");

    let attrs = window.build_surface_attributes(
        glutin::surface::SurfaceAttributesBuilder::<glutin::surface::WindowSurface>::new(),
    );

    let surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
        .expect("Failed to create surface");

    let context = context.make_current(&surface).expect("Failed to make context current");

    let gl = unsafe {
        glow::Context::from_loader_function(|ptr| {
            gl_display.get_proc_address(&std::ffi::CString::new(ptr).unwrap()) as *const _
        })
    };

    // Set up imgui
    let mut imgui = Context::create();
    imgui.set_log_filename(None::<std::path::PathBuf>);

    // Persist window layout next to the settings
    let ini_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("track-viz")
        .join("layout.ini");
    if let Some(parent) = ini_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    imgui.set_ini_filename(Some(ini_path));

    imgui.io_mut().config_flags |= imgui::ConfigFlags::DOCKING_ENABLE;

    // Configure fonts
    let hidpi_factor = window.scale_factor();
    let font_size = (14.0 * hidpi_factor) as f32;
    imgui.fonts().add_font(&[FontSource::DefaultFontData {
        config: Some(FontConfig {
            size_pixels: font_size,
            ..FontConfig::default()
        }),
    }]);
    imgui.io_mut().font_global_scale = (1.0 / hidpi_factor) as f32;

    // Set up platform and renderer
    let mut platform = WinitPlatform::init(&mut imgui);
    platform.attach_window(imgui.io_mut(), &window, HiDpiMode::Default);

    let mut renderer = imgui_glow_renderer::AutoRenderer::initialize(gl, &mut imgui)
        .expect("Failed to initialize renderer");

    // Second glow context for clearing (references the same GL context)
    let gl_clear = unsafe {
        glow::Context::from_loader_function(|ptr| {
            gl_display.get_proc_address(&std::ffi::CString::new(ptr).unwrap()) as *const _
        })
    };

    let mut state = AppState::new();
    let mut last_frame_time = Instant::now();
    let mut last_playback_update = Instant::now();
    let mut last_settings_save = Instant::now();

    event_loop
        .run(move |event, window_target| {
            match event {
                Event::NewEvents(_) => {
                    let now = Instant::now();
                    imgui.io_mut().update_delta_time(now - last_frame_time);
                    last_frame_time = now;
                }
                Event::AboutToWait => {
                    state.process_file_dialogs();
                    state.process_loading();

                    // Advance playback by real elapsed time
                    let now = Instant::now();
                    state.playback.update(now - last_playback_update);
                    last_playback_update = now;

                    // Save settings periodically (every 30 seconds)
                    if last_settings_save.elapsed().as_secs() >= 30 {
                        state.save_settings();
                        last_settings_save = Instant::now();
                    }

                    platform
                        .prepare_frame(imgui.io_mut(), &window)
                        .expect("Failed to prepare frame");
                    window.request_redraw();
                }
                Event::WindowEvent { event: WindowEvent::RedrawRequested, .. } => {
                    let ui = imgui.new_frame();

                    // Menu bar
                    ui.main_menu_bar(|| {
                        ui.menu("File", || {
                            if ui.menu_item("Open Track...") {
                                state.show_open_pending = true;
                            }
                            ui.separator();
                            if ui.menu_item("Exit") {
                                window_target.exit();
                            }
                        });

                        ui.menu("Playback", || {
                            if ui.menu_item("Play") {
                                state.playback.play();
                            }
                            if ui.menu_item("Pause") {
                                state.playback.pause();
                            }
                            ui.separator();
                            ui.text(format!("Speed: {:.2}x", state.playback.speed()));
                        });

                        ui.menu("View", || {
                            let _tok = if state.show_map {
                                Some(ui.push_style_color(imgui::StyleColor::Text, [0.0, 1.0, 0.0, 1.0]))
                            } else {
                                None
                            };
                            if ui.menu_item("Map") {
                                state.show_map = !state.show_map;
                            }
                            drop(_tok);

                            let _tok = if state.show_transport {
                                Some(ui.push_style_color(imgui::StyleColor::Text, [0.0, 1.0, 0.0, 1.0]))
                            } else {
                                None
                            };
                            if ui.menu_item("Transport") {
                                state.show_transport = !state.show_transport;
                            }
                            drop(_tok);
                        });
                    });

                    // Status bar
                    let window_size = window.inner_size();
                    ui.set_cursor_pos([0.0, window_size.height as f32 / hidpi_factor as f32 - 25.0]);
                    ui.child_window("Status")
                        .size([window_size.width as f32 / hidpi_factor as f32, 25.0])
                        .build(|| {
                            if state.loading {
                                ui.text_colored([1.0, 0.8, 0.3, 1.0], "Loading track...");
                            } else if let Some(ref msg) = state.status_message {
                                ui.text(msg);
                            } else if !state.playback.track().is_empty() {
                                ui.text(format!(
                                    "Points: {} | Position: {}/{} | Speed: {:.2}x",
                                    state.playback.track().len(),
                                    state.playback.current_index(),
                                    state.playback.track().last_index().unwrap_or(0),
                                    state.playback.speed(),
                                ));
                            } else {
                                ui.text("Open a track CSV to begin (File > Open Track...)");
                            }
                        });

                    // Dockspace for the map and transport windows
                    ui.dockspace_over_main_viewport();

                    if state.show_map {
                        state.map.render(
                            ui,
                            state.playback.track(),
                            state.playback.current_index(),
                            state.playback.current_timestamp(),
                            &mut state.show_map,
                        );
                    }

                    if state.show_transport {
                        let action =
                            state.transport.render(ui, &state.playback, &mut state.show_transport);
                        state.apply(action);
                    }

                    // Prepare and render
                    platform.prepare_render(ui, &window);
                    let draw_data = imgui.render();

                    unsafe {
                        gl_clear.clear_color(0.1, 0.1, 0.1, 1.0);
                        gl_clear.clear(glow::COLOR_BUFFER_BIT);
                    }

                    renderer.render(draw_data).expect("Rendering failed");

                    surface.swap_buffers(&context).expect("Failed to swap buffers");
                }
                Event::WindowEvent { event: WindowEvent::CloseRequested, .. } => {
                    state.save_settings();
                    window_target.exit();
                }
                _ => {}
            }

            platform.handle_event(imgui.io_mut(), &window, &event);
        })
        .expect("EventLoop error");
}
