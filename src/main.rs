//! Coverwave - album-cover themed, audio-reactive visualizer
//!
//! Nodes drift, pulse and link up in colours pulled from the cover art,
//! moving the way the track's descriptors say it should feel.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use image::DynamicImage;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use coverwave::cli::Args;
use coverwave::features::TrackState;
use coverwave::params::{RecordingConfig, RenderConfig};
use coverwave::render_loop::RenderLoop;
use coverwave::rendering::RenderSystem;
use coverwave::surface::{Canvas, Surface};
use coverwave::viz::{Health, Visualizer, VisualizerManager, VisualizerMode};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    canvas: Canvas,

    // Visualizer
    manager: VisualizerManager,
    render_loop: RenderLoop,

    // Configuration
    render_config: RenderConfig,
}

impl App {
    fn new(args: &Args, track: &TrackState, cover: Option<&DynamicImage>) -> Result<Self> {
        let render_config = args.render_config();
        let (width, height) = (render_config.window_width, render_config.window_height);

        let canvas = Canvas::new(width, height).context("Failed to allocate canvas")?;
        let mut manager = VisualizerManager::new(args.parse_mode(), width, height, args.seed);
        manager.update_from_track(track, cover);

        Ok(Self {
            window: None,
            render_system: None,
            canvas,
            manager,
            render_loop: RenderLoop::default(),
            render_config,
        })
    }

    fn update_title(&self) {
        let Some(window) = &self.window else {
            return;
        };
        let title = match self.manager.health() {
            Health::Ok => format!(
                "{} - {} ({})",
                self.render_config.title,
                self.manager.mode(),
                self.manager.theme().mood_label()
            ),
            Health::Failed { reason } => {
                format!("{} - visualizer unavailable: {}", self.render_config.title, reason)
            }
        };
        window.set_title(&title);
    }

    fn switch_mode(&mut self, mode: VisualizerMode) {
        self.manager.switch_to(mode);
        self.update_title();
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let Err(e) = self.canvas.resize(width, height) {
            self.manager.fail(e.to_string());
            self.update_title();
            return;
        }
        self.manager.resize(width, height);
        if let Some(render_system) = &mut self.render_system {
            render_system.resize(width, height);
        }
    }

    /// Advance, upload and present a single frame
    fn render_frame(&mut self) {
        let now = Instant::now();
        if !self.render_loop.advance(now, &mut self.manager, &mut self.canvas)
            && !self.manager.is_healthy()
        {
            self.manager.draw(&mut self.canvas);
        }

        let Some(render_system) = &self.render_system else {
            return;
        };
        render_system.upload(&self.canvas);

        match render_system.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.canvas.size();
                self.resize(size.0, size.1);
            }
            Err(e) => warn!("Render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.manager.is_running() {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.render_config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let render_system =
            pollster::block_on(RenderSystem::new(Arc::clone(&window), (size.width, size.height)));
        match render_system {
            Ok(render_system) => self.render_system = Some(render_system),
            Err(e) => self.manager.fail(e.to_string()),
        }
        self.window = Some(window);
        self.resize(size.width, size.height);

        self.render_loop.start(&mut self.manager);
        self.update_title();
        info!("Coverwave is running: 1/2/3 switch mode, Space pauses, Esc quits");
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::Space => {
                    let running = self.render_loop.toggle(&mut self.manager);
                    info!("{}", if running { "Resumed" } else { "Paused" });
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                KeyCode::Digit1 => self.switch_mode(VisualizerMode::Particles),
                KeyCode::Digit2 => self.switch_mode(VisualizerMode::CreativeNodes),
                KeyCode::Digit3 => self.switch_mode(VisualizerMode::Spectrum),
                _ => {}
            },
            WindowEvent::RedrawRequested => self.render_frame(),
            _ => {}
        }
    }
}

/// Render `config.frames` frames at a fixed step and save them as PNGs.
fn record(
    args: &Args,
    track: &TrackState,
    cover: Option<&DynamicImage>,
    config: &RecordingConfig,
) -> Result<()> {
    let render_config = args.render_config();
    let (width, height) = (render_config.window_width, render_config.window_height);

    let mut canvas = Canvas::new(width, height).context("Failed to allocate canvas")?;
    let mut manager = VisualizerManager::new(args.parse_mode(), width, height, args.seed);
    manager.update_from_track(track, cover);

    let mut render_loop = RenderLoop::default();
    render_loop.start(&mut manager);

    let dt = config.frame_dt();
    for n in 0..config.frames {
        render_loop.step(dt, &mut manager, &mut canvas);
        let path = config.frame_path(n);
        canvas
            .save_png(&path)
            .with_context(|| format!("Failed to save frame {:?}", path))?;
    }

    info!(
        "Recorded {} frames ({}x{}, mood {}) to {:?}",
        config.frames,
        width,
        height,
        manager.theme().mood_label(),
        config.output_dir
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let track = args.load_track_state();
    let cover = args.load_cover();

    if let Some(config) = args
        .create_recording_config()
        .context("Failed to create output directory")?
    {
        return record(&args, &track, cover.as_ref(), &config);
    }

    let mut app = App::new(&args, &track, cover.as_ref())?;
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.run_app(&mut app).context("Event loop error")?;
    Ok(())
}
