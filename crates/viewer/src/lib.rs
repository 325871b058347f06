//! Interactive preview window for the planefx effects.
//!
//! The viewer glues the `winit` event loop, the `wgpu` pipeline, and the
//! animator together:
//!
//! ```text
//!   CLI
//!    │ ViewerConfig
//!    ▼
//!   Viewer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!    cursor events ──▶ PointerTracker ──▶ UniformAnimator ──▶ snapshot ─▶ GPU
//! ```
//!
//! `WindowState` owns all GPU resources; `Viewer` is the thin entry point
//! that builds the animator for the requested effect and starts the loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use animator::{AnimatorConfig, EffectKind, PointerSpace, UniformAnimator};
use winit::dpi::PhysicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

mod gpu;
mod input;
mod shaders;

pub use gpu::Antialiasing;
use gpu::GpuState;
use input::PointerTracker;

/// Immutable configuration passed to the viewer at start-up.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Window title.
    pub title: String,
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Effect to render.
    pub effect: EffectKind,
    /// Optional image sampled by the effect.
    pub texture: Option<PathBuf>,
    /// Five-color palette for palette-driven effects.
    pub palette: Option<[[f32; 4]; 5]>,
    /// Optional FPS cap; `None` renders every redraw.
    pub target_fps: Option<f32>,
    /// Anti-aliasing policy.
    pub antialiasing: Antialiasing,
    /// Seed for the effect's random source.
    pub seed: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "planefx".to_string(),
            surface_size: (1280, 720),
            effect: EffectKind::Aberration,
            texture: None,
            palette: None,
            target_fps: None,
            antialiasing: Antialiasing::default(),
            seed: 0,
        }
    }
}

/// High-level entry point that owns the chosen configuration.
pub struct Viewer {
    config: ViewerConfig,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config }
    }

    /// Opens the window and drives the `winit` event loop until close.
    pub fn run(&self) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to initialize event loop")?;
        let window_size =
            PhysicalSize::new(self.config.surface_size.0, self.config.surface_size.1);
        let window = WindowBuilder::new()
            .with_title(&self.config.title)
            .with_inner_size(window_size)
            .build(&event_loop)
            .context("failed to create preview window")?;
        let window = Arc::new(window);

        let mut state = WindowState::new(window.clone(), &self.config)?;
        state.window().request_redraw();

        event_loop
            .run(move |event, elwt| {
                elwt.set_control_flow(ControlFlow::Wait);

                match event {
                    Event::WindowEvent { window_id, event }
                        if window_id == state.window().id() =>
                    {
                        match event {
                            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                                elwt.exit();
                            }
                            WindowEvent::CursorMoved { position, .. } => {
                                state.handle_cursor_moved(position);
                            }
                            WindowEvent::CursorEntered { .. } => {
                                state.handle_cursor_entered();
                            }
                            WindowEvent::CursorLeft { .. } => {
                                state.handle_cursor_left();
                            }
                            WindowEvent::Resized(new_size) => {
                                state.resize(new_size);
                            }
                            WindowEvent::ScaleFactorChanged {
                                mut inner_size_writer,
                                ..
                            } => {
                                // Keep the current logical size when the scale factor changes.
                                let _ = inner_size_writer.request_inner_size(state.size());
                            }
                            WindowEvent::RedrawRequested => match state.render_frame() {
                                Ok(()) => {}
                                Err(
                                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                                ) => {
                                    state.resize(state.size());
                                }
                                Err(wgpu::SurfaceError::OutOfMemory) => {
                                    tracing::error!("surface out of memory; exiting");
                                    elwt.exit();
                                }
                                Err(wgpu::SurfaceError::Timeout) => {
                                    tracing::warn!("surface timeout; retrying next frame");
                                }
                                Err(other) => {
                                    tracing::warn!("surface error: {other:?}; retrying next frame");
                                }
                            },
                            _ => {}
                        }
                    }
                    Event::AboutToWait => {
                        // Schedule the next frame once winit is about to wait for events again.
                        state.window().request_redraw();
                    }
                    _ => {}
                }
            })
            .map_err(|err| anyhow!("event loop error: {err}"))
    }
}

/// Aggregates the window, GPU resources, animator, and frame pacing.
struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    animator: UniformAnimator,
    pointer_space: PointerSpace,
    pointer: PointerTracker,
    pacer: FramePacer,
    last_advance: Option<Instant>,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &ViewerConfig) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(
            window.as_ref(),
            size,
            config.effect,
            config.texture.as_deref(),
            config.palette,
            config.antialiasing,
        )?;

        let animator_config = AnimatorConfig::for_effect(config.effect);
        let pointer_space = animator_config.pointer_space;
        let animator = UniformAnimator::new(animator_config, config.seed)
            .map_err(|err| anyhow!("invalid effect parameters: {err}"))?;

        Ok(Self {
            window,
            gpu,
            animator,
            pointer_space,
            pointer: PointerTracker::default(),
            pacer: FramePacer::new(config.target_fps),
            last_advance: None,
        })
    }

    fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    fn handle_cursor_moved(&mut self, position: winit::dpi::PhysicalPosition<f64>) {
        // winit only reports CursorEntered on window boundary crossings, so
        // treat the first motion after a leave as an enter too.
        if !self.pointer.is_inside() {
            self.handle_cursor_entered();
        }
        self.pointer.handle_cursor_moved(position);
        if let Some((x, y)) = self.pointer.plane_position(self.pointer_space, self.size()) {
            self.animator.on_pointer_move(x, y);
        }
    }

    fn handle_cursor_entered(&mut self) {
        self.pointer.handle_cursor_entered();
        self.animator.on_pointer_enter();
    }

    fn handle_cursor_left(&mut self) {
        self.pointer.handle_cursor_left();
        self.animator.on_pointer_leave();
    }

    /// Advances the animator once and submits a frame, honoring the FPS cap.
    fn render_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        if !self.pacer.should_render(now) {
            return Ok(());
        }

        let elapsed = self
            .last_advance
            .map(|last| now.saturating_duration_since(last).as_secs_f32());
        self.last_advance = Some(now);

        self.animator.advance(elapsed);
        self.gpu.render_frame(&self.animator.snapshot())
    }
}

/// Accumulator-based FPS cap. Uncapped when no target is set.
struct FramePacer {
    target_interval: Option<Duration>,
    accumulator: Duration,
    last_tick: Option<Instant>,
}

impl FramePacer {
    fn new(target_fps: Option<f32>) -> Self {
        let target_interval = target_fps
            .filter(|fps| *fps > 0.0)
            .map(|fps| Duration::from_secs_f32(1.0 / fps));
        Self {
            target_interval,
            accumulator: Duration::ZERO,
            last_tick: None,
        }
    }

    fn should_render(&mut self, now: Instant) -> bool {
        let Some(interval) = self.target_interval else {
            return true;
        };
        let Some(last) = self.last_tick.replace(now) else {
            return true;
        };

        let delta = now.saturating_duration_since(last);
        self.accumulator = self.accumulator.saturating_add(delta);
        if self.accumulator + Duration::from_micros(250) < interval {
            false
        } else {
            // Subtract only one interval to avoid a burst after long gaps.
            self.accumulator = self.accumulator.saturating_sub(interval);
            true
        }
    }
}
