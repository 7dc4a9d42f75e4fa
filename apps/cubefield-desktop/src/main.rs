use anyhow::{Context, Result};
use clap::Parser;
use cubefield_common::{Color, SceneConfig, TimeStep};
use cubefield_frame::AppContext;
use cubefield_kernel::World;
use cubefield_render::{DrawList, DrawSurface, PointerLockCamera, Renderer};
use cubefield_render_wgpu::{FrameTarget, WgpuRenderer};
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "cubefield-desktop", about = "Walk among spinning cubes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene config (YAML). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed placement seed, overriding the config file
    #[arg(long)]
    seed: Option<u64>,
}

/// Stand-in renderer for frames where the swapchain had no image. The world
/// still advances; only the draw is lost.
struct NoSurface;

impl Renderer for NoSurface {
    type Output = ();

    fn render(&mut self, _world: &World, _camera: &PointerLockCamera) -> Self::Output {
        tracing::debug!("frame advanced without a surface image");
    }
}

/// Replays minimap commands onto an egui painter. Coordinates are offset by
/// the allocated rect's origin; the painter clips to that rect.
struct EguiSurface {
    painter: egui::Painter,
    origin: egui::Pos2,
    size: (u32, u32),
}

fn to_color32(c: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

impl DrawSurface for EguiSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        // egui repaints from scratch every frame, so a clear only needs a
        // faint backdrop to show where the minimap is.
        let rect = egui::Rect::from_min_size(self.origin + egui::vec2(x, y), egui::vec2(w, h));
        self.painter
            .rect_filled(rect, 0.0, egui::Color32::from_black_alpha(96));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let rect = egui::Rect::from_min_size(self.origin + egui::vec2(x, y), egui::vec2(w, h));
        self.painter.rect_filled(rect, 0.0, to_color32(color));
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        self.painter
            .circle_filled(self.origin + egui::vec2(cx, cy), radius, to_color32(color));
    }
}

fn draw_overlay(ctx: &EguiContext, minimap: &DrawList, locked: bool) {
    let (w, h) = minimap.size();
    egui::Area::new(egui::Id::new("minimap"))
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
        .interactable(false)
        .show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(egui::vec2(w as f32, h as f32), egui::Sense::hover());
            let mut surface = EguiSurface {
                painter: painter.with_clip_rect(response.rect),
                origin: response.rect.min,
                size: (w, h),
            };
            minimap.replay(&mut surface);
        });

    if !locked {
        egui::Area::new(egui::Id::new("hint"))
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -20.0))
            .interactable(false)
            .show(ctx, |ui| {
                ui.label("Click to look around | WASD / arrows: move | Esc: release");
            });
    }
}

struct GpuApp {
    ctx: AppContext,
    minimap: DrawList,
    last_frame: Instant,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<WgpuRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    init_error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: &SceneConfig) -> Self {
        let ctx = AppContext::new(config);
        let (w, h) = ctx.minimap.size();
        Self {
            ctx,
            minimap: DrawList::new(w, h),
            last_frame: Instant::now(),
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
            init_error: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("Cubefield")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cubefield_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        self.ctx.camera.set_aspect(config.width, config.height);

        let mut renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);
        renderer.sync(&device, &mut self.ctx.world);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn engage_pointer_lock(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            tracing::warn!("cursor grab unavailable: {e}");
        }
        window.set_cursor_visible(false);
        if self.ctx.camera.lock() {
            tracing::info!("pointer locked");
        }
    }

    fn release_pointer_lock(&mut self) {
        if let Some(window) = &self.window {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
        }
        if self.ctx.camera.unlock() {
            tracing::info!("pointer released");
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = now - self.last_frame;
        self.last_frame = now;

        let (Some(surface), Some(device), Some(queue), Some(renderer)) =
            (&self.surface, &self.device, &self.queue, &self.renderer)
        else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(t) => Some(t),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(config) = &self.config {
                    surface.configure(device, config);
                }
                None
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                None
            }
        };

        let Some(output) = output else {
            self.ctx.tick(dt, &mut NoSurface, &mut self.minimap);
            return;
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut target = FrameTarget {
            renderer,
            device,
            queue,
            view: &view,
        };
        self.ctx.tick(dt, &mut target, &mut self.minimap);

        let (Some(window), Some(egui_winit), Some(egui_renderer), Some(config)) = (
            &self.window,
            &mut self.egui_winit,
            &mut self.egui_renderer,
            &self.config,
        ) else {
            output.present();
            return;
        };

        let raw_input = egui_winit.take_egui_input(window);
        let minimap = &self.minimap;
        let locked = self.ctx.camera.is_locked();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            draw_overlay(ctx, minimap, locked);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            tracing::error!("startup failed: {e:#}");
            self.init_error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.ctx.camera.set_aspect(config.width, config.height);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                    tracing::debug!("resized to {}x{}", config.width, config.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if key == KeyCode::Escape && pressed {
                    self.release_pointer_lock();
                } else {
                    self.ctx.input.handle_key(key, pressed);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                self.engage_pointer_lock();
            }
            WindowEvent::Focused(false) => {
                if self.ctx.input.any_held() {
                    tracing::debug!("focus lost, releasing held keys");
                }
                self.ctx.input.release_all();
                self.release_pointer_lock();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.ctx.camera.look(delta.0 as f32, delta.1 as f32);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.world.seed = Some(seed);
    }
    if config.motion.timestep == TimeStep::PerTick {
        tracing::debug!("per-tick stepping: motion speed follows the display refresh rate");
    }

    tracing::info!("cubefield-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(&config);
    event_loop.run_app(&mut app)?;

    match app.init_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
