use anyhow::{Context, Result};
use clap::Parser;
use meshview_input::{Action, PointerEvent, action_for_key};
use meshview_render::{RenderSession, ShowcaseAssets, ViewerConfig, assemble_showcase};
use meshview_render_wgpu::{WgpuDevice, program_for};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

/// Scroll pixels reported for one wheel notch.
const LINE_PIXELS: f32 = 100.0;

#[derive(Parser)]
#[command(name = "meshview-desktop", about = "Interactive 3D scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer configuration (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset directory; relative mesh and texture paths resolve against it
    #[arg(long, default_value = "./assets")]
    assets: PathBuf,

    /// Mesh loaded in the background and added to the scene when ready
    #[arg(long, default_value = "Bottle/12178_bottle_v1_L2.obj")]
    mesh: PathBuf,

    /// Cube textures, in cube order (repeatable)
    #[arg(long = "texture", default_values = ["biere-mousse-carre.jpg", "biere2.jpg"])]
    textures: Vec<PathBuf>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,
}

/// Window, surface and the session drawing into it.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    session: RenderSession<WgpuDevice>,
}

struct ViewerApp {
    viewer_config: ViewerConfig,
    assets: ShowcaseAssets,
    initial_size: PhysicalSize<u32>,
    cursor: PhysicalPosition<f64>,
    gpu: Option<Gpu>,
}

impl ViewerApp {
    fn new(cli: Cli, viewer_config: ViewerConfig) -> Self {
        let assets = ShowcaseAssets {
            mesh: Some(cli.assets.join(&cli.mesh)),
            textures: cli.textures.iter().map(|t| cli.assets.join(t)).collect(),
        };
        Self {
            viewer_config,
            assets,
            initial_size: PhysicalSize::new(cli.width, cli.height),
            cursor: PhysicalPosition::new(0.0, 0.0),
            gpu: None,
        }
    }

    fn init_gpu(&self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let attrs = Window::default_attributes()
            .with_title("meshview")
            .with_inner_size(self.initial_size);
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("meshview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
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

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        let device = WgpuDevice::new(device, queue, surface_format, config.width, config.height);
        let mut session = RenderSession::new(device, self.viewer_config.clone());
        assemble_showcase(&mut session, program_for, &self.assets)?;

        Ok(Gpu {
            window,
            surface,
            config,
            session,
        })
    }

    fn pointer(&mut self, event: PointerEvent) {
        if let Some(gpu) = &mut self.gpu {
            gpu.session.handle_pointer(event);
        }
    }
}

impl Gpu {
    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface
            .configure(self.session.device().device(), &self.config);
        self.session
            .device_mut()
            .resize(self.config.width, self.config.height);
    }

    fn redraw(&mut self) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface
                    .configure(self.session.device().device(), &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.session.device_mut().attach_target(view);
        if let Err(e) = self.session.render_frame() {
            tracing::error!("frame failed: {e}");
        }

        output.present();
        self.window.request_redraw();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("failed to start viewer: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                let action = match &logical_key {
                    Key::Named(NamedKey::Escape) => {
                        event_loop.exit();
                        return;
                    }
                    Key::Character(text) => {
                        text.chars().next().map_or(Action::Noop, action_for_key)
                    }
                    _ => Action::Noop,
                };
                if let Some(gpu) = &mut self.gpu {
                    gpu.session.handle_action(action);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                let event = match state {
                    ElementState::Pressed => PointerEvent::Down {
                        x: self.cursor.x as f32,
                        y: self.cursor.y as f32,
                    },
                    ElementState::Released => PointerEvent::Up,
                };
                self.pointer(event);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
                self.pointer(PointerEvent::Move {
                    x: position.x as f32,
                    y: position.y as f32,
                });
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer(PointerEvent::Leave);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports positive y for scrolling away from the user.
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (x * LINE_PIXELS, -y * LINE_PIXELS),
                    MouseScrollDelta::PixelDelta(p) => (p.x as f32, -p.y as f32),
                };
                self.pointer(PointerEvent::Wheel { dx, dy });
            }
            WindowEvent::RedrawRequested => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("meshview-desktop starting");

    let viewer_config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ViewerApp::new(cli, viewer_config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
