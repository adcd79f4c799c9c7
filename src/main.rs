use anyhow::Context as _;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};
use std::sync::Arc;

// Import from the library crate
use ovalrush::{
    logging, ui,
    model, view, controller,
};

use model::{Camera, WheelVisuals};
use view::{GpuContext, RenderState};
use controller::input::native::key_to_input;
use controller::{CameraController, InputEvent, InputState, KeyBindings, Simulation};

/// Everything that exists once the window and GPU are up
struct Game {
    window: Arc<Window>,
    gpu: GpuContext,
    render_state: RenderState,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    // Game state
    sim: Simulation,
    input_state: InputState,
    bindings: KeyBindings,
    camera: Camera,
    camera_controller: CameraController,
    wheels: WheelVisuals,

    // Frame timing
    last_frame_time: std::time::Instant,
}

impl Game {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let gpu = GpuContext::new_native(window.clone()).await?;

        let sim = Simulation::new();
        let render_state = RenderState::new(&gpu, &sim.config.track);

        let camera_controller = CameraController::new();
        let mut camera = Camera::new(size.width, size.height);
        let start = sim.vehicle.world_position();
        camera.eye = camera_controller.desired_eye(start, sim.vehicle.heading);
        camera.set_look_at(camera_controller.look_target(start));

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        Ok(Self {
            window,
            gpu,
            render_state,
            egui_state,
            egui_ctx,
            sim,
            input_state: InputState::new(),
            bindings: KeyBindings::default(),
            camera,
            camera_controller,
            wheels: WheelVisuals::new(),
            last_frame_time: std::time::Instant::now(),
        })
    }

    fn input(&mut self, event: &WindowEvent) {
        // The HUD has no interactive widgets; egui only needs to see the events
        let _ = self.egui_state.on_window_event(self.window.as_ref(), event);

        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key: PhysicalKey::Code(code), .. }, .. } => {
                if let Some(input) = key_to_input(*code, *state) {
                    self.input_state.process_event(&input, &self.bindings);
                }
            }
            WindowEvent::Focused(false) => {
                self.input_state.process_event(&InputEvent::FocusLost, &self.bindings);
            }
            WindowEvent::Occluded(occluded) => {
                self.input_state
                    .process_event(&InputEvent::VisibilityChanged { visible: !occluded }, &self.bindings);
            }
            _ => {}
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gpu.resize(new_size.width, new_size.height);
            self.render_state.resize(&self.gpu.device, new_size.width, new_size.height);
            self.camera.set_aspect(new_size.width, new_size.height);
        }
    }

    fn update(&mut self, raw_dt: f32) {
        let dt = self.sim.step(&self.input_state, raw_dt);

        let vehicle = self.sim.vehicle;
        self.wheels.advance(vehicle.speed, dt);
        self.camera_controller
            .follow(&mut self.camera, vehicle.world_position(), vehicle.heading);

        self.render_state
            .update(&self.gpu.queue, &self.camera, &self.wheels.pose(&vehicle));

        // HUD
        let hud = self.sim.hud();
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let mut output = self.egui_ctx.run(raw_input, |ctx| ui::draw_hud(ctx, &hud));
        self.egui_state
            .handle_platform_output(&self.window, std::mem::take(&mut output.platform_output));
        let dpr = self.window.scale_factor() as f32;
        let primitives = self.egui_ctx.tessellate(std::mem::take(&mut output.shapes), dpr);
        self.render_state.set_ui(primitives, output, dpr);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.render_state
            .draw_frame(&self.gpu.device, &self.gpu.queue, &self.gpu.surface)
    }
}

#[derive(Default)]
struct App {
    game: Option<Game>,
    failed: bool,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.game.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("Oval Rush")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let game = event_loop
            .create_window(attributes)
            .context("failed to create window")
            .and_then(|window| pollster::block_on(Game::new(Arc::new(window))));

        match game {
            Ok(game) => {
                game.window.request_redraw();
                self.game = Some(game);
            }
            Err(e) => {
                tracing::error!(error = ?e, "startup failed");
                self.failed = true;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        if window_id != game.window.id() {
            return;
        }

        game.input(&event);

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested");
                self.game = None;
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                game.resize(physical_size);
            }
            WindowEvent::RedrawRequested => {
                let now = std::time::Instant::now();
                let dt = (now - game.last_frame_time).as_secs_f32();
                game.last_frame_time = now;

                game.update(dt);

                match game.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        game.resize(game.window.inner_size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("surface out of memory");
                        self.failed = true;
                        event_loop.exit();
                    }
                    Err(e) => tracing::warn!(error = ?e, "dropped frame"),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(game) = &self.game {
            game.window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::default();
    event_loop.run_app(&mut app).context("event loop failed")?;

    if app.failed {
        std::process::exit(1);
    }
    Ok(())
}
