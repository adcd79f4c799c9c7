use std::rc::Rc;
use std::cell::RefCell;
use web_sys::{HtmlCanvasElement, Window};

use crate::controller::{CameraController, InputState, Simulation};
use crate::model::{Camera, WheelVisuals};
use crate::view::{GpuContext, RenderState};
use crate::ui;

/// Browser frame loop state: one simulation step, camera follow and HUD per animation frame
pub struct FrameLoopContext {
    pub sim: Simulation,
    pub input_state: Rc<RefCell<InputState>>,
    pub camera_controller: CameraController,
    pub wheels: WheelVisuals,
    pub camera: Camera,
    pub egui_ctx: egui::Context,
    pub canvas: HtmlCanvasElement,
    pub last_time: f64,
}

impl FrameLoopContext {
    pub fn new(
        sim: Simulation,
        input_state: Rc<RefCell<InputState>>,
        canvas: HtmlCanvasElement,
        now: f64,
    ) -> Self {
        let camera_controller = CameraController::new();
        let mut camera = Camera::new(canvas.width(), canvas.height());
        // Start behind the car instead of sweeping in from the default eye
        camera.eye = camera_controller.desired_eye(sim.vehicle.world_position(), sim.vehicle.heading);
        camera.set_look_at(camera_controller.look_target(sim.vehicle.world_position()));

        Self {
            sim,
            input_state,
            camera_controller,
            wheels: WheelVisuals::new(),
            camera,
            egui_ctx: egui::Context::default(),
            canvas,
            last_time: now,
        }
    }

    /// Advance the simulation and prepare the GPU state for one frame
    pub fn update(&mut self, gpu: &mut GpuContext, window: &Window, render_state: &mut RenderState) {
        // Time step in seconds; the simulation clamps it
        let now = window.performance().map(|p| p.now()).unwrap_or(self.last_time);
        let raw_dt = ((now - self.last_time) / 1000.0) as f32;
        self.last_time = now;

        // Copy out so listeners can keep writing while we step
        let input = *self.input_state.borrow();
        let dt = self.sim.step(&input, raw_dt);

        let vehicle = self.sim.vehicle;
        self.wheels.advance(vehicle.speed, dt);
        self.camera_controller
            .follow(&mut self.camera, vehicle.world_position(), vehicle.heading);

        self.handle_resize(window, gpu, render_state);

        render_state.update(gpu.queue.as_ref(), &self.camera, &self.wheels.pose(&vehicle));

        // HUD in CSS pixels, tessellated at device pixel ratio
        let dpr = window.device_pixel_ratio() as f32;
        self.egui_ctx.set_pixels_per_point(dpr);
        let mut full_output = ui::build_ui(
            &self.egui_ctx,
            &self.sim.hud(),
            (render_state.width as f32 / dpr) as u32,
            (render_state.height as f32 / dpr) as u32,
            now,
        );
        let primitives = self.egui_ctx.tessellate(std::mem::take(&mut full_output.shapes), dpr);
        render_state.set_ui(primitives, full_output, dpr);
    }

    /// Track the window size in device pixels
    pub fn handle_resize(&mut self, window: &Window, gpu: &mut GpuContext, render_state: &mut RenderState) {
        let dpr = window.device_pixel_ratio();
        if let (Ok(w), Ok(h)) = (window.inner_width(), window.inner_height()) {
            let nw = (w.as_f64().unwrap_or(800.0) * dpr) as u32;
            let nh = (h.as_f64().unwrap_or(600.0) * dpr) as u32;
            if nw == 0 || nh == 0 {
                return;
            }
            if nw != render_state.width || nh != render_state.height {
                tracing::debug!(width = nw, height = nh, "resize");
                self.canvas.set_width(nw);
                self.canvas.set_height(nh);
                self.camera.set_aspect(nw, nh);
                gpu.resize(nw, nh);
                render_state.resize(gpu.device.as_ref(), nw, nh);
            }
        }
    }
}
