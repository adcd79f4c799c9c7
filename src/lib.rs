// Re-export all public modules so they can be used from main.rs
pub mod logging;
pub mod utils;
pub mod ui;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{JsCast, JsValue, prelude::wasm_bindgen};
#[cfg(target_arch = "wasm32")]
use web_sys::{Window, Document, HtmlCanvasElement, KeyboardEvent, Event};
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;
#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;

#[cfg(target_arch = "wasm32")]
use controller::{FrameLoopContext, InputEvent, InputState, KeyBindings, Simulation};
#[cfg(target_arch = "wasm32")]
use view::{GpuContext, RenderState};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    logging::init();
    let (window, document, canvas) = init_canvas()?;
    setup_app(&window, &document, canvas).await
}

/// Main application setup for WASM
#[cfg(target_arch = "wasm32")]
async fn setup_app(
    window: &Window,
    document: &Document,
    canvas: HtmlCanvasElement,
) -> Result<(), JsValue> {
    log_backend_hint(window);

    let mut gpu = match GpuContext::new(&canvas, canvas.width(), canvas.height()).await {
        Ok(gpu) => gpu,
        Err(e) => {
            // No adapter: explain on the page and leave the simulation unstarted
            tracing::error!(error = ?e, "GPU initialisation failed");
            show_fallback(document, &format!("{e:#}"))?;
            return Ok(());
        }
    };

    let sim = Simulation::new();
    let mut render_state = RenderState::new(&gpu, &sim.config.track);

    let input_state = Rc::new(RefCell::new(InputState::new()));
    setup_input_listeners(document, window, input_state.clone(), KeyBindings::default())?;

    let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
    let mut frame_ctx = FrameLoopContext::new(sim, input_state, canvas, now);
    tracing::info!(width = gpu.config.width, height = gpu.config.height, "starting frame loop");

    // Continuous redraw using requestAnimationFrame
    let f = RcCellCallback::new(window.clone(), {
        let window_for_loop = window.clone();

        move || {
            frame_ctx.update(&mut gpu, &window_for_loop, &mut render_state);

            match render_state.draw_frame(gpu.device.as_ref(), gpu.queue.as_ref(), &gpu.surface) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    let (w, h) = (gpu.config.width, gpu.config.height);
                    gpu.resize(w, h);
                }
                Err(e) => tracing::warn!(error = ?e, "dropped frame"),
            }
        }
    });
    f.start()?;

    Ok(())
}

/// Keyboard and focus listeners feeding the shared input state
#[cfg(target_arch = "wasm32")]
fn setup_input_listeners(
    document: &Document,
    window: &Window,
    input_state: Rc<RefCell<InputState>>,
    bindings: KeyBindings,
) -> Result<(), JsValue> {
    let bindings = Rc::new(bindings);

    // Keyboard down / up
    for (event_name, is_down) in [("keydown", true), ("keyup", false)] {
        let input_state = input_state.clone();
        let bindings = bindings.clone();
        let listener = Closure::wrap(Box::new(move |e: KeyboardEvent| {
            let event = controller::input::wasm::keyboard_event_to_input(&e, is_down);
            // Arrow keys would otherwise scroll the page
            if bindings.is_bound(&e.key()) {
                e.prevent_default();
            }
            input_state.borrow_mut().process_event(&event, &bindings);
        }) as Box<dyn FnMut(KeyboardEvent)>);
        document.add_event_listener_with_callback(event_name, listener.as_ref().unchecked_ref())?;
        listener.forget();
    }

    // Focus loss - release every control
    {
        let input_state = input_state.clone();
        let bindings = bindings.clone();
        let blur = Closure::wrap(Box::new(move |_e: Event| {
            input_state.borrow_mut().process_event(&InputEvent::FocusLost, &bindings);
        }) as Box<dyn FnMut(Event)>);
        window.add_event_listener_with_callback("blur", blur.as_ref().unchecked_ref())?;
        blur.forget();
    }

    // Visibility change - release every control when hidden
    {
        let doc = document.clone();
        let visibility = Closure::wrap(Box::new(move |_e: Event| {
            let visible = !doc.hidden();
            input_state
                .borrow_mut()
                .process_event(&InputEvent::VisibilityChanged { visible }, &bindings);
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("visibilitychange", visibility.as_ref().unchecked_ref())?;
        visibility.forget();
    }

    Ok(())
}

/// Full-window canvas sized in device pixels
#[cfg(target_arch = "wasm32")]
fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or(js_error("no global `window`"))?;
    let document = window.document().ok_or(js_error("no document on window"))?;
    let body = document.body().ok_or(js_error("no body on document"))?;
    let canvas_el = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| js_error("failed to create canvas"))?;

    let dpr = window.device_pixel_ratio();
    let css_w = window.inner_width()?.as_f64().unwrap_or(800.0);
    let css_h = window.inner_height()?.as_f64().unwrap_or(600.0);
    canvas_el.set_width(((css_w * dpr) as u32).max(1));
    canvas_el.set_height(((css_h * dpr) as u32).max(1));
    canvas_el.set_id("ovalrush");
    body.append_child(&canvas_el)?;
    Ok((window, document, canvas_el))
}

#[cfg(target_arch = "wasm32")]
fn log_backend_hint(window: &Window) {
    let navigator = window.navigator();
    let has_webgpu = js_sys::Reflect::has(&navigator, &JsValue::from_str("gpu")).unwrap_or(false);
    tracing::info!(has_webgpu, "browser graphics support");
}

#[cfg(target_arch = "wasm32")]
fn show_fallback(document: &Document, reason: &str) -> Result<(), JsValue> {
    let body = document.body().ok_or(js_error("no body on document"))?;
    body.set_inner_html(&format!(
        "<div id=\"ovalrush-fallback\">\
         <h1>WebGPU or WebGL2 is required</h1>\
         <p>This browser could not provide a graphics adapter.</p>\
         <pre>{}</pre></div>",
        escape_html(reason)
    ));
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}

#[cfg(target_arch = "wasm32")]
struct RcCellCallback {
    inner: Rc<RefCell<Box<dyn FnMut()>>>,
    window: Window,
}

#[cfg(target_arch = "wasm32")]
impl RcCellCallback {
    fn new(window: Window, f: impl FnMut() + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Box::new(f))),
            window,
        }
    }

    fn start(self) -> Result<(), JsValue> {
        let inner = self.inner.clone();
        let window = self.window.clone();

        let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
        let callback_clone = callback.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            inner.borrow_mut().as_mut()();

            // Recursively schedule next frame
            if let Some(cb) = callback_clone.borrow().as_ref() {
                if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!(error = ?e, "requestAnimationFrame failed, frame loop stopped");
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = callback.borrow().as_ref() {
            self.window.request_animation_frame(cb.as_ref().unchecked_ref())?;
        }

        // Leak the closure to keep it alive
        std::mem::forget(callback);
        Ok(())
    }
}
