use console_error_panic_hook::set_once;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use formats::LandDataset;
use foundation::time::Time;
use gpu::{SurfaceSize, Viewport};
use runtime::{AnimationClock, Frame, FrameLoop, Teardown};

pub mod animation;
pub mod config;
pub mod scene;
mod wgpu;

use animation::AnimationLoop;
use config::ViewerConfig;
use scene::{Globals, SceneData};
use crate::wgpu::{WgpuContext, init_wgpu_for_canvas, release_wgpu, render_map, resize_wgpu};

fn console_log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn console_warn(msg: &str) {
    web_sys::console::warn_1(&JsValue::from_str(msg));
}

/// Mutable per-instance state shared by the frame loop and the resize listener.
struct MapState {
    gpu: Option<WgpuContext>,
    viewport: Viewport,
    clock: AnimationClock,
    config: ViewerConfig,
    render_failures: u64,
}

impl MapState {
    fn tick(&mut self, now: Time) {
        let frame = self.clock.tick(now);
        self.draw(frame);
    }

    fn draw(&mut self, frame: Frame) {
        let Some(ctx) = &self.gpu else {
            return;
        };
        let globals = Globals::new(
            self.viewport.camera.view_proj(),
            &self.config.style,
            frame.glow_time,
            self.config.animation.glow,
        );
        if let Err(err) = render_map(ctx, &globals) {
            self.render_failures += 1;
            if self.render_failures == 1 {
                console_warn(&format!("map render failed (frame {}): {:?}", frame.index, err));
            }
        }
    }

    fn resize(&mut self, size: SurfaceSize) {
        let backing_changed = self.viewport.resize(size);
        if backing_changed {
            if let Some(ctx) = &mut self.gpu {
                let (w, h) = size.physical();
                resize_wgpu(ctx, w, h);
            }
        }
    }

    fn release_gpu(&mut self) {
        if let Some(ctx) = self.gpu.take() {
            release_wgpu(ctx);
        }
    }
}

fn window_surface_size(window: &web_sys::Window) -> SurfaceSize {
    let read = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    SurfaceSize::new(
        read(window.inner_width()),
        read(window.inner_height()),
        window.device_pixel_ratio(),
    )
}

fn apply_canvas_size(canvas: &web_sys::HtmlCanvasElement, size: SurfaceSize) -> Result<(), JsValue> {
    let (w, h) = size.physical();
    canvas.set_width(w);
    canvas.set_height(h);
    let style = canvas.style();
    style.set_property("width", &format!("{}px", size.css_width))?;
    style.set_property("height", &format!("{}px", size.css_height))?;
    style.set_property("display", "block")?;
    Ok(())
}

struct ResizeListener {
    callback: Closure<dyn FnMut()>,
}

impl ResizeListener {
    fn attach(
        window: &web_sys::Window,
        canvas: web_sys::HtmlCanvasElement,
        state: Rc<RefCell<MapState>>,
    ) -> Result<Self, JsValue> {
        let win = window.clone();
        let callback = Closure::wrap(Box::new(move || {
            let size = window_surface_size(&win);
            if let Err(err) = apply_canvas_size(&canvas, size) {
                console_warn(&format!("canvas resize failed: {:?}", err));
            }
            state.borrow_mut().resize(size);
        }) as Box<dyn FnMut()>);
        window.add_event_listener_with_callback("resize", callback.as_ref().unchecked_ref())?;
        Ok(Self { callback })
    }

    fn detach(self, window: &web_sys::Window) {
        if let Err(err) = window
            .remove_event_listener_with_callback("resize", self.callback.as_ref().unchecked_ref())
        {
            console_warn(&format!("resize listener detach failed: {:?}", err));
        }
    }
}

/// A mounted map: shared state plus the releases for everything `mount`
/// acquired.
struct Mounted {
    state: Rc<RefCell<MapState>>,
    frames: FrameLoop<i32>,
    teardown: Teardown,
}

impl Mounted {
    /// Hooks up the resize listener and the frame loop. On failure, runs
    /// `teardown` (which already holds the canvas and GPU releases).
    fn attach(
        window: web_sys::Window,
        canvas: web_sys::HtmlCanvasElement,
        state: Rc<RefCell<MapState>>,
        mut teardown: Teardown,
    ) -> Result<Self, JsValue> {
        let resize = match ResizeListener::attach(&window, canvas, state.clone()) {
            Ok(resize) => resize,
            Err(err) => {
                teardown.run();
                return Err(err);
            }
        };
        let listener_window = window.clone();
        teardown.push("resize-listener", move || resize.detach(&listener_window));

        let frame_state = state.clone();
        let animation = match AnimationLoop::start(&window, move |now_ms| {
            frame_state.borrow_mut().tick(Time::from_millis(now_ms));
        }) {
            Ok(animation) => animation,
            Err(err) => {
                teardown.run();
                return Err(err);
            }
        };
        let frames = animation.frames();
        teardown.push("animation", move || animation.cancel(&window));

        Ok(Self {
            state,
            frames,
            teardown,
        })
    }

    /// Releases in reverse acquisition order: frame loop, resize listener,
    /// GPU, canvas.
    fn release(mut self) -> Vec<&'static str> {
        self.teardown.run()
    }
}

/// Handle to one mounted map. Dropping it (or calling `free()` from JS)
/// tears the map down.
#[wasm_bindgen]
pub struct MapView {
    mounted: Option<Mounted>,
}

#[wasm_bindgen]
impl MapView {
    #[wasm_bindgen(getter)]
    pub fn mounted(&self) -> bool {
        self.mounted
            .as_ref()
            .is_some_and(|m| m.frames.is_running())
    }

    /// Draws a single frame at a fixed elapsed time, independent of the loop.
    pub fn render_at(&self, elapsed_s: f64) -> Result<(), JsValue> {
        let mounted = self
            .mounted
            .as_ref()
            .ok_or_else(|| JsValue::from_str("map is not mounted"))?;
        let mut state = mounted.state.borrow_mut();
        let frame = state.clock.frame_at(elapsed_s);
        state.draw(frame);
        Ok(())
    }

    /// Stops the animation, removes the resize listener, releases GPU
    /// resources and detaches the canvas. Safe to call more than once.
    pub fn unmount(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            let released = mounted.release();
            console_log(&format!("map unmounted ({})", released.join(", ")));
        }
    }
}

impl Drop for MapView {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Mounts a full-window map into the element with id `container_id`.
///
/// `land_geojson` is the static land dataset. `config_json` optionally
/// overrides style, arc and timing; an invalid config falls back to defaults.
#[wasm_bindgen]
pub async fn mount(
    container_id: String,
    land_geojson: String,
    config_json: Option<String>,
) -> Result<MapView, JsValue> {
    let config = match config_json.as_deref().map(ViewerConfig::from_json) {
        None => ViewerConfig::default(),
        Some(Ok(config)) => config,
        Some(Err(err)) => {
            console_warn(&format!("invalid viewer config, using defaults: {err}"));
            ViewerConfig::default()
        }
    };

    let dataset = match LandDataset::from_geojson_str(&land_geojson) {
        Ok(ds) => ds,
        Err(err) => {
            console_warn(&format!("land dataset unusable, drawing without land: {err}"));
            LandDataset::default()
        }
    };
    let scene = SceneData::build(&dataset, &config);
    console_log(&scene.summary());

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window missing"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("document missing"))?;
    let container = document
        .get_element_by_id(&container_id)
        .ok_or_else(|| JsValue::from_str(&format!("container #{container_id} missing")))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<web_sys::HtmlCanvasElement>()?;

    let size = window_surface_size(&window);
    apply_canvas_size(&canvas, size)?;
    container.append_child(&canvas)?;
    let mut teardown = Teardown::new();
    let attached = canvas.clone();
    teardown.push("canvas", move || attached.remove());

    let (width, height) = size.physical();
    let gpu = match init_wgpu_for_canvas(
        canvas.clone(),
        width,
        height,
        &scene,
        config.style.background,
    )
    .await
    {
        Ok(ctx) => ctx,
        Err(err) => {
            teardown.run();
            return Err(err);
        }
    };

    let state = Rc::new(RefCell::new(MapState {
        gpu: Some(gpu),
        viewport: Viewport::new(size),
        clock: AnimationClock::new(config.animation.speed),
        config,
        render_failures: 0,
    }));
    let gpu_state = state.clone();
    teardown.push("gpu", move || gpu_state.borrow_mut().release_gpu());

    let mounted = Mounted::attach(window, canvas, state, teardown)?;
    console_log(&format!("map mounted in #{container_id} at {width}x{height}"));
    Ok(MapView {
        mounted: Some(mounted),
    })
}
