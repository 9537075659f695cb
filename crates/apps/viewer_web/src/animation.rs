use std::cell::RefCell;
use std::rc::Rc;

use runtime::FrameLoop;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

type FrameCallback = Closure<dyn FnMut(f64)>;

/// `requestAnimationFrame` driver for a [`FrameLoop`].
///
/// The loop owns the JS callback; the callback only holds a weak handle to
/// it, so dropping the loop (or [`AnimationLoop::cancel`]) frees it.
pub struct AnimationLoop {
    frames: FrameLoop<i32>,
    callback: Rc<RefCell<Option<FrameCallback>>>,
}

impl AnimationLoop {
    /// Starts the loop; `on_frame` receives the host timestamp in milliseconds.
    pub fn start<F>(window: &web_sys::Window, mut on_frame: F) -> Result<Self, JsValue>
    where
        F: FnMut(f64) + 'static,
    {
        let frames: FrameLoop<i32> = FrameLoop::new();
        let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));

        let this = Rc::downgrade(&callback);
        let tick_frames = frames.clone();
        let tick_window = window.clone();

        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |now_ms: f64| {
            let next = tick_frames.tick(
                || on_frame(now_ms),
                || {
                    let cb = this
                        .upgrade()
                        .ok_or_else(|| JsValue::from_str("animation callback dropped"))?;
                    let cb = cb.borrow();
                    let cb = cb
                        .as_ref()
                        .ok_or_else(|| JsValue::from_str("animation callback released"))?;
                    tick_window.request_animation_frame(cb.as_ref().unchecked_ref())
                },
            );
            if let Err(err) = next {
                web_sys::console::error_1(&JsValue::from_str(&format!(
                    "requestAnimationFrame failed: {err:?}"
                )));
            }
        }) as Box<dyn FnMut(f64)>));

        frames.start(|| {
            let cb = callback.borrow();
            let cb = cb
                .as_ref()
                .ok_or_else(|| JsValue::from_str("animation callback missing"))?;
            window.request_animation_frame(cb.as_ref().unchecked_ref())
        })?;

        Ok(Self { frames, callback })
    }

    /// Shared view of the loop state, for callers that outlive a borrow.
    pub fn frames(&self) -> FrameLoop<i32> {
        self.frames.clone()
    }

    pub fn cancel(&self, window: &web_sys::Window) {
        self.frames.cancel(|id| {
            if let Err(err) = window.cancel_animation_frame(id) {
                crate::console_warn(&format!("cancelAnimationFrame({id}) failed: {err:?}"));
            }
        });
        self.callback.borrow_mut().take();
    }
}
