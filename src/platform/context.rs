use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use glow::HasContext;
use glutin::context::{
    NotCurrentContext, NotCurrentGlContext, PossiblyCurrentContext, PossiblyCurrentGlContext,
};
use glutin::display::{Display, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use parking_lot::Mutex;

use crate::engine::Rgba;

use super::{GraphicsContext, PlatformError};

enum ContextState {
    NotCurrent(NotCurrentContext),
    Current(PossiblyCurrentContext),
}

/// One of the two GL contexts attached to the engine window. Both contexts
/// target the same window surface.
///
/// Safety: the engine only ever hands a context to another thread while it is
/// unbound, and only the thread that most recently made a context current
/// issues GL calls or presents through it. The `Send`/`Sync` impls below rely
/// on that protocol.
pub struct GlContext {
    surface: Arc<Surface<WindowSurface>>,
    state: Mutex<Option<ContextState>>,
    gl: glow::Context,
    swap_interval: AtomicU32,
}

unsafe impl Send for GlContext {}
unsafe impl Sync for GlContext {}

impl GlContext {
    pub(crate) fn new(
        display: &Display,
        context: NotCurrentContext,
        surface: Arc<Surface<WindowSurface>>,
    ) -> Result<GlContext, PlatformError> {
        let current = context.make_current(&surface)?;
        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name))
        };

        let context = GlContext {
            surface,
            state: Mutex::new(Some(ContextState::Current(current))),
            gl,
            swap_interval: AtomicU32::new(0),
        };
        context.set_swap_interval(0)?;

        Ok(context)
    }

    /// OpenGL version reported by the driver for this context.
    pub(crate) fn version(&self) -> (i32, i32) {
        let major = unsafe { self.gl.get_parameter_i32(glow::MAJOR_VERSION) };
        let minor = unsafe { self.gl.get_parameter_i32(glow::MINOR_VERSION) };
        (major, minor)
    }
}

impl GraphicsContext for GlContext {
    fn make_current(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        match state.take() {
            Some(ContextState::NotCurrent(context)) => {
                *state = Some(ContextState::Current(context.make_current(&self.surface)?));
            }
            Some(ContextState::Current(context)) => {
                context.make_current(&self.surface)?;
                *state = Some(ContextState::Current(context));
            }
            None => return Err(PlatformError::NotCurrent),
        }
        Ok(())
    }

    fn unbind_current(&self) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        match state.take() {
            Some(ContextState::Current(context)) => {
                *state = Some(ContextState::NotCurrent(context.make_not_current()?));
                Ok(())
            }
            Some(not_current) => {
                *state = Some(not_current);
                Ok(())
            }
            None => Err(PlatformError::NotCurrent),
        }
    }

    fn set_swap_interval(&self, interval: u32) -> Result<(), PlatformError> {
        let state = self.state.lock();
        let Some(ContextState::Current(context)) = state.as_ref() else {
            return Err(PlatformError::NotCurrent);
        };

        let mode = match NonZeroU32::new(interval) {
            Some(n) => SwapInterval::Wait(n),
            None => SwapInterval::DontWait,
        };
        self.surface.set_swap_interval(context, mode)?;
        self.swap_interval.store(interval, Ordering::Relaxed);
        Ok(())
    }

    fn swap_interval(&self) -> u32 {
        self.swap_interval.load(Ordering::Relaxed)
    }

    fn clear(&self, colour: Rgba) {
        unsafe {
            self.gl.clear_color(colour.r, colour.g, colour.b, colour.a);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        // EGL backends want the surface resized alongside the viewport
        if let (Some(w), Some(h)) = (
            NonZeroU32::new(width.max(0) as u32),
            NonZeroU32::new(height.max(0) as u32),
        ) {
            let state = self.state.lock();
            if let Some(ContextState::Current(context)) = state.as_ref() {
                self.surface.resize(context, w, h);
            }
        }
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn present(&self) -> Result<(), PlatformError> {
        let state = self.state.lock();
        let Some(ContextState::Current(context)) = state.as_ref() else {
            return Err(PlatformError::NotCurrent);
        };
        self.surface.swap_buffers(context)?;
        Ok(())
    }
}
