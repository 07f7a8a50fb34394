mod context;
mod window;

pub use context::*;
pub use window::*;

use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::engine::Rgba;

/// Integer window metric (size or position), in physical pixels.
pub type Metric2 = glam::IVec2;

/// Classification of one polled platform event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMessage {
    Nothing,
    Close,
    FocusGained,
    FocusLost,
    WindowMoved,
    WindowSizeChanged,
    MouseMotion,
    ButtonDown,
    ButtonUp,
    KeyDown,
    KeyUp,
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("error initializing the event loop ({0})")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("error creating the window ({0})")]
    Window(#[from] winit::error::OsError),
    #[error("error negotiating the display ({0})")]
    Display(String),
    #[error("graphics context error ({0})")]
    Context(#[from] glutin::error::Error),
    #[error("the event loop never resumed during startup")]
    NoResume,
    #[error("the graphics context is not current on this thread")]
    NotCurrent,
}

/// The native window and its polled input state.
///
/// Messages report *that* something changed; the boolean key/button state is
/// the durable source of truth and may be queried at any time, independent of
/// drain order.
pub trait Window {
    /// Pops at most one pending platform event, classified. Returns `None`
    /// once the queue is empty; callers loop until then each frame.
    /// Classification updates the cached focus/size/position/input state
    /// whether or not the caller acts on the message.
    fn poll_message(&mut self) -> Option<WindowMessage>;

    fn title(&self) -> &str;
    fn set_title(&mut self, title: &str);

    fn size(&self) -> Metric2;
    fn set_size(&mut self, size: Metric2);

    fn position(&self) -> Metric2;
    fn set_position(&mut self, position: Metric2);

    fn visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);

    fn focused(&self) -> bool;
    /// Raises the window and requests input focus.
    fn focus(&mut self);

    fn mouse(&self) -> Metric2;
    /// Warps the cursor to a position in window coordinates.
    fn set_mouse(&mut self, position: Metric2);

    fn button(&self, button: MouseButton) -> bool;
    fn key(&self, key: KeyCode) -> bool;
}

/// One of the rendering contexts bound to the engine window.
///
/// A context may be current on at most one thread at a time, and the two
/// engine contexts are never made current on the same thread concurrently;
/// the level-load protocol is what upholds this.
pub trait GraphicsContext {
    /// Binds this context to the calling thread.
    fn make_current(&self) -> Result<(), PlatformError>;

    /// Detaches this context from the calling thread so another thread may
    /// later claim it.
    fn unbind_current(&self) -> Result<(), PlatformError>;

    /// Present interval: 0 presents immediately, 1 waits for vsync. Only
    /// effective while the context is current on the calling thread.
    fn set_swap_interval(&self, interval: u32) -> Result<(), PlatformError>;
    fn swap_interval(&self) -> u32;

    /// Clears the colour and depth buffers.
    fn clear(&self, colour: Rgba);

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);

    /// Swaps the back and front buffers.
    fn present(&self) -> Result<(), PlatformError>;
}
