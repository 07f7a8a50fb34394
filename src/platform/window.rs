use std::collections::{HashMap, VecDeque};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{ContextApi, ContextAttributesBuilder, NotCurrentContext, Version};
use glutin::display::{Display, DisplayApiPreference, GlDisplay};
use glutin::surface::{Surface, SurfaceAttributesBuilder, WindowSurface};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::EventLoopExtPumpEvents;
use winit::window::WindowId;

use super::{GlContext, Metric2, PlatformError, Window, WindowMessage};

const GL_MAJOR_VERSION: i32 = 3;
const GL_MINOR_VERSION: i32 = 3;

/// The engine window, pumping its winit event loop on demand and classifying
/// events into [`WindowMessage`]s one at a time.
pub struct GlWindow {
    event_loop: EventLoop<()>,
    shell: Shell,
}

impl GlWindow {
    /// Creates the hidden engine window together with its two rendering
    /// contexts, `(window, main, loading)`. Any platform failure here is
    /// fatal to startup.
    pub fn open(
        title: &str,
        size: Metric2,
        visible: bool,
    ) -> Result<(GlWindow, GlContext, GlContext), PlatformError> {
        let mut event_loop = EventLoop::new()?;

        let mut bootstrap = Bootstrap {
            title: title.to_owned(),
            size,
            created: None,
        };
        event_loop.pump_app_events(Some(Duration::ZERO), &mut bootstrap);
        let created = bootstrap.created.take().ok_or(PlatformError::NoResume)??;

        let surface = Arc::new(created.surface);
        let main = GlContext::new(&created.display, created.main, Arc::clone(&surface))?;

        let (major, minor) = main.version();
        log::info!(
            "target OpenGL version ({GL_MAJOR_VERSION}.{GL_MINOR_VERSION}), system version ({major}.{minor})"
        );
        if (major, minor) < (GL_MAJOR_VERSION, GL_MINOR_VERSION) {
            log::warn!("target OpenGL version not supported by this system");
        }

        let loading = GlContext::new(&created.display, created.loading, surface)?;

        let window = created.window;
        window.set_visible(visible);

        let position = window
            .outer_position()
            .map(|p| Metric2::new(p.x, p.y))
            .unwrap_or(Metric2::ZERO);
        let inner = window.inner_size();

        let shell = Shell {
            window,
            messages: VecDeque::new(),
            title: title.to_owned(),
            size: Metric2::new(inner.width as i32, inner.height as i32),
            position,
            visible,
            focused: false,
            mouse: Metric2::ZERO,
            buttons: hashmap! {},
            keys: hashmap! {},
        };

        Ok((GlWindow { event_loop, shell }, main, loading))
    }
}

impl Window for GlWindow {
    fn poll_message(&mut self) -> Option<WindowMessage> {
        if self.shell.messages.is_empty() {
            self.event_loop
                .pump_app_events(Some(Duration::ZERO), &mut self.shell);
        }
        self.shell.messages.pop_front()
    }

    fn title(&self) -> &str {
        &self.shell.title
    }

    fn set_title(&mut self, title: &str) {
        self.shell.title = title.to_owned();
        self.shell.window.set_title(title);
    }

    fn size(&self) -> Metric2 {
        self.shell.size
    }

    fn set_size(&mut self, size: Metric2) {
        self.shell.size = size;
        let _ = self
            .shell
            .window
            .request_inner_size(PhysicalSize::new(size.x.max(0) as u32, size.y.max(0) as u32));
    }

    fn position(&self) -> Metric2 {
        self.shell.position
    }

    fn set_position(&mut self, position: Metric2) {
        self.shell.position = position;
        self.shell
            .window
            .set_outer_position(PhysicalPosition::new(position.x, position.y));
    }

    fn visible(&self) -> bool {
        self.shell.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.shell.visible = visible;
        self.shell.window.set_visible(visible);
    }

    fn focused(&self) -> bool {
        self.shell.focused
    }

    fn focus(&mut self) {
        self.shell.window.focus_window();
    }

    fn mouse(&self) -> Metric2 {
        self.shell.mouse
    }

    fn set_mouse(&mut self, position: Metric2) {
        self.shell.mouse = position;
        if let Err(err) = self
            .shell
            .window
            .set_cursor_position(PhysicalPosition::new(position.x, position.y))
        {
            log::warn!("error warping the cursor ({err})");
        }
    }

    fn button(&self, button: MouseButton) -> bool {
        self.shell.buttons.get(&button).copied().unwrap_or(false)
    }

    fn key(&self, key: KeyCode) -> bool {
        self.shell.keys.get(&key).copied().unwrap_or(false)
    }
}

/// Everything behind the pump: the native window, the queue of classified
/// messages, and the polled input state the messages update as a byproduct.
struct Shell {
    window: winit::window::Window,
    messages: VecDeque<WindowMessage>,
    title: String,
    size: Metric2,
    position: Metric2,
    visible: bool,
    focused: bool,
    mouse: Metric2,
    buttons: HashMap<MouseButton, bool>,
    keys: HashMap<KeyCode, bool>,
}

impl ApplicationHandler for Shell {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if window_id != self.window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.messages.push_back(WindowMessage::Close);
            }
            WindowEvent::Focused(focused) => {
                self.focused = focused;
                self.messages.push_back(if focused {
                    WindowMessage::FocusGained
                } else {
                    WindowMessage::FocusLost
                });
            }
            WindowEvent::Moved(position) => {
                self.position = Metric2::new(position.x, position.y);
                self.messages.push_back(WindowMessage::WindowMoved);
            }
            WindowEvent::Resized(size) => {
                self.size = Metric2::new(size.width as i32, size.height as i32);
                self.messages.push_back(WindowMessage::WindowSizeChanged);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse = Metric2::new(position.x as i32, position.y as i32);
                self.messages.push_back(WindowMessage::MouseMotion);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.buttons.insert(button, state == ElementState::Pressed);
                self.messages.push_back(match state {
                    ElementState::Pressed => WindowMessage::ButtonDown,
                    ElementState::Released => WindowMessage::ButtonUp,
                });
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.keys.insert(code, event.state == ElementState::Pressed);
                }
                self.messages.push_back(match event.state {
                    ElementState::Pressed => WindowMessage::KeyDown,
                    ElementState::Released => WindowMessage::KeyUp,
                });
            }
            // redraw pacing belongs to the engine loop, not the pump
            WindowEvent::RedrawRequested => {}
            _ => {
                self.messages.push_back(WindowMessage::Nothing);
            }
        }
    }
}

/// One-shot handler that builds the window, framebuffer config, surface and
/// both contexts on the first `resumed` callback.
struct Bootstrap {
    title: String,
    size: Metric2,
    created: Option<Result<Created, PlatformError>>,
}

struct Created {
    window: winit::window::Window,
    display: Display,
    surface: Surface<WindowSurface>,
    main: NotCurrentContext,
    loading: NotCurrentContext,
}

impl ApplicationHandler for Bootstrap {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.created.is_none() {
            self.created = Some(build_display(event_loop, &self.title, self.size));
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        _event: WindowEvent,
    ) {
    }
}

/// Highest-sample-count config wins; first wins a tie. `None` when the
/// display offered nothing.
fn richest_config<T>(configs: impl Iterator<Item = T>, samples: impl Fn(&T) -> u8) -> Option<T> {
    configs.reduce(|best, config| {
        if samples(&config) > samples(&best) {
            config
        } else {
            best
        }
    })
}

fn build_display(
    event_loop: &ActiveEventLoop,
    title: &str,
    size: Metric2,
) -> Result<Created, PlatformError> {
    let attributes = winit::window::Window::default_attributes()
        .with_title(title)
        .with_inner_size(PhysicalSize::new(size.x.max(1) as u32, size.y.max(1) as u32))
        .with_visible(false);
    let window = event_loop.create_window(attributes)?;

    let display_handle = window
        .display_handle()
        .map_err(|err| PlatformError::Display(err.to_string()))?
        .as_raw();

    #[cfg(target_os = "windows")]
    let preference = DisplayApiPreference::Wgl(None);
    #[cfg(target_os = "macos")]
    let preference = DisplayApiPreference::Cgl;
    #[cfg(all(unix, not(target_os = "macos")))]
    let preference = DisplayApiPreference::Egl;

    let display = unsafe { Display::new(display_handle, preference) }?;

    let template = ConfigTemplateBuilder::new().with_depth_size(24).build();
    let configs = unsafe { display.find_configs(template) }?;
    let config = richest_config(configs, GlConfig::num_samples)
        .ok_or_else(|| PlatformError::Display("no matching framebuffer config".into()))?;

    let handle = window
        .window_handle()
        .map_err(|err| PlatformError::Display(err.to_string()))?
        .as_raw();

    let context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(
            GL_MAJOR_VERSION as u8,
            GL_MINOR_VERSION as u8,
        ))))
        .build(Some(handle));

    // two independent contexts against the one window: the engine renders the
    // loading screen on one while a loader thread builds levels on the other
    let main = unsafe { display.create_context(&config, &context_attributes) }?;
    let loading = unsafe { display.create_context(&config, &context_attributes) }?;

    let inner = window.inner_size();
    let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
        handle,
        NonZeroU32::new(inner.width).unwrap_or(NonZeroU32::MIN),
        NonZeroU32::new(inner.height).unwrap_or(NonZeroU32::MIN),
    );
    let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }?;

    Ok(Created {
        window,
        display,
        surface,
        main,
        loading,
    })
}
