#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use osmium::engine::{EngineCore, Rgba, TimerData};
use osmium::level::Level;
use osmium::platform::{GraphicsContext, Metric2, PlatformError, Window, WindowMessage};

#[derive(Default)]
pub struct FakeContextState {
    pub make_current_calls: AtomicUsize,
    pub unbind_calls: AtomicUsize,
    pub swap_interval: AtomicU32,
    pub interval_history: Mutex<Vec<u32>>,
    pub clears: AtomicUsize,
    pub presents: AtomicUsize,
    pub viewports: Mutex<Vec<(i32, i32, i32, i32)>>,
}

/// Recording stand-in for a GL context; clones share one state.
#[derive(Clone, Default)]
pub struct FakeContext(pub Arc<FakeContextState>);

impl GraphicsContext for FakeContext {
    fn make_current(&self) -> Result<(), PlatformError> {
        self.0.make_current_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unbind_current(&self) -> Result<(), PlatformError> {
        self.0.unbind_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_swap_interval(&self, interval: u32) -> Result<(), PlatformError> {
        self.0.swap_interval.store(interval, Ordering::SeqCst);
        self.0.interval_history.lock().push(interval);
        Ok(())
    }

    fn swap_interval(&self) -> u32 {
        self.0.swap_interval.load(Ordering::SeqCst)
    }

    fn clear(&self, _colour: Rgba) {
        self.0.clears.fetch_add(1, Ordering::SeqCst);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.0.viewports.lock().push((x, y, width, height));
    }

    fn present(&self) -> Result<(), PlatformError> {
        self.0.presents.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeWindowState {
    pub script: VecDeque<VecDeque<WindowMessage>>,
    pub current: VecDeque<WindowMessage>,
    pub injected: VecDeque<WindowMessage>,
    pub title: String,
    pub size: Metric2,
    pub position: Metric2,
    pub visible: bool,
    pub focused: bool,
    pub mouse: Metric2,
}

/// Scripted window: one batch of messages is delivered per frame, in order,
/// and levels may inject extra messages for the following frame.
#[derive(Clone, Default)]
pub struct FakeWindow(pub Arc<Mutex<FakeWindowState>>);

impl FakeWindow {
    pub fn with_script(size: Metric2, script: Vec<Vec<WindowMessage>>) -> FakeWindow {
        let window = FakeWindow::default();
        {
            let mut state = window.0.lock();
            state.size = size;
            state.script = script.into_iter().map(VecDeque::from).collect();
            if let Some(batch) = state.script.pop_front() {
                state.current = batch;
            }
        }
        window
    }

    pub fn push_message(&self, message: WindowMessage) {
        self.0.lock().injected.push_back(message);
    }

    pub fn set_reported_size(&self, size: Metric2) {
        self.0.lock().size = size;
    }
}

impl Window for FakeWindow {
    fn poll_message(&mut self) -> Option<WindowMessage> {
        let mut state = self.0.lock();
        if let Some(message) = state.current.pop_front() {
            return Some(message);
        }
        if let Some(message) = state.injected.pop_front() {
            return Some(message);
        }
        // frame boundary: stage the next scripted batch
        if let Some(batch) = state.script.pop_front() {
            state.current = batch;
        }
        None
    }

    fn title(&self) -> &str {
        // titles are recorded in the shared state; tests read them there
        ""
    }

    fn set_title(&mut self, title: &str) {
        self.0.lock().title = title.to_owned();
    }

    fn size(&self) -> Metric2 {
        self.0.lock().size
    }

    fn set_size(&mut self, size: Metric2) {
        self.0.lock().size = size;
    }

    fn position(&self) -> Metric2 {
        self.0.lock().position
    }

    fn set_position(&mut self, position: Metric2) {
        self.0.lock().position = position;
    }

    fn visible(&self) -> bool {
        self.0.lock().visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.0.lock().visible = visible;
    }

    fn focused(&self) -> bool {
        self.0.lock().focused
    }

    fn focus(&mut self) {
        self.0.lock().focused = true;
    }

    fn mouse(&self) -> Metric2 {
        self.0.lock().mouse
    }

    fn set_mouse(&mut self, position: Metric2) {
        self.0.lock().mouse = position;
    }

    fn button(&self, _button: winit::event::MouseButton) -> bool {
        false
    }

    fn key(&self, _key: winit::keyboard::KeyCode) -> bool {
        false
    }
}

#[derive(Default)]
pub struct ProbeStats {
    pub updates: AtomicU64,
    pub draws: AtomicUsize,
    pub resizes: AtomicUsize,
    pub events: Mutex<Vec<&'static str>>,
    pub update_mismatch: AtomicBool,
}

/// Level that records every call the engine makes and can steer the loop
/// through the window it is handed.
pub struct Probe {
    pub ups: u32,
    pub close_after_draws: usize,
    pub resize_at_draw: Option<usize>,
    pub stats: Arc<ProbeStats>,
}

impl Probe {
    pub fn new(ups: u32, close_after_draws: usize) -> (Probe, Arc<ProbeStats>) {
        let stats = Arc::new(ProbeStats::default());
        let probe = Probe {
            ups,
            close_after_draws,
            resize_at_draw: None,
            stats: Arc::clone(&stats),
        };
        (probe, stats)
    }
}

impl Level<FakeWindow, FakeContext> for Probe {
    fn update(&mut self, _core: &mut EngineCore<FakeWindow, FakeContext>, _time: &TimerData) {
        self.stats.updates.fetch_add(1, Ordering::SeqCst);
        self.stats.events.lock().push("update");
    }

    fn draw(&mut self, core: &mut EngineCore<FakeWindow, FakeContext>, time: &TimerData) {
        if self.ups != 0 {
            // the engine must have caught the simulation up to the frame
            // clock before drawing: updates == floor(elapsed * ups)
            let expected = (time.current.as_secs_f64() * self.ups as f64) as u64;
            if self.stats.updates.load(Ordering::SeqCst) != expected {
                self.stats.update_mismatch.store(true, Ordering::SeqCst);
            }
        }

        let draws = self.stats.draws.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.events.lock().push("draw");

        if let Some(at) = self.resize_at_draw {
            if draws == at {
                core.window.set_reported_size(Metric2::new(800, 600));
                core.window.push_message(WindowMessage::WindowSizeChanged);
            }
        }
        if draws >= self.close_after_draws {
            core.window.push_message(WindowMessage::Close);
        }
    }

    fn resize(&mut self, _core: &mut EngineCore<FakeWindow, FakeContext>) {
        self.stats.resizes.fetch_add(1, Ordering::SeqCst);
        self.stats.events.lock().push("resize");
    }

    fn ups(&self) -> u32 {
        self.ups
    }
}
