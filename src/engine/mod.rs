mod colour;
mod counter;
mod timer;

pub use colour::*;
pub use counter::*;
pub use timer::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::level::{Level, LoadLevel, LoadingScreen};
use crate::platform::{GraphicsContext, PlatformError, Window, WindowMessage};

/// Engine settings persisted through confy by the host binary.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub vsync: bool,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            title: "Osmium".into(),
            width: 960,
            height: 540,
            vsync: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("error spawning the level loader thread ({0})")]
    Spawn(#[source] std::io::Error),
    #[error("level construction failed")]
    LevelLoad(#[source] anyhow::Error),
    #[error("the level loader thread hung up without publishing a level")]
    LoaderLost,
    #[error("the level loader thread panicked")]
    LoaderPanicked,
}

/// Everything a level may touch while it runs: the window, the frame counter
/// and both graphics contexts. Created once at engine construction, never
/// reassigned.
pub struct EngineCore<W: Window, C: GraphicsContext> {
    pub window: W,
    pub counter: FrameCounter,
    pub context: Arc<C>,
    pub loading: Arc<C>,
}

/// Result of a background level construction, published by the loader thread
/// through a single-slot channel.
struct LoadedLevel<W: Window + 'static, C: GraphicsContext + 'static> {
    level: Box<dyn Level<W, C>>,
    start: Duration,
}

/// Number of fixed updates a level is owed `elapsed` time after its start.
pub(crate) fn update_target(elapsed: Duration, ups: u32) -> u64 {
    (elapsed.as_secs_f64() * ups as f64) as u64
}

pub struct Engine<W, C>
where
    W: Window + 'static,
    C: GraphicsContext + Send + Sync + 'static,
{
    core: EngineCore<W, C>,
    timer: Timer,
    title: String,
    level: Option<Box<dyn Level<W, C>>>,
    loading_screen: Box<dyn Level<W, C>>,
    loading: Arc<AtomicBool>,
    pending: Option<Receiver<anyhow::Result<LoadedLevel<W, C>>>>,
    load_thread: Option<thread::JoinHandle<()>>,
    level_start: Duration,
    level_updates: u64,
    level_new: bool,
    swap_interval: u32,
    clear_colour: Rgba,
}

impl<W, C> Engine<W, C>
where
    W: Window + 'static,
    C: GraphicsContext + Send + Sync + 'static,
{
    pub fn new(window: W, context: C, loading: C) -> Result<Engine<W, C>, EngineError> {
        let context = Arc::new(context);
        let loading = Arc::new(loading);

        context.make_current()?;
        context.set_swap_interval(0)?;

        loading.make_current()?;
        loading.set_swap_interval(0)?;

        let title = window.title().to_owned();

        let mut engine = Engine {
            core: EngineCore {
                window,
                counter: FrameCounter::new(),
                context,
                loading,
            },
            timer: Timer::new(),
            title,
            level: None,
            loading_screen: Box::new(LoadingScreen::new()),
            loading: Arc::new(AtomicBool::new(false)),
            pending: None,
            load_thread: None,
            level_start: Duration::ZERO,
            level_updates: 0,
            level_new: false,
            swap_interval: 0,
            clear_colour: Rgba::new(0.5, 0.5, 0.5, 1.0),
        };

        // size the loading screen against the freshly created surface
        let context = Arc::clone(&engine.core.loading);
        Self::apply_resize(&mut engine.core, context.as_ref(), engine.loading_screen.as_mut());

        Ok(engine)
    }

    pub fn core(&self) -> &EngineCore<W, C> {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut EngineCore<W, C> {
        &mut self.core
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn set_clear_colour(&mut self, colour: Rgba) {
        self.clear_colour = colour;
    }

    pub fn set_swap_interval(&mut self, interval: u32) {
        self.swap_interval = interval;
    }

    pub fn set_loading_screen(&mut self, loading_screen: Box<dyn Level<W, C>>) {
        self.loading_screen = loading_screen;
    }

    /// Begins an asynchronous transition to a new level of type `T`.
    ///
    /// The level is constructed on a loader thread with the engine's main
    /// context current while the loop keeps drawing the loading screen on its
    /// own context. At most one transition may be in flight, a second request
    /// is dropped with a warning.
    pub fn change_level<T>(&mut self) -> Result<(), EngineError>
    where
        T: LoadLevel<W, C> + 'static,
    {
        if self.is_loading() {
            log::warn!(
                "change level ({}) aborted, a level is already loading",
                std::any::type_name::<T>()
            );
            return Ok(());
        }
        self.change_level_with(|context| {
            T::load(context).map(|level| Box::new(level) as Box<dyn Level<W, C>>)
        })
    }

    /// Closure form of [`Engine::change_level`]; `load` runs on the loader
    /// thread with the main context current.
    pub fn change_level_with<F>(&mut self, load: F) -> Result<(), EngineError>
    where
        F: FnOnce(&C) -> anyhow::Result<Box<dyn Level<W, C>>> + Send + 'static,
    {
        if self.loading.load(Ordering::Acquire) {
            log::warn!("level change aborted, another level is still loading");
            return Ok(());
        }
        self.loading.store(true, Ordering::Release);

        // Establish the loading context on the main thread before the loader
        // takes the main one.
        if let Err(err) = self.core.loading.make_current() {
            self.loading.store(false, Ordering::Release);
            return Err(err.into());
        }

        let context = Arc::clone(&self.core.context);
        let flag = Arc::clone(&self.loading);
        let start = self.timer.data().current;
        let (slot, pending) = crossbeam_channel::bounded(1);

        let spawned = thread::Builder::new()
            .name("level-loader".into())
            .spawn(move || {
                let result = (|| {
                    context.make_current()?;
                    let level = load(context.as_ref())?;
                    context.unbind_current()?;
                    Ok(LoadedLevel { level, start })
                })();
                // publish before signalling completion, the loop reads the
                // flag first
                let _ = slot.send(result);
                flag.store(false, Ordering::Release);
            });

        match spawned {
            Ok(handle) => {
                self.pending = Some(pending);
                self.load_thread = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.loading.store(false, Ordering::Release);
                Err(EngineError::Spawn(err))
            }
        }
    }

    /// Runs the engine loop until the window is closed or a load fails.
    pub fn run(&mut self) -> Result<(), EngineError> {
        self.timer.reset();

        log::info!("engine loop started");
        self.core.window.set_visible(true);

        let result = self.run_loop();

        log::info!("engine loop escaped");
        self.core.window.set_visible(false);

        let joined = match self.load_thread.take() {
            Some(handle) => {
                log::info!("waiting for the level loader thread to finish");
                handle.join().map_err(|_| EngineError::LoaderPanicked)
            }
            None => Ok(()),
        };

        result.and(joined)
    }

    fn run_loop(&mut self) -> Result<(), EngineError> {
        let mut seconds = 0;

        loop {
            // 1. settle a finished load, then select the active pair; the
            // flag is read once per frame so the selection cannot tear
            let loading_now = self.loading.load(Ordering::Acquire);
            if loading_now {
                let loader_dead = self.load_thread.as_ref().is_some_and(|h| h.is_finished())
                    && self.pending.as_ref().is_some_and(|slot| slot.is_empty());
                if loader_dead {
                    return Err(EngineError::LoaderPanicked);
                }
            } else if let Some(slot) = self.pending.take() {
                match slot.try_recv() {
                    Ok(Ok(loaded)) => {
                        self.level = Some(loaded.level);
                        self.level_start = loaded.start;
                        self.level_updates = 0;
                        self.level_new = true;
                    }
                    Ok(Err(err)) => return Err(EngineError::LevelLoad(err)),
                    Err(_) => return Err(EngineError::LoaderLost),
                }
            }

            let busy = loading_now || self.level.is_none();
            let context = if busy {
                Arc::clone(&self.core.loading)
            } else {
                Arc::clone(&self.core.context)
            };
            context.make_current()?;

            // 2. first frame after a load forces a viewport pass before any
            // draw against the new level
            if !busy && self.level_new {
                if let Some(level) = self.level.as_mut() {
                    Self::apply_resize(&mut self.core, context.as_ref(), level.as_mut());
                }
                self.level_new = false;
            }

            // 3. reconcile the present interval with the focus-derived target
            if context.swap_interval() != self.swap_interval {
                context.set_swap_interval(self.swap_interval)?;
            }

            // 4. drain the message queue; close ends the loop once the drain
            // finishes
            let mut running = true;
            let mut resized = false;
            while let Some(message) = self.core.window.poll_message() {
                match message {
                    WindowMessage::Close => running = false,
                    WindowMessage::FocusGained => self.swap_interval = 0,
                    WindowMessage::FocusLost => self.swap_interval = 1,
                    WindowMessage::WindowSizeChanged => resized = true,
                    _ => {}
                }
            }
            if !running {
                return Ok(());
            }

            // 5. advance the timer
            self.timer.update();
            let time = self.timer.data();

            let active: &mut dyn Level<W, C> = match (busy, self.level.as_mut()) {
                (false, Some(level)) => level.as_mut(),
                _ => self.loading_screen.as_mut(),
            };

            if resized {
                Self::apply_resize(&mut self.core, context.as_ref(), active);
            }

            // 6. catch the simulation up to the frame clock
            let ups = active.ups();
            if ups != 0 {
                let elapsed = time.current.saturating_sub(self.level_start);
                let target = update_target(elapsed, ups);
                while self.level_updates < target {
                    active.update(&mut self.core, &time);
                    self.level_updates += 1;
                }
            }

            // 7. draw exactly once per frame
            context.clear(self.clear_colour);
            active.draw(&mut self.core, &time);

            // 8. present and keep the diagnostics up to date
            context.present()?;
            self.core.counter.push(time.current);

            let whole = time.current.as_secs();
            if whole > seconds {
                let fps = self.core.counter.fps(time.current);
                let title = format!("{} FPS: {}", self.title, fps);
                self.core.window.set_title(&title);
                seconds = whole;
            }
        }
    }

    fn apply_resize(core: &mut EngineCore<W, C>, context: &C, level: &mut dyn Level<W, C>) {
        let size = core.window.size();
        context.viewport(0, 0, size.x, size.y);
        level.resize(core);
    }
}
