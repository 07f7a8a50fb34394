use crate::engine::{EngineCore, Rgba, TimerData};
use crate::platform::{GraphicsContext, Window};

/// A runnable game state. The engine drives exactly one level per frame:
/// zero or more fixed-rate `update` calls followed by a single `draw`.
pub trait Level<W: Window, C: GraphicsContext>: Send {
    /// One fixed simulation step.
    fn update(&mut self, core: &mut EngineCore<W, C>, time: &TimerData);

    /// Called once per frame after the engine clears the active surface.
    fn draw(&mut self, core: &mut EngineCore<W, C>, time: &TimerData);

    /// Called when the window surface changes size, and once before the
    /// level's first draw.
    fn resize(&mut self, core: &mut EngineCore<W, C>);

    /// Fixed updates per second; 0 means draw-only, `update` is never called.
    fn ups(&self) -> u32;
}

/// Construction entry point used by `Engine::change_level`. Runs on the
/// loader thread with the engine's main context current, and must not touch
/// the loading context.
pub trait LoadLevel<W: Window, C: GraphicsContext>: Level<W, C> + Sized {
    fn load(context: &C) -> anyhow::Result<Self>;
}

/// Always-resident level drawn while another level is being constructed in
/// the background.
pub struct LoadingScreen {
    colour: Rgba,
}

impl LoadingScreen {
    pub fn new() -> LoadingScreen {
        LoadingScreen {
            colour: Rgba::new(0.2, 0.2, 0.25, 1.0),
        }
    }
}

impl<W: Window, C: GraphicsContext> Level<W, C> for LoadingScreen {
    fn update(&mut self, _core: &mut EngineCore<W, C>, _time: &TimerData) {}

    fn draw(&mut self, core: &mut EngineCore<W, C>, time: &TimerData) {
        // pulse the backdrop so a stalled load is visible
        let pulse = 0.75 + 0.25 * (time.current.as_secs_f32() * 2.0).sin();
        core.loading.clear(Rgba::new(
            self.colour.r * pulse,
            self.colour.g * pulse,
            self.colour.b * pulse,
            self.colour.a,
        ));
    }

    fn resize(&mut self, _core: &mut EngineCore<W, C>) {}

    fn ups(&self) -> u32 {
        0
    }
}
