use osmium::engine::{Engine, EngineConfig, EngineCore, Rgba, TimerData};
use osmium::level::{Level, LoadLevel};
use osmium::platform::{GlContext, GlWindow, GraphicsContext, Metric2, Window};

use winit::keyboard::KeyCode;

/// Demo level: cycles the backdrop colour at a fixed simulation rate and
/// speeds the cycle up while space is held.
struct ColourWheel {
    tick: u64,
    colour: Rgba,
}

impl Level<GlWindow, GlContext> for ColourWheel {
    fn update(&mut self, core: &mut EngineCore<GlWindow, GlContext>, _time: &TimerData) {
        let step = if core.window.key(KeyCode::Space) { 4 } else { 1 };
        self.tick += step;

        let angle = self.tick as f32 / 240.0;
        self.colour = Rgba::new(
            0.5 + 0.5 * angle.sin(),
            0.5 + 0.5 * (angle + std::f32::consts::FRAC_PI_3 * 2.0).sin(),
            0.5 + 0.5 * (angle + std::f32::consts::FRAC_PI_3 * 4.0).sin(),
            1.0,
        );
    }

    fn draw(&mut self, core: &mut EngineCore<GlWindow, GlContext>, _time: &TimerData) {
        core.context.clear(self.colour);
    }

    fn resize(&mut self, core: &mut EngineCore<GlWindow, GlContext>) {
        let size = core.window.size();
        log::debug!("colour wheel resized to {}x{}", size.x, size.y);
    }

    fn ups(&self) -> u32 {
        120
    }
}

impl LoadLevel<GlWindow, GlContext> for ColourWheel {
    fn load(_context: &GlContext) -> anyhow::Result<ColourWheel> {
        Ok(ColourWheel {
            tick: 0,
            colour: Rgba::new(0.5, 0.5, 0.5, 1.0),
        })
    }
}

fn main() -> anyhow::Result<()> {
    let _ = env_logger::try_init();

    let config: EngineConfig = confy::load("osmium", Some("engine"))?;

    let (window, context, loading) = GlWindow::open(
        &config.title,
        Metric2::new(config.width, config.height),
        false,
    )?;

    let mut engine = Engine::new(window, context, loading)?;
    engine.set_swap_interval(config.vsync as u32);
    engine.change_level::<ColourWheel>()?;
    engine.run()?;

    Ok(())
}
