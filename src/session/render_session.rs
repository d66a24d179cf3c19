use std::ops::ControlFlow;

use crate::config::model::{RainConfig, ResizeEvent};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, TickIndex, Viewport};
use crate::foundation::error::RainResult;
use crate::rain::glyphs::GlyphSet;
use crate::rain::random::SeededRandom;
use crate::rain::renderer::RainRenderer;
use crate::render::cpu::CpuSurface;
use crate::render::font::MonospaceFont;
use crate::render::surface::FrameRGBA;
use crate::schedule::Scheduler;

/// Statistics of one [`RainSession::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Ticks run (= frames pushed to the sink).
    pub ticks: u64,
    /// Scheduled resizes applied during the run.
    pub resizes: u64,
}

/// A rain animation bound to a CPU surface.
///
/// The session owns the renderer, its surface and its random source, and replays the config's
/// resize timeline as ticks advance. All methods take `&mut self`, so ticks and resizes never
/// overlap.
pub struct RainSession {
    renderer: RainRenderer<CpuSurface, SeededRandom>,
    font: Option<MonospaceFont>,
    period: std::time::Duration,
    fps: Fps,
    seed: u64,
    next_tick: TickIndex,
    timeline: Vec<ResizeEvent>,
    next_resize: usize,
}

impl RainSession {
    /// Validate `config`, resolve its font and build the surface and renderer.
    #[tracing::instrument(skip(config))]
    pub fn new(config: &RainConfig) -> RainResult<Self> {
        config.validate()?;
        let font = MonospaceFont::resolve(&config.font)?;
        Self::with_font(config, font)
    }

    /// Like [`RainSession::new`] with an already resolved font (`None` draws no glyphs).
    pub fn with_font(config: &RainConfig, font: Option<MonospaceFont>) -> RainResult<Self> {
        config.validate()?;
        let glyphs = GlyphSet::new(&config.glyphs)?;
        let (rng, seed) = match config.seed {
            Some(seed) => (SeededRandom::from_seed(seed), seed),
            None => SeededRandom::from_entropy(),
        };
        let surface = CpuSurface::new(config.viewport, font.as_ref(), config.font_size_px as f32)?;
        let renderer =
            RainRenderer::initialize(config.viewport, config.params(), glyphs, surface, rng)?;

        tracing::info!(
            seed,
            width = config.viewport.width,
            height = config.viewport.height,
            columns = renderer.columns(),
            font = font.as_ref().map(MonospaceFont::family).unwrap_or("<none>"),
            "rain session ready"
        );

        Ok(Self {
            renderer,
            font,
            period: config.tick_period(),
            fps: config.fps()?,
            seed,
            next_tick: TickIndex(0),
            timeline: config.resizes.clone(),
            next_resize: 0,
        })
    }

    /// Run one tick, applying any resize scheduled for it first.
    pub fn tick(&mut self) -> RainResult<()> {
        self.step().map(|_| ())
    }

    /// Resize the surface now; every column restarts at the top.
    pub fn resize(&mut self, viewport: Viewport) -> RainResult<()> {
        self.renderer.on_resize(viewport)
    }

    /// Run `ticks` ticks and return the resulting frame.
    pub fn advance(&mut self, ticks: u64) -> RainResult<&FrameRGBA> {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(self.frame())
    }

    /// Drive ticks from `scheduler` and push every frame to `sink`.
    ///
    /// Scheduled resizes are applied before their tick and forwarded to the sink before that
    /// tick's frame. The sink is ended even when the run fails.
    #[tracing::instrument(skip(self, scheduler, sink), fields(seed = self.seed))]
    pub fn run(
        &mut self,
        scheduler: &mut dyn Scheduler,
        sink: &mut dyn FrameSink,
    ) -> RainResult<RunStats> {
        let viewport = self.viewport();
        sink.begin(SinkConfig {
            width: viewport.width,
            height: viewport.height,
            fps: self.fps,
        })?;

        let period = self.period;
        let mut resizes = 0u64;
        let outcome = scheduler.run_repeating(period, &mut |_| {
            let idx = self.next_tick;
            if let Some(viewport) = self.step()? {
                sink.resize(viewport)?;
                resizes += 1;
            }
            sink.push_frame(idx, self.renderer.surface().frame())?;
            Ok(ControlFlow::Continue(()))
        });
        let ticks = match outcome {
            Ok(ticks) => ticks,
            Err(e) => {
                // Close the sink so it releases its output; the run error wins.
                if let Err(end_err) = sink.end() {
                    tracing::warn!(error = %end_err, "closing sink after a failed run");
                }
                return Err(e);
            }
        };
        sink.end()?;

        tracing::info!(ticks, resizes, "rain run finished");
        Ok(RunStats { ticks, resizes })
    }

    /// The accumulated frame after the last tick.
    pub fn frame(&self) -> &FrameRGBA {
        self.renderer.surface().frame()
    }

    /// Seed of the random source; pass it back through the config to replay this run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Index of the next tick, i.e. the number of ticks run so far.
    pub fn tick_index(&self) -> TickIndex {
        self.next_tick
    }

    pub fn viewport(&self) -> Viewport {
        self.renderer.viewport()
    }

    /// Fall position of every column.
    pub fn positions(&self) -> &[u32] {
        self.renderer.positions()
    }

    /// The resolved glyph font, if any.
    pub fn font(&self) -> Option<&MonospaceFont> {
        self.font.as_ref()
    }

    fn step(&mut self) -> RainResult<Option<Viewport>> {
        let mut applied = None;
        while let Some(ev) = self.timeline.get(self.next_resize)
            && ev.at_tick <= self.next_tick
        {
            let viewport = ev.viewport();
            self.renderer.on_resize(viewport)?;
            self.next_resize += 1;
            tracing::debug!(
                tick = self.next_tick.0,
                width = viewport.width,
                height = viewport.height,
                "applied scheduled resize"
            );
            applied = Some(viewport);
        }

        self.renderer.tick();
        self.next_tick = self.next_tick.next();
        Ok(applied)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;
