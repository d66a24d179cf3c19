use crate::foundation::core::{Fps, Rgba8, TickIndex, Viewport};
use crate::foundation::error::{RainError, RainResult};
use crate::rain::glyphs::{DEFAULT_GLYPHS, GlyphSet};
use crate::rain::renderer::RainParams;
use crate::render::font::FontSource;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A viewport change delivered to the renderer before tick `at_tick` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResizeEvent {
    /// Tick before which the resize is applied.
    pub at_tick: TickIndex,
    /// New surface width in pixels.
    pub width: u32,
    /// New surface height in pixels.
    pub height: u32,
}

impl ResizeEvent {
    /// The viewport this event switches to.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

/// JSON-facing configuration for a rain session.
///
/// Every field has a default, so `{}` is a valid config that reproduces the classic effect:
/// 16 px glyphs, green on a black trail fading at 5% per 50 ms tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RainConfig {
    /// Initial surface size.
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,
    /// Glyph cell size in pixels; also the column width and row height.
    #[serde(default = "default_font_size_px")]
    pub font_size_px: u32,
    /// Where the monospace font comes from.
    #[serde(default)]
    pub font: FontSource,
    /// Characters sampled for every column on every tick.
    #[serde(default = "default_glyphs")]
    pub glyphs: String,
    /// Alpha of the trail rectangle painted over the surface each tick.
    #[serde(default = "default_fade_alpha")]
    pub fade_alpha: f32,
    /// A column past the bottom edge restarts when a uniform draw exceeds this value.
    #[serde(default = "default_reset_threshold")]
    pub reset_threshold: f64,
    /// Timer period between ticks.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    /// Glyph colour.
    #[serde(default = "default_glyph_color")]
    pub glyph_color: Rgba8,
    /// Colour of the fading trail rectangle (its alpha is replaced by `fade_alpha`).
    #[serde(default = "Rgba8::black")]
    pub trail_color: Rgba8,
    /// Background used when flattening frames for PNG/MP4 output.
    #[serde(default = "Rgba8::black")]
    pub background: Rgba8,
    /// Number of ticks rendered by `frames` and `render`.
    #[serde(default = "default_duration_ticks")]
    pub duration_ticks: u64,
    /// RNG seed. `None` draws a seed from OS entropy (and logs it).
    #[serde(default)]
    pub seed: Option<u64>,
    /// Viewport changes applied during the run.
    #[serde(default)]
    pub resizes: Vec<ResizeEvent>,
}

fn default_viewport() -> Viewport {
    Viewport::new(1280, 720)
}

fn default_font_size_px() -> u32 {
    16
}

fn default_glyphs() -> String {
    DEFAULT_GLYPHS.to_owned()
}

fn default_fade_alpha() -> f32 {
    0.05
}

fn default_reset_threshold() -> f64 {
    0.975
}

fn default_tick_period_ms() -> u64 {
    50
}

fn default_glyph_color() -> Rgba8 {
    Rgba8::rgb(0, 255, 0)
}

fn default_duration_ticks() -> u64 {
    200
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            viewport: default_viewport(),
            font_size_px: default_font_size_px(),
            font: FontSource::default(),
            glyphs: default_glyphs(),
            fade_alpha: default_fade_alpha(),
            reset_threshold: default_reset_threshold(),
            tick_period_ms: default_tick_period_ms(),
            glyph_color: default_glyph_color(),
            trail_color: Rgba8::black(),
            background: Rgba8::black(),
            duration_ticks: default_duration_ticks(),
            seed: None,
            resizes: Vec::new(),
        }
    }
}

impl RainConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> RainResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| RainError::serde(format!("parse rain config JSON: {e}")))
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> RainResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RainError::validation(format!("open rain config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check value ranges and cross-field constraints.
    pub fn validate(&self) -> RainResult<()> {
        validate_viewport(self.viewport, "viewport")?;
        self.params().validate()?;
        GlyphSet::new(&self.glyphs)?;
        self.fps()?;
        if self.tick_period_ms == 0 {
            return Err(RainError::validation("tick_period_ms must be > 0"));
        }

        let mut last: Option<TickIndex> = None;
        for (i, ev) in self.resizes.iter().enumerate() {
            validate_viewport(ev.viewport(), &format!("resizes[{i}]"))?;
            if let Some(prev) = last
                && ev.at_tick <= prev
            {
                return Err(RainError::validation(format!(
                    "resizes[{i}].at_tick must be strictly increasing"
                )));
            }
            last = Some(ev.at_tick);
        }
        Ok(())
    }

    /// Renderer parameters carried by this config.
    pub fn params(&self) -> RainParams {
        RainParams {
            font_size_px: self.font_size_px,
            fade_alpha: self.fade_alpha,
            reset_threshold: self.reset_threshold,
            glyph_color: self.glyph_color,
            trail_color: self.trail_color,
        }
    }

    /// Output frame rate implied by the tick period.
    pub fn fps(&self) -> RainResult<Fps> {
        Fps::from_period_ms(self.tick_period_ms)
    }

    /// Tick period as a [`std::time::Duration`].
    pub fn tick_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_period_ms)
    }
}

fn validate_viewport(v: Viewport, what: &str) -> RainResult<()> {
    if v.width == 0 || v.height == 0 {
        return Err(RainError::validation(format!(
            "{what} width/height must be non-zero"
        )));
    }
    if v.width > u32::from(u16::MAX) || v.height > u32::from(u16::MAX) {
        return Err(RainError::validation(format!(
            "{what} width/height must be <= {}",
            u16::MAX
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
