use crate::foundation::core::{Point, Rgba8, Viewport};
use crate::foundation::error::{RainError, RainResult};
use crate::rain::columns::{ColumnState, column_count};
use crate::rain::glyphs::GlyphSet;
use crate::rain::random::RandomSource;
use crate::render::surface::Surface;

/// Tunables of the rain effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainParams {
    /// Glyph cell size in pixels: column width and row height.
    pub font_size_px: u32,
    /// Alpha of the trail rectangle painted each tick, in `[0, 1]`.
    pub fade_alpha: f32,
    /// Reset probability knob: a column past the bottom restarts when a draw exceeds this.
    pub reset_threshold: f64,
    /// Glyph colour.
    pub glyph_color: Rgba8,
    /// Trail rectangle colour; its alpha is replaced by `fade_alpha`.
    pub trail_color: Rgba8,
}

impl Default for RainParams {
    fn default() -> Self {
        Self {
            font_size_px: 16,
            fade_alpha: 0.05,
            reset_threshold: 0.975,
            glyph_color: Rgba8::rgb(0, 255, 0),
            trail_color: Rgba8::black(),
        }
    }
}

impl RainParams {
    pub fn validate(&self) -> RainResult<()> {
        if self.font_size_px == 0 {
            return Err(RainError::validation("font_size_px must be > 0"));
        }
        if !self.fade_alpha.is_finite() || !(0.0..=1.0).contains(&self.fade_alpha) {
            return Err(RainError::validation(
                "fade_alpha must be finite and in [0, 1]",
            ));
        }
        if !self.reset_threshold.is_finite() || !(0.0..=1.0).contains(&self.reset_threshold) {
            return Err(RainError::validation(
                "reset_threshold must be finite and in [0, 1]",
            ));
        }
        Ok(())
    }
}

/// The digital-rain renderer.
///
/// Owns its surface, random source and column state. `tick` paints one frame and advances every
/// column by a row; `on_resize` reallocates the surface and restarts every column at the top.
/// Both take `&mut self`, so they can never interleave.
pub struct RainRenderer<S, R> {
    params: RainParams,
    glyphs: GlyphSet,
    columns: ColumnState,
    viewport: Viewport,
    surface: S,
    rng: R,
}

impl<S: Surface, R: RandomSource> RainRenderer<S, R> {
    /// Size `surface` to `viewport` and start `floor(width / font_size)` columns at row 0.
    pub fn initialize(
        viewport: Viewport,
        params: RainParams,
        glyphs: GlyphSet,
        mut surface: S,
        rng: R,
    ) -> RainResult<Self> {
        params.validate()?;
        surface.resize(viewport)?;
        let columns = ColumnState::new(column_count(viewport.width, params.font_size_px));
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            columns = columns.len(),
            "rain renderer initialized"
        );
        Ok(Self {
            params,
            glyphs,
            columns,
            viewport,
            surface,
            rng,
        })
    }

    /// Paint one frame: dim everything, draw a glyph per column, advance each column.
    pub fn tick(&mut self) {
        let fs = self.params.font_size_px;
        let height = u64::from(self.viewport.height);
        let glyph_color = self.params.glyph_color;

        self.surface.fill_rect(
            self.viewport.rect(),
            self.params.trail_color.with_alpha(self.params.fade_alpha),
        );

        let mut resets = 0usize;
        for (i, y) in self.columns.positions_mut().iter_mut().enumerate() {
            let glyph = self.glyphs.sample(&mut self.rng);
            let origin = Point::new(i as f64 * f64::from(fs), f64::from(*y) * f64::from(fs));
            self.surface.draw_glyph(glyph, origin, glyph_color);

            // The draw is only taken once the drop has left the surface.
            let past_bottom = u64::from(*y) * u64::from(fs) > height;
            if past_bottom && self.rng.next_unit() > self.params.reset_threshold {
                *y = 0;
                resets += 1;
            } else {
                *y = y.saturating_add(1);
            }
        }

        self.surface.end_frame();
        tracing::trace!(columns = self.columns.len(), resets, "rain tick");
    }

    /// Resize the surface and restart every column at row 0.
    pub fn on_resize(&mut self, viewport: Viewport) -> RainResult<()> {
        self.surface.resize(viewport)?;
        self.viewport = viewport;
        self.columns
            .reset(column_count(viewport.width, self.params.font_size_px));
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            columns = self.columns.len(),
            "rain renderer resized"
        );
        Ok(())
    }
}

impl<S, R> RainRenderer<S, R> {
    /// Current column count, `floor(width / font_size)`.
    pub fn columns(&self) -> usize {
        self.columns.len()
    }

    /// Fall position of every column, in rows.
    pub fn positions(&self) -> &[u32] {
        self.columns.positions()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn params(&self) -> &RainParams {
        &self.params
    }

    pub fn glyphs(&self) -> &GlyphSet {
        &self.glyphs
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rain/renderer.rs"]
mod tests;
