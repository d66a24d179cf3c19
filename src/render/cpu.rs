use crate::foundation::core::{Point, Rect, Rgba8, Viewport};
use crate::foundation::error::{RainError, RainResult};
use crate::foundation::math::premul_over_in_place;
use crate::render::font::{GlyphShaper, MonospaceFont};
use crate::render::surface::{FrameRGBA, Surface};

/// CPU raster surface backed by `vello_cpu`.
///
/// Draw calls of a tick are recorded into a `vello_cpu::RenderContext`. `end_frame` rasterises
/// them into a scratch pixmap and composites that source-over onto a persistent frame buffer, so
/// earlier frames are only ever dimmed, never cleared.
pub struct CpuSurface {
    viewport: Viewport,
    ctx: vello_cpu::RenderContext,
    scratch: vello_cpu::Pixmap,
    frame: FrameRGBA,
    font_size_px: f32,
    text: Option<GlyphText>,
}

struct GlyphText {
    font: vello_cpu::peniko::FontData,
    shaper: GlyphShaper,
    family: String,
}

impl CpuSurface {
    /// Surface of `viewport` size, drawing glyphs from `font` at `font_size_px`.
    ///
    /// Without a font, `draw_glyph` is a no-op and only the trail rectangles are painted.
    pub fn new(
        viewport: Viewport,
        font: Option<&MonospaceFont>,
        font_size_px: f32,
    ) -> RainResult<Self> {
        if !font_size_px.is_finite() || font_size_px <= 0.0 {
            return Err(RainError::validation(
                "font size must be finite and > 0",
            ));
        }
        let (w, h) = pixmap_dims(viewport)?;

        let text = match font {
            Some(font) => Some(GlyphText {
                font: vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(font.bytes().to_vec()),
                    font.index(),
                ),
                shaper: GlyphShaper::new(font)?,
                family: font.family().to_string(),
            }),
            None => None,
        };

        Ok(Self {
            viewport,
            ctx: vello_cpu::RenderContext::new(w, h),
            scratch: vello_cpu::Pixmap::new(w, h),
            frame: FrameRGBA::transparent(viewport),
            font_size_px,
            text,
        })
    }

    /// The accumulated frame as of the last `end_frame`.
    pub fn frame(&self) -> &FrameRGBA {
        &self.frame
    }

    /// Family name of the glyph font, if one is loaded.
    pub fn font_family(&self) -> Option<&str> {
        self.text.as_ref().map(|t| t.family.as_str())
    }
}

impl Surface for CpuSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) -> RainResult<()> {
        let (w, h) = pixmap_dims(viewport)?;
        if viewport != self.viewport {
            self.ctx = vello_cpu::RenderContext::new(w, h);
            self.scratch = vello_cpu::Pixmap::new(w, h);
        } else {
            self.ctx.reset();
        }
        // Assigning a new size clears the surface.
        self.frame = FrameRGBA::transparent(viewport);
        self.viewport = viewport;
        tracing::debug!(width = w, height = h, "cpu surface resized");
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.ctx.set_paint(paint(color));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            rect.x0, rect.y0, rect.x1, rect.y1,
        ));
    }

    fn draw_glyph(&mut self, glyph: char, origin: Point, color: Rgba8) {
        let Some(text) = self.text.as_mut() else {
            return;
        };
        let Some(id) = text.shaper.glyph_id(glyph, self.font_size_px) else {
            return;
        };
        self.ctx.set_paint(paint(color));
        self.ctx
            .glyph_run(&text.font)
            .font_size(self.font_size_px)
            .fill_glyphs(std::iter::once(vello_cpu::Glyph {
                id,
                x: origin.x as f32,
                y: origin.y as f32,
            }));
    }

    fn end_frame(&mut self) {
        self.scratch.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.scratch);
        self.ctx.reset();

        if let Err(e) = premul_over_in_place(&mut self.frame.data, self.scratch.data_as_u8_slice())
        {
            tracing::error!(error = %e, "dropping frame: scratch and frame buffers disagree");
        }
    }
}

fn paint(color: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn pixmap_dims(viewport: Viewport) -> RainResult<(u16, u16)> {
    if viewport.width == 0 || viewport.height == 0 {
        return Err(RainError::validation(
            "surface width/height must be non-zero",
        ));
    }
    let w: u16 = viewport
        .width
        .try_into()
        .map_err(|_| RainError::render("surface width exceeds u16"))?;
    let h: u16 = viewport
        .height
        .try_into()
        .map_err(|_| RainError::render("surface height exceeds u16"))?;
    Ok((w, h))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
