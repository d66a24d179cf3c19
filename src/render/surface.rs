use crate::foundation::core::{Point, Rect, Rgba8, Viewport};
use crate::foundation::error::{RainError, RainResult};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**; the `premultiplied` flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent frame of the given size.
    pub fn transparent(viewport: Viewport) -> Self {
        Self {
            width: viewport.width,
            height: viewport.height,
            data: vec![0; viewport.byte_len()],
            premultiplied: true,
        }
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Immediate-mode 2D drawing surface the rain renderer paints onto.
///
/// Draw calls never fail: the effect is best-effort, and a surface that cannot honour a call
/// (for example a glyph missing from its font) skips it.
pub trait Surface {
    /// Current pixel dimensions.
    fn viewport(&self) -> Viewport;

    /// Reallocate the backing buffer at a new size. Contents are not preserved.
    fn resize(&mut self, viewport: Viewport) -> RainResult<()>;

    /// Fill `rect` with `color`, alpha-blended over existing content.
    fn fill_rect(&mut self, rect: Rect, color: Rgba8);

    /// Draw a single glyph with its baseline origin at `origin`.
    fn draw_glyph(&mut self, glyph: char, origin: Point, color: Rgba8);

    /// Called once after the last draw of a tick.
    fn end_frame(&mut self) {}
}

/// One recorded draw call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCmd {
    /// A `fill_rect` call.
    FillRect {
        /// Filled area.
        rect: Rect,
        /// Fill colour.
        color: Rgba8,
    },
    /// A `draw_glyph` call.
    Glyph {
        /// Drawn character.
        glyph: char,
        /// Baseline origin.
        origin: Point,
        /// Glyph colour.
        color: Rgba8,
    },
}

/// Surface that records draw calls instead of rasterising them.
///
/// Holds the commands of the frame in progress plus the commands of the last completed frame.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    viewport: Viewport,
    pending: Vec<DrawCmd>,
    last_frame: Vec<DrawCmd>,
    frames_ended: u64,
    resizes: Vec<Viewport>,
}

impl RecordingSurface {
    /// Recording surface of the given initial size.
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            pending: Vec::new(),
            last_frame: Vec::new(),
            frames_ended: 0,
            resizes: Vec::new(),
        }
    }

    /// Commands issued since the last `end_frame`.
    pub fn pending(&self) -> &[DrawCmd] {
        &self.pending
    }

    /// Commands of the most recently completed frame.
    pub fn last_frame(&self) -> &[DrawCmd] {
        &self.last_frame
    }

    /// Number of completed frames.
    pub fn frames_ended(&self) -> u64 {
        self.frames_ended
    }

    /// Every size passed to `resize`, in call order.
    pub fn resizes(&self) -> &[Viewport] {
        &self.resizes
    }
}

impl Surface for RecordingSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn resize(&mut self, viewport: Viewport) -> RainResult<()> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(RainError::validation(
                "surface width/height must be non-zero",
            ));
        }
        self.viewport = viewport;
        self.pending.clear();
        self.resizes.push(viewport);
        Ok(())
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.pending.push(DrawCmd::FillRect { rect, color });
    }

    fn draw_glyph(&mut self, glyph: char, origin: Point, color: Rgba8) {
        self.pending.push(DrawCmd::Glyph {
            glyph,
            origin,
            color,
        });
    }

    fn end_frame(&mut self) {
        self.last_frame = std::mem::take(&mut self.pending);
        self.frames_ended += 1;
    }
}
