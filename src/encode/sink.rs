use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Fps, TickIndex, Viewport};
use crate::foundation::error::{RainError, RainResult};
use crate::render::surface::FrameRGBA;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

impl SinkConfig {
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

/// Sink contract for consuming rendered frames in tick order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `TickIndex` order. A
/// `resize` may arrive between two frames; every later frame has the new size.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> RainResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: TickIndex, frame: &FrameRGBA) -> RainResult<()>;
    /// The frame size changes from the next frame on.
    fn resize(&mut self, viewport: Viewport) -> RainResult<()> {
        Err(RainError::validation(format!(
            "sink cannot change frame size mid-stream (to {}x{})",
            viewport.width, viewport.height
        )))
    }
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> RainResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(TickIndex, FrameRGBA)>,
    resizes: Vec<(usize, Viewport)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink configuration captured in `begin`, updated by resizes.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in tick order.
    pub fn frames(&self) -> &[(TickIndex, FrameRGBA)] {
        &self.frames
    }

    /// Resizes as `(frames received before the resize, new size)`.
    pub fn resizes(&self) -> &[(usize, Viewport)] {
        &self.resizes
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> RainResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.resizes.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: TickIndex, frame: &FrameRGBA) -> RainResult<()> {
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(RainError::encode(
                "in-memory sink received out-of-order tick index",
            ));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) -> RainResult<()> {
        let cfg = self
            .cfg
            .as_mut()
            .ok_or_else(|| RainError::encode("in-memory sink not started"))?;
        cfg.width = viewport.width;
        cfg.height = viewport.height;
        self.resizes.push((self.frames.len(), viewport));
        Ok(())
    }

    fn end(&mut self) -> RainResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> RainResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
