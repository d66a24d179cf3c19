use std::path::{Path, PathBuf};

use crate::encode::sink::{FrameSink, SinkConfig, ensure_parent_dir};
use crate::foundation::core::{Rgba8, TickIndex, Viewport};
use crate::foundation::error::{RainError, RainResult};
use crate::foundation::math::flatten_premul_over_bg_to_opaque_rgba8;
use crate::render::surface::FrameRGBA;

/// Write `frame` as an opaque PNG, flattening premultiplied alpha over `bg`.
pub fn write_png(path: &Path, frame: &FrameRGBA, bg: Rgba8) -> RainResult<()> {
    let mut scratch = vec![0u8; frame.data.len()];
    write_png_with_scratch(path, frame, bg, &mut scratch)
}

fn write_png_with_scratch(
    path: &Path,
    frame: &FrameRGBA,
    bg: Rgba8,
    scratch: &mut Vec<u8>,
) -> RainResult<()> {
    let expected = Viewport::new(frame.width, frame.height).byte_len();
    if frame.data.len() != expected {
        return Err(RainError::validation(
            "frame.data size mismatch with width*height*4",
        ));
    }
    scratch.resize(expected, 0);

    if frame.premultiplied {
        flatten_premul_over_bg_to_opaque_rgba8(scratch.as_mut_slice(), &frame.data, bg.to_array())?;
    } else {
        scratch.copy_from_slice(&frame.data);
    }

    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        scratch.as_slice(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| RainError::encode(format!("write png '{}': {e}", path.display())))
}

/// Options for [`PngSequenceSink`].
#[derive(Clone, Debug)]
pub struct PngSequenceOpts {
    /// Output directory; created on `begin`.
    pub dir: PathBuf,
    /// Background used to flatten alpha.
    pub bg: Rgba8,
}

impl PngSequenceOpts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            bg: Rgba8::black(),
        }
    }
}

/// Writes every frame to `<dir>/frame_<tick>.png` (tick zero-padded to six digits).
pub struct PngSequenceSink {
    opts: PngSequenceOpts,
    cfg: Option<SinkConfig>,
    last_idx: Option<TickIndex>,
    scratch: Vec<u8>,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    pub fn new(opts: PngSequenceOpts) -> Self {
        Self {
            opts,
            cfg: None,
            last_idx: None,
            scratch: Vec::new(),
            written: Vec::new(),
        }
    }

    /// File name used for tick `idx`.
    pub fn file_name(idx: TickIndex) -> String {
        format!("frame_{:06}.png", idx.0)
    }

    /// Paths written so far, in tick order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> RainResult<()> {
        std::fs::create_dir_all(&self.opts.dir).map_err(|e| {
            RainError::encode(format!(
                "create output dir '{}': {e}",
                self.opts.dir.display()
            ))
        })?;
        self.scratch = vec![0u8; cfg.viewport().byte_len()];
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.written.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: TickIndex, frame: &FrameRGBA) -> RainResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| RainError::encode("png sink not started"))?;
        if let Some(last) = self.last_idx
            && idx <= last
        {
            return Err(RainError::encode(
                "png sink received out-of-order tick index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(RainError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);

        let path = self.opts.dir.join(Self::file_name(idx));
        write_png_with_scratch(&path, frame, self.opts.bg, &mut self.scratch)?;
        self.written.push(path);
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) -> RainResult<()> {
        let cfg = self
            .cfg
            .as_mut()
            .ok_or_else(|| RainError::encode("png sink not started"))?;
        cfg.width = viewport.width;
        cfg.height = viewport.height;
        Ok(())
    }

    fn end(&mut self) -> RainResult<()> {
        tracing::debug!(
            frames = self.written.len(),
            dir = %self.opts.dir.display(),
            "png sequence finished"
        );
        self.cfg = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
