//! Drawing surfaces and glyph fonts.
//!
//! The rain renderer only talks to [`surface::Surface`]. [`cpu::CpuSurface`] rasterises with
//! `vello_cpu`; [`surface::RecordingSurface`] records draw calls for tests and dry runs.

/// `vello_cpu` raster surface.
pub mod cpu;
/// Monospace font resolution and glyph shaping.
pub mod font;
/// Surface contract, frames and the recording surface.
pub mod surface;
