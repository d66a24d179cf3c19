//! The digital-rain effect: column state, glyph sampling, and the per-tick update.

pub mod columns;
pub mod glyphs;
/// Injectable random sources.
pub mod random;
pub mod renderer;
