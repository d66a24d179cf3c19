//! glyphrain renders the "digital rain" glyph animation.
//!
//! Columns of randomly chosen glyphs fall down a surface that is dimmed by a translucent
//! rectangle every tick, leaving fading trails. The API is session-oriented:
//!
//! - Load and validate a [`RainConfig`]
//! - Create a [`RainSession`]
//! - Step it with [`RainSession::advance`], or drive it with a [`Scheduler`] into a [`FrameSink`]
//!
//! [`RainRenderer`] is the effect itself and works with any [`Surface`] and [`RandomSource`].
#![forbid(unsafe_code)]

mod foundation;

/// JSON configuration.
pub mod config;
/// Frame sinks.
pub mod encode;
/// The rain effect.
pub mod rain;
/// Drawing surfaces and fonts.
pub mod render;
pub mod schedule;
/// Session-oriented API.
pub mod session;

pub use crate::foundation::core::{Fps, Point, Rect, Rgba8, TickIndex, Viewport};
pub use crate::foundation::error::{RainError, RainResult};

pub use crate::config::model::{RainConfig, ResizeEvent};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::png::{PngSequenceOpts, PngSequenceSink, write_png};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::rain::glyphs::{DEFAULT_GLYPHS, GlyphSet};
pub use crate::rain::random::{RandomSource, SeededRandom};
pub use crate::rain::renderer::{RainParams, RainRenderer};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::font::{FontSource, MonospaceFont};
pub use crate::render::surface::{DrawCmd, FrameRGBA, RecordingSurface, Surface};
pub use crate::schedule::{IntervalScheduler, Scheduler, SteppedScheduler, StopHandle};
pub use crate::session::render_session::{RainSession, RunStats};
