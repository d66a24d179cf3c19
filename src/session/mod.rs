//! Session-oriented API: one owned rain animation driven by a scheduler into a sink.

/// Rain session and run statistics.
pub mod render_session;
