//! JSON configuration for rain sessions.

pub(crate) mod color;
/// Config model and validation.
pub mod model;
