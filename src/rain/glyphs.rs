use crate::foundation::error::{RainError, RainResult};
use crate::rain::random::RandomSource;

/// Glyphs used when a config does not name its own set.
pub const DEFAULT_GLYPHS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_+-=[]{}|;:\",./<>?~`";

/// Fixed, immutable set of printable glyphs sampled uniformly per column per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphSet {
    glyphs: Vec<char>,
}

impl GlyphSet {
    /// Build a set from the characters of `glyphs`, in order.
    ///
    /// Duplicates are kept and weight the distribution. Empty sets and control characters are
    /// rejected.
    pub fn new(glyphs: &str) -> RainResult<Self> {
        let glyphs: Vec<char> = glyphs.chars().collect();
        if glyphs.is_empty() {
            return Err(RainError::validation("glyph set must not be empty"));
        }
        if let Some(c) = glyphs.iter().find(|c| c.is_control()) {
            return Err(RainError::validation(format!(
                "glyph set contains non-printable character U+{:04X}",
                u32::from(*c)
            )));
        }
        Ok(Self { glyphs })
    }

    /// Draw one glyph uniformly at random.
    pub fn sample(&self, rng: &mut impl RandomSource) -> char {
        self.glyphs[rng.next_index(self.glyphs.len())]
    }

    /// Whether `c` is a member of the set.
    pub fn contains(&self, c: char) -> bool {
        self.glyphs.contains(&c)
    }

    /// Number of entries (duplicates included).
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false`; construction rejects empty sets.
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Entries in construction order.
    pub fn as_slice(&self) -> &[char] {
        &self.glyphs
    }
}

impl Default for GlyphSet {
    fn default() -> Self {
        Self {
            glyphs: DEFAULT_GLYPHS.chars().collect(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rain/glyphs.rs"]
mod tests;
