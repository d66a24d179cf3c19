use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{RainError, RainResult};

/// Where the monospace glyph font comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontSource {
    /// The system's generic monospace family, falling back to any face flagged monospaced.
    #[default]
    SystemMonospace,
    /// A named system family.
    Family {
        /// Family name, e.g. `"DejaVu Sans Mono"`.
        name: String,
    },
    /// A font file on disk (`.ttf`, `.otf`, `.ttc`; the first face is used).
    Path {
        /// Font file path.
        path: PathBuf,
    },
}

impl std::fmt::Display for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SystemMonospace => write!(f, "system monospace"),
            Self::Family { name } => write!(f, "system family '{name}'"),
            Self::Path { path } => write!(f, "file '{}'", path.display()),
        }
    }
}

/// Raw bytes of a resolved font face plus its family name.
#[derive(Clone, Debug)]
pub struct MonospaceFont {
    family: String,
    bytes: Vec<u8>,
    index: u32,
}

impl MonospaceFont {
    /// Resolve `source`.
    ///
    /// System lookups that find nothing return `Ok(None)` with a warning, so the rain still runs
    /// (trail only). A font path that cannot be read or parsed is an error.
    pub fn resolve(source: &FontSource) -> RainResult<Option<Self>> {
        match source {
            FontSource::Path { path } => Self::from_path(path).map(Some),
            FontSource::SystemMonospace => {
                let db = system_fontdb();
                let id = db
                    .query(&usvg::fontdb::Query {
                        families: &[usvg::fontdb::Family::Monospace],
                        ..Default::default()
                    })
                    .or_else(|| db.faces().find(|face| face.monospaced).map(|face| face.id));
                let Some(id) = id else {
                    tracing::warn!("no monospace system font found; glyphs will not be drawn");
                    return Ok(None);
                };
                Self::from_db(&db, id).map(Some)
            }
            FontSource::Family { name } => {
                let db = system_fontdb();
                let Some(id) = db.query(&usvg::fontdb::Query {
                    families: &[usvg::fontdb::Family::Name(name.as_str())],
                    ..Default::default()
                }) else {
                    tracing::warn!(family = %name, "system font family not found; glyphs will not be drawn");
                    return Ok(None);
                };
                Self::from_db(&db, id).map(Some)
            }
        }
    }

    /// Load the first face of the font file at `path`.
    pub fn from_path(path: &Path) -> RainResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| RainError::font(format!("read font '{}': {e}", path.display())))?;
        Self::parse(bytes)
            .ok_or_else(|| RainError::font(format!("no font faces found in '{}'", path.display())))
    }

    /// Parse raw font bytes, using the first face found.
    pub fn from_bytes(bytes: Vec<u8>) -> RainResult<Self> {
        Self::parse(bytes).ok_or_else(|| RainError::font("no font faces found in font bytes"))
    }

    fn parse(bytes: Vec<u8>) -> Option<Self> {
        let mut db = usvg::fontdb::Database::new();
        db.load_font_data(bytes.clone());
        let face = db.faces().next()?;
        let (family, _) = face.families.first()?;
        Some(Self {
            family: family.clone(),
            bytes,
            index: face.index,
        })
    }

    fn from_db(db: &usvg::fontdb::Database, id: usvg::fontdb::ID) -> RainResult<Self> {
        let family = db
            .face(id)
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone())
            .ok_or_else(|| RainError::font("system font face has no family name"))?;
        let (bytes, index) = db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| RainError::font(format!("read system font data for '{family}'")))?;
        tracing::debug!(family = %family, bytes = bytes.len(), "resolved system font");
        Ok(Self {
            family,
            bytes,
            index,
        })
    }

    /// Family name as reported by the font.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Raw font file bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Face index inside a collection file.
    pub fn index(&self) -> u32 {
        self.index
    }
}

fn system_fontdb() -> usvg::fontdb::Database {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    db
}

/// Maps characters to glyph ids of one font, shaping each character once with Parley.
pub(crate) struct GlyphShaper {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family: String,
    cache: HashMap<char, Option<u32>>,
}

impl GlyphShaper {
    pub(crate) fn new(font: &MonospaceFont) -> RainResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes().to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| RainError::font("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| RainError::font("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family,
            cache: HashMap::new(),
        })
    }

    /// Glyph id of `ch`, or `None` when the font has no glyph for it.
    pub(crate) fn glyph_id(&mut self, ch: char, size_px: f32) -> Option<u32> {
        if let Some(id) = self.cache.get(&ch) {
            return *id;
        }
        let id = self.shape(ch, size_px);
        if id.is_none() {
            tracing::debug!(glyph = %ch, family = %self.family, "font has no glyph; skipping");
        }
        self.cache.insert(ch, id);
        id
    }

    fn shape(&mut self, ch: char, size_px: f32) -> Option<u32> {
        let mut buf = [0u8; 4];
        let text: &str = ch.encode_utf8(&mut buf);

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        let mut layout: parley::Layout<()> = builder.build(text);
        layout.break_all_lines(None);

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                // Glyph 0 is `.notdef`.
                if let Some(glyph) = run.glyphs().find(|g| g.id != 0) {
                    return Some(glyph.id);
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/font.rs"]
mod tests;
