use super::*;

#[test]
fn font_source_json_shapes() {
    let s: FontSource = serde_json::from_str(r#"{"kind":"system_monospace"}"#).unwrap();
    assert_eq!(s, FontSource::SystemMonospace);

    let s: FontSource =
        serde_json::from_str(r#"{"kind":"family","name":"DejaVu Sans Mono"}"#).unwrap();
    assert_eq!(
        s,
        FontSource::Family {
            name: "DejaVu Sans Mono".to_string()
        }
    );

    let s: FontSource = serde_json::from_str(r#"{"kind":"path","path":"fonts/a.ttf"}"#).unwrap();
    assert_eq!(
        s,
        FontSource::Path {
            path: PathBuf::from("fonts/a.ttf")
        }
    );

    assert!(serde_json::from_str::<FontSource>(r#"{"kind":"web"}"#).is_err());
}

#[test]
fn font_source_display_names_origin() {
    assert_eq!(FontSource::SystemMonospace.to_string(), "system monospace");
    assert_eq!(
        FontSource::Family {
            name: "Mono".to_string()
        }
        .to_string(),
        "system family 'Mono'"
    );
}

#[test]
fn missing_font_path_is_font_error() {
    let source = FontSource::Path {
        path: PathBuf::from("definitely/not/here.ttf"),
    };
    let err = MonospaceFont::resolve(&source).unwrap_err();
    assert!(matches!(err, RainError::Font(_)));
    assert!(err.to_string().contains("definitely/not/here.ttf"));
}

#[test]
fn garbage_bytes_are_rejected() {
    let err = MonospaceFont::from_bytes(b"not a font".to_vec()).unwrap_err();
    assert!(matches!(err, RainError::Font(_)));
}

#[test]
fn garbage_font_file_is_rejected() {
    let dir = std::env::temp_dir().join(format!("glyphrain_font_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.ttf");
    std::fs::write(&path, b"garbage, not a font").unwrap();

    let err = MonospaceFont::from_path(&path).unwrap_err();
    assert!(matches!(err, RainError::Font(_)));
    assert!(err.to_string().contains("broken.ttf"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn system_lookup_never_errors() {
    // Hosts without fonts resolve to `None` rather than failing.
    let font = MonospaceFont::resolve(&FontSource::SystemMonospace).unwrap();
    if let Some(font) = font {
        assert!(!font.family().is_empty());
        assert!(!font.bytes().is_empty());

        let mut shaper = GlyphShaper::new(&font).unwrap();
        let first = shaper.glyph_id('A', 16.0);
        assert_eq!(shaper.glyph_id('A', 16.0), first);
    }

    let missing = FontSource::Family {
        name: "No Such Family 7f3c".to_string(),
    };
    assert!(MonospaceFont::resolve(&missing).unwrap().is_none());
}
