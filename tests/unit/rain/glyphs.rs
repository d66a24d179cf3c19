use super::*;
use crate::rain::random::SeededRandom;
use std::collections::HashSet;

#[test]
fn default_set_matches_constant() {
    let set = GlyphSet::default();
    assert_eq!(set, GlyphSet::new(DEFAULT_GLYPHS).unwrap());
    assert_eq!(set.len(), DEFAULT_GLYPHS.chars().count());
    assert!(set.contains('a'));
    assert!(set.contains('`'));
    assert!(!set.contains(' '));
}

#[test]
fn rejects_empty_and_control_glyphs() {
    assert!(GlyphSet::new("").is_err());
    assert!(GlyphSet::new("ab\ncd").is_err());
    assert!(GlyphSet::new("ｱｲｳ01").is_ok());
}

#[test]
fn sampling_stays_in_set_and_covers_it() {
    let set = GlyphSet::default();
    let mut rng = SeededRandom::from_seed(0x5eed);
    let mut seen = HashSet::new();
    for _ in 0..20_000 {
        let g = set.sample(&mut rng);
        assert!(set.contains(g));
        seen.insert(g);
    }
    let distinct: HashSet<char> = set.as_slice().iter().copied().collect();
    assert_eq!(seen, distinct);
}

#[test]
fn single_glyph_set_always_returns_it() {
    let set = GlyphSet::new("#").unwrap();
    let mut rng = SeededRandom::from_seed(1);
    assert!((0..100).all(|_| set.sample(&mut rng) == '#'));
}
