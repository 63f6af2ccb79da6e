//! Light/dark symbols and binarization

use std::fmt;

use crate::threshold::Threshold;

/// Glyph shown for a bright row
pub const LIGHT_GLYPH: char = '|';
/// Glyph shown for a dark row
pub const DARK_GLYPH: char = '.';

/// One binarized sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Light,
    Dark,
}

impl Symbol {
    /// Classify a sample. Ties go to `Dark`.
    pub fn classify(sample: u8, threshold: Threshold) -> Self {
        if sample as f64 > threshold.value() {
            Symbol::Light
        } else {
            Symbol::Dark
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            Symbol::Light => LIGHT_GLYPH,
            Symbol::Dark => DARK_GLYPH,
        }
    }
}

/// Ordered symbols, top row first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolString(Vec<Symbol>);

impl SymbolString {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self(symbols)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Display form: `|` for light, `.` for dark
    pub fn render(&self) -> String {
        self.0.iter().map(Symbol::glyph).collect()
    }
}

impl fmt::Display for SymbolString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromIterator<Symbol> for SymbolString {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Map every sample to a symbol, preserving order
pub fn binarize(samples: &[u8], threshold: Threshold) -> SymbolString {
    samples
        .iter()
        .map(|&sample| Symbol::classify(sample, threshold))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::estimate;

    #[test]
    fn test_tie_is_dark() {
        let t = estimate(&[128, 128]).unwrap();
        assert_eq!(Symbol::classify(128, t), Symbol::Dark);
        assert_eq!(Symbol::classify(129, t), Symbol::Light);
        assert_eq!(Symbol::classify(127, t), Symbol::Dark);
    }

    #[test]
    fn test_binarize_order() {
        let samples = [0, 200, 10, 250];
        let t = estimate(&samples).unwrap();
        let symbols = binarize(&samples, t);
        assert_eq!(
            symbols.symbols(),
            &[Symbol::Dark, Symbol::Light, Symbol::Dark, Symbol::Light]
        );
        assert_eq!(symbols.render(), ".|.|");
    }

    #[test]
    fn test_display_matches_render() {
        let symbols: SymbolString = [Symbol::Light, Symbol::Light, Symbol::Dark].into_iter().collect();
        assert_eq!(symbols.to_string(), "||.");
    }
}
