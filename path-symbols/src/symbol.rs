//! Symbol geometry: the on-path symbol sizes placement is computed over.
//!
//! The original models billboard vs. on-path symbols as a runtime-typed
//! class hierarchy; per spec §9 ("Dynamic dispatch over rasterized-symbol
//! variants") we re-express the on-path case directly as this plain
//! description struct, since placement only ever needs the three pixel
//! measurements, never the rendering-time subtype.

/// One symbol's pixel geometry within a block: left padding, glyph/bitmap
/// width, right padding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SymbolDesc {
    pub left_padding_px: f32,
    pub width_px: f32,
    pub right_padding_px: f32,
}

impl SymbolDesc {
    pub fn new(left_padding_px: f32, width_px: f32, right_padding_px: f32) -> Self {
        Self {
            left_padding_px,
            width_px,
            right_padding_px,
        }
    }

    /// Total footprint: left padding + width + right padding.
    pub fn full_size_px(&self) -> f32 {
        self.left_padding_px + self.width_px + self.right_padding_px
    }
}
