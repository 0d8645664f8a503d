//! Color type shared by cells, input boxes and the renderer
//!
//! Colours arrive from the browser as flat `[r, g, b, r, g, b, ...]` arrays,
//! so there are helpers for slicing those.

use serde::{Deserialize, Serialize};

/// RGB color value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    /// Light half of the placeholder shown where no pixels have arrived yet
    pub const HATCH_LIGHT: Rgb = Rgb::new(0xa9, 0xa9, 0xa9);
    /// Dark half of the placeholder shown where no pixels have arrived yet
    pub const HATCH_DARK: Rgb = Rgb::new(0x79, 0x79, 0x79);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Read the `index`-th triplet out of a flat colour array.
    pub fn from_flat(colours: &[u8], index: usize) -> Option<Self> {
        let start = index.checked_mul(3)?;
        match colours.get(start..start + 3)? {
            [r, g, b] => Some(Self::new(*r, *g, *b)),
            _ => None,
        }
    }

    /// Build from a `[r, g, b]` slice, as sent for input box colours.
    pub fn from_triplet(triplet: &[u8]) -> Option<Self> {
        Self::from_flat(triplet, 0)
    }
}

/// Placeholder colours for a cell with no pixel data, as `(fg, bg)`.
///
/// Alternates with the column so that empty regions read as hatching.
pub fn hatch_colours(x: usize) -> (Rgb, Rgb) {
    if x % 2 == 0 {
        (Rgb::HATCH_DARK, Rgb::HATCH_LIGHT)
    } else {
        (Rgb::HATCH_LIGHT, Rgb::HATCH_DARK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flat() {
        let colours = [1, 2, 3, 4, 5, 6, 7];
        assert_eq!(Rgb::from_flat(&colours, 0), Some(Rgb::new(1, 2, 3)));
        assert_eq!(Rgb::from_flat(&colours, 1), Some(Rgb::new(4, 5, 6)));
        // Trailing partial triplet is not a colour
        assert_eq!(Rgb::from_flat(&colours, 2), None);
        assert_eq!(Rgb::from_triplet(&[9, 8, 7]), Some(Rgb::new(9, 8, 7)));
    }

    #[test]
    fn test_hatch_alternates_by_column() {
        let (fg0, bg0) = hatch_colours(0);
        let (fg1, bg1) = hatch_colours(1);
        assert_eq!(fg0, bg1);
        assert_eq!(bg0, fg1);
        assert_eq!(hatch_colours(4), hatch_colours(0));
    }
}
