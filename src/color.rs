//! Playable piece colors.
//!
//! Absence of a color is always `Option<Color>::None`; there is no in-band
//! sentinel. The "any color" wildcard queries live on `Board` as separately
//! named operations.

/// The closed set of playable colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Red,
    Blue,
    Green,
    Orange,
    Purple,
}

/// All playable colors, in index order.
pub const ALL_COLORS: [Color; 5] = [
    Color::Red,
    Color::Blue,
    Color::Green,
    Color::Orange,
    Color::Purple,
];

impl Color {
    /// Packed-encoding index. Index 0 is reserved for "no piece" and is
    /// never produced here.
    pub const fn to_index(self) -> u8 {
        match self {
            Color::Red => 1,
            Color::Blue => 2,
            Color::Green => 3,
            Color::Orange => 4,
            Color::Purple => 5,
        }
    }

    /// Inverse of [`Color::to_index`].
    pub const fn from_index(index: u8) -> Option<Color> {
        match index {
            1 => Some(Color::Red),
            2 => Some(Color::Blue),
            3 => Some(Color::Green),
            4 => Some(Color::Orange),
            5 => Some(Color::Purple),
            _ => None,
        }
    }

    /// Single-letter glyph used by the text renderer.
    pub const fn glyph(self) -> char {
        match self {
            Color::Red => 'R',
            Color::Blue => 'B',
            Color::Green => 'G',
            Color::Orange => 'O',
            Color::Purple => 'P',
        }
    }
}
