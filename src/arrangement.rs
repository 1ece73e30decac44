//! Piece placements and their compact encoding.
//!
//! An [`Arrangement`] is a full piece placement independent of move
//! history — the unit of state for the solver and for undo/redo. Each live
//! piece packs into one `u16`: bits 0..=3 color index, bits 4..=9 x,
//! bits 10..=15 y, which bounds boards at 64x64 and colors at 15.
//! `decode` is the exact inverse of `encode` and fails with a
//! [`DecodeError`] on malformed input instead of an unchecked fault.

use thiserror::Error;

use crate::board::{Piece, Pos};
use crate::color::Color;

/// Packed content key of an arrangement: the sorted piece records. Two
/// arrangements with the same piece placement produce the same key
/// whatever order their pieces were enumerated in.
pub type ArrangementKey = Vec<u16>;

/// A malformed encoded arrangement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("encoded length {len} is not a whole number of records")]
    TruncatedRecord { len: usize },
    #[error("unknown color index {index}")]
    UnknownColor { index: u8 },
    #[error("piece at ({x}, {y}) lies outside a {width}x{height} board")]
    OutOfBounds { x: i32, y: i32, width: i32, height: i32 },
    #[error("two records target the cell ({x}, {y})")]
    DuplicateCell { x: i32, y: i32 },
}

/// A full piece placement on a fixed-size grid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Arrangement {
    width: i32,
    height: i32,
    cells: Vec<Option<Color>>,
}

impl Arrangement {
    pub fn empty(width: i32, height: i32) -> Arrangement {
        Arrangement {
            width,
            height,
            cells: vec![None; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, (x, y): Pos) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn index(&self, (x, y): Pos) -> usize {
        (y * self.width + x) as usize
    }

    /// Color of the piece at `pos`, or `None` for an empty cell. The
    /// position must be in bounds.
    pub fn color_at(&self, pos: Pos) -> Option<Color> {
        self.cells[self.index(pos)]
    }

    pub fn set(&mut self, pos: Pos, color: Option<Color>) {
        let idx = self.index(pos);
        self.cells[idx] = color;
    }

    /// Iterates the live pieces, x-major.
    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        let (w, h) = (self.width, self.height);
        (0..w)
            .flat_map(move |x| (0..h).map(move |y| (x, y)))
            .filter_map(move |pos| self.color_at(pos).map(|color| Piece::new(pos, color)))
    }

    pub fn piece_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// A copy with the piece at `pos` removed; the solver's
    /// piece-in-hand view.
    pub fn without(&self, pos: Pos) -> Arrangement {
        let mut copy = self.clone();
        copy.set(pos, None);
        copy
    }

    // ---- packed encoding ----

    fn pack(piece: Piece) -> u16 {
        let (x, y) = piece.pos;
        (piece.color.to_index() as u16 & 0xf) | ((x as u16 & 0x3f) << 4) | ((y as u16 & 0x3f) << 10)
    }

    fn unpack(word: u16) -> Result<Piece, DecodeError> {
        let index = (word & 0xf) as u8;
        let color = Color::from_index(index).ok_or(DecodeError::UnknownColor { index })?;
        let x = ((word >> 4) & 0x3f) as i32;
        let y = ((word >> 10) & 0x3f) as i32;
        Ok(Piece::new((x, y), color))
    }

    /// Serializes to one little-endian `u16` record per live piece.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.piece_count() * 2);
        for piece in self.pieces() {
            bytes.extend_from_slice(&Self::pack(piece).to_le_bytes());
        }
        bytes
    }

    /// Exact inverse of [`Arrangement::encode`] for a `width`x`height`
    /// board.
    pub fn decode(bytes: &[u8], width: i32, height: i32) -> Result<Arrangement, DecodeError> {
        if bytes.len() % 2 != 0 {
            return Err(DecodeError::TruncatedRecord { len: bytes.len() });
        }
        let words = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
        Self::from_words(words, width, height)
    }

    /// Sorted packed records; the canonical structural key used by the
    /// solver's visited table.
    pub fn key(&self) -> ArrangementKey {
        let mut words: Vec<u16> = self.pieces().map(Self::pack).collect();
        words.sort_unstable();
        words
    }

    /// Rebuilds an arrangement from a content key.
    pub fn from_key(key: &[u16], width: i32, height: i32) -> Result<Arrangement, DecodeError> {
        Self::from_words(key.iter().copied(), width, height)
    }

    fn from_words(
        words: impl Iterator<Item = u16>,
        width: i32,
        height: i32,
    ) -> Result<Arrangement, DecodeError> {
        let mut arr = Arrangement::empty(width, height);
        for word in words {
            let piece = Self::unpack(word)?;
            let (x, y) = piece.pos;
            if !arr.in_bounds(piece.pos) {
                return Err(DecodeError::OutOfBounds {
                    x,
                    y,
                    width,
                    height,
                });
            }
            if arr.color_at(piece.pos).is_some() {
                return Err(DecodeError::DuplicateCell { x, y });
            }
            arr.set(piece.pos, Some(piece.color));
        }
        Ok(arr)
    }

    // ---- mirroring (solver symmetry reduction) ----

    pub fn mirrored_horizontal(&self) -> Arrangement {
        let mut out = Arrangement::empty(self.width, self.height);
        for piece in self.pieces() {
            let (x, y) = piece.pos;
            out.set((self.width - x - 1, y), Some(piece.color));
        }
        out
    }

    pub fn mirrored_vertical(&self) -> Arrangement {
        let mut out = Arrangement::empty(self.width, self.height);
        for piece in self.pieces() {
            let (x, y) = piece.pos;
            out.set((x, self.height - y - 1), Some(piece.color));
        }
        out
    }
}
