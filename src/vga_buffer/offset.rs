// src/vga_buffer/offset.rs

//! Offset arithmetic for the text-mode framebuffer.
//!
//! Software addresses the screen in *bytes*: cell `(col, row)` starts at
//! `2 * (row * MAX_COLS + col)`. The CRT controller counts *cells*; the
//! factor of two is applied only at that boundary (see
//! [`super::cursor::CursorController`]).

use crate::constants::{BYTES_PER_CELL, BYTES_PER_ROW, MAX_COLS, MAX_ROWS, SCREEN_BYTES};

/// Byte offset of cell `(col, row)`.
///
/// No range check is applied: out-of-range coordinates produce offsets at or
/// beyond the end of the screen (saturating instead of wrapping).
#[inline]
pub const fn get_offset(col: usize, row: usize) -> usize {
    row.saturating_mul(MAX_COLS)
        .saturating_add(col)
        .saturating_mul(BYTES_PER_CELL)
}

/// Row containing byte `offset`.
#[inline]
pub const fn get_offset_row(offset: usize) -> usize {
    offset / BYTES_PER_ROW
}

/// Column containing byte `offset`.
#[inline]
pub const fn get_offset_col(offset: usize) -> usize {
    (offset - get_offset_row(offset) * BYTES_PER_ROW) / BYTES_PER_CELL
}

/// A `(col, row)` pair as requested by a caller.
///
/// The fields are not validated on construction; use
/// [`CursorPosition::is_valid`] or [`CursorPosition::offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorPosition {
    pub col: usize,
    pub row: usize,
}

impl CursorPosition {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// Both coordinates lie on the screen
    pub const fn is_valid(&self) -> bool {
        self.col < MAX_COLS && self.row < MAX_ROWS
    }

    /// Validated offset of this position
    pub const fn offset(&self) -> Option<ScreenOffset> {
        if self.is_valid() {
            Some(ScreenOffset(get_offset(self.col, self.row)))
        } else {
            None
        }
    }

    /// Offset computed without validation
    pub const fn raw_offset(&self) -> usize {
        get_offset(self.col, self.row)
    }
}

/// An even byte offset inside the framebuffer.
///
/// Holding a `ScreenOffset` guarantees `offset % 2 == 0` and
/// `offset < SCREEN_BYTES`, so framebuffer backends can index with it
/// without further checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ScreenOffset(usize);

impl ScreenOffset {
    /// Top-left cell
    pub const ORIGIN: Self = Self(0);

    /// Bottom-right cell
    pub const LAST_CELL: Self = Self(SCREEN_BYTES - BYTES_PER_CELL);

    /// Validate a raw byte offset.
    pub const fn new(bytes: usize) -> Option<Self> {
        if bytes % BYTES_PER_CELL == 0 && bytes < SCREEN_BYTES {
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Offset of an on-screen `(col, row)`.
    pub const fn from_col_row(col: usize, row: usize) -> Option<Self> {
        CursorPosition::new(col, row).offset()
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    #[inline]
    pub const fn row(self) -> usize {
        get_offset_row(self.0)
    }

    #[inline]
    pub const fn col(self) -> usize {
        get_offset_col(self.0)
    }

    pub const fn position(self) -> CursorPosition {
        CursorPosition::new(self.col(), self.row())
    }

    /// Index of the cell in a row-major array of cells
    #[inline]
    pub const fn cell_index(self) -> usize {
        self.0 / BYTES_PER_CELL
    }

    /// Offset of the attribute byte of this cell
    #[inline]
    pub const fn attribute_byte(self) -> usize {
        self.0 + 1
    }
}

impl From<ScreenOffset> for usize {
    fn from(offset: ScreenOffset) -> Self {
        offset.0
    }
}
