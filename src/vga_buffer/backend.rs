// src/vga_buffer/backend.rs

//! Low-level framebuffer access abstractions.
//!
//! The [`TextBuffer`] trait lets the console target either the classic
//! text-mode buffer at `0xB8000` or an in-memory buffer for testing.
//! Cell accesses take a [`ScreenOffset`], which is in range by construction.

use super::VgaError;
use super::color::ColorCode;
use super::offset::ScreenOffset;
use crate::constants::{BYTES_PER_ROW, MAX_ROWS, SCREEN_BYTES, VIDEO_ADDRESS};
use alloc::string::String;
use core::ptr::NonNull;

/// A character byte and its attribute byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ScreenChar {
    pub ascii: u8,
    pub color: ColorCode,
}

impl ScreenChar {
    pub const fn new(ascii: u8, color: ColorCode) -> Self {
        Self { ascii, color }
    }

    /// A space in `color`
    pub const fn blank(color: ColorCode) -> Self {
        Self::new(b' ', color)
    }
}

/// Abstraction over the text-mode framebuffer memory.
pub trait TextBuffer {
    /// Read the cell at `at`.
    fn read_cell(&self, at: ScreenOffset) -> ScreenChar;

    /// Write the cell at `at`.
    fn write_cell(&mut self, at: ScreenOffset, cell: ScreenChar);

    /// Copy `count` whole rows starting at `src_row` onto the rows starting at
    /// `dst_row`. Overlapping ranges are handled.
    ///
    /// # Errors
    ///
    /// Returns [`VgaError::InvalidRow`] if either range leaves the screen.
    fn copy_rows(&mut self, src_row: usize, dst_row: usize, count: usize) -> Result<(), VgaError>;

    /// Fill an entire row with `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`VgaError::InvalidRow`] if the row exceeds the display.
    fn fill_row(&mut self, row: usize, cell: ScreenChar) -> Result<(), VgaError> {
        if row >= MAX_ROWS {
            return Err(VgaError::InvalidRow { row });
        }
        let start = row * BYTES_PER_ROW;
        for byte in (start..start + BYTES_PER_ROW).step_by(2) {
            if let Some(at) = ScreenOffset::new(byte) {
                self.write_cell(at, cell);
            }
        }
        Ok(())
    }
}

fn check_rows(src_row: usize, dst_row: usize, count: usize) -> Result<(), VgaError> {
    for row in [src_row, dst_row] {
        match row.checked_add(count) {
            Some(end) if end <= MAX_ROWS => {}
            _ => return Err(VgaError::InvalidRow { row }),
        }
    }
    Ok(())
}

/// Concrete backend that talks to the legacy text-mode buffer at 0xB8000.
#[derive(Debug)]
pub struct TextModeBuffer {
    ptr: NonNull<u8>,
}

// SAFETY: the buffer is a fixed MMIO region; exclusive access is enforced by
// `&mut self` on every writing method and by the single owner created in
// `TextModeBuffer::new`.
unsafe impl Send for TextModeBuffer {}

impl TextModeBuffer {
    /// Construct the text-mode backend.
    ///
    /// # Safety
    ///
    /// `VIDEO_ADDRESS` must be identity-mapped (or otherwise mapped at that
    /// virtual address) and no other owner may write the framebuffer.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self {
            // SAFETY: 0xB8000 is the canonical VGA text buffer address.
            ptr: unsafe { NonNull::new_unchecked(VIDEO_ADDRESS as *mut u8) },
        }
    }

    #[inline]
    fn read_byte(&self, index: usize) -> u8 {
        debug_assert!(index < SCREEN_BYTES);
        // SAFETY: callers only pass indices derived from `ScreenOffset` or
        // checked row ranges, so `index < SCREEN_BYTES`.
        unsafe { core::ptr::read_volatile(self.ptr.as_ptr().add(index)) }
    }

    #[inline]
    fn write_byte(&mut self, index: usize, value: u8) {
        debug_assert!(index < SCREEN_BYTES);
        // SAFETY: see `read_byte`.
        unsafe { core::ptr::write_volatile(self.ptr.as_ptr().add(index), value) }
    }
}

impl TextBuffer for TextModeBuffer {
    fn read_cell(&self, at: ScreenOffset) -> ScreenChar {
        ScreenChar::new(
            self.read_byte(at.get()),
            ColorCode::from_raw(self.read_byte(at.attribute_byte())),
        )
    }

    fn write_cell(&mut self, at: ScreenOffset, cell: ScreenChar) {
        self.write_byte(at.get(), cell.ascii);
        self.write_byte(at.attribute_byte(), cell.color.as_u8());
    }

    fn copy_rows(&mut self, src_row: usize, dst_row: usize, count: usize) -> Result<(), VgaError> {
        check_rows(src_row, dst_row, count)?;
        let src = src_row * BYTES_PER_ROW;
        let dst = dst_row * BYTES_PER_ROW;
        let len = count * BYTES_PER_ROW;

        // Volatile byte copy in the direction that is safe for the overlap.
        if dst <= src {
            for i in 0..len {
                let byte = self.read_byte(src + i);
                self.write_byte(dst + i, byte);
            }
        } else {
            for i in (0..len).rev() {
                let byte = self.read_byte(src + i);
                self.write_byte(dst + i, byte);
            }
        }
        Ok(())
    }
}

/// Framebuffer backed by ordinary memory.
#[derive(Clone)]
pub struct MemoryBuffer {
    bytes: [u8; SCREEN_BYTES],
}

impl MemoryBuffer {
    /// An all-zero buffer (every cell black-on-black NUL)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bytes: [0; SCREEN_BYTES],
        }
    }

    /// Raw framebuffer bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Character byte at `(col, row)`
    pub fn char_at(&self, col: usize, row: usize) -> Option<u8> {
        ScreenOffset::from_col_row(col, row).map(|at| self.read_cell(at).ascii)
    }

    /// Text of `row`, trailing blanks and NULs removed
    pub fn row_text(&self, row: usize) -> String {
        if row >= MAX_ROWS {
            return String::new();
        }
        let start = row * BYTES_PER_ROW;
        let text: String = self.bytes[start..start + BYTES_PER_ROW]
            .chunks_exact(2)
            .map(|cell| if cell[0] == 0 { ' ' } else { char::from(cell[0]) })
            .collect();
        String::from(text.trim_end())
    }
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for MemoryBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryBuffer").finish_non_exhaustive()
    }
}

impl TextBuffer for MemoryBuffer {
    fn read_cell(&self, at: ScreenOffset) -> ScreenChar {
        ScreenChar::new(
            self.bytes[at.get()],
            ColorCode::from_raw(self.bytes[at.attribute_byte()]),
        )
    }

    fn write_cell(&mut self, at: ScreenOffset, cell: ScreenChar) {
        self.bytes[at.get()] = cell.ascii;
        self.bytes[at.attribute_byte()] = cell.color.as_u8();
    }

    fn copy_rows(&mut self, src_row: usize, dst_row: usize, count: usize) -> Result<(), VgaError> {
        check_rows(src_row, dst_row, count)?;
        let src = src_row * BYTES_PER_ROW;
        self.bytes
            .copy_within(src..src + count * BYTES_PER_ROW, dst_row * BYTES_PER_ROW);
        Ok(())
    }
}
