// src/vga_buffer/console.rs

//! Cursor-addressed text console.
//!
//! [`TextConsole`] owns the framebuffer and the hardware cursor and keeps them
//! in step: every printed character leaves the hardware cursor on the cell the
//! next character will use.

use super::VgaError;
use super::backend::{ScreenChar, TextBuffer};
use super::color::{ColorCode, ConsoleConfig};
use super::cursor::CursorController;
use super::offset::{CursorPosition, ScreenOffset, get_offset, get_offset_col, get_offset_row};
use crate::constants::{BYTES_PER_CELL, BYTES_PER_ROW, MAX_ROWS, SCREEN_BYTES};
use crate::kernel::driver::port::PortIo;
use core::fmt;

/// Backspace control code
pub const BACKSPACE: u8 = 0x08;

/// Printed in place of characters outside ASCII (■)
pub const REPLACEMENT_CHAR: u8 = 0xfe;

/// Marker character written to the last cell on a bounds violation
pub const ERROR_MARKER: u8 = b'E';

/// VGA text console.
pub struct TextConsole<P: PortIo, B: TextBuffer> {
    buffer: B,
    cursor: CursorController<P>,
    config: ConsoleConfig,
    scrolls: u64,
}

impl<P: PortIo, B: TextBuffer> TextConsole<P, B> {
    pub fn new(buffer: B, ports: P, config: ConsoleConfig) -> Self {
        Self {
            buffer,
            cursor: CursorController::new(ports),
            config,
            scrolls: 0,
        }
    }

    /// Print `message` starting at `at`, or at the hardware cursor when `at`
    /// is `None`.
    ///
    /// Characters are printed one after another; the cursor is left after
    /// the last one. A character that lands off screen writes the `'E'`
    /// marker, and the next character continues from the position its raw
    /// offset names (`(80, 0)` continues at `(0, 1)`).
    ///
    /// # Errors
    ///
    /// The first [`VgaError::OutOfBounds`] hit while printing, reported once
    /// the whole message has been processed.
    pub fn print_at(&mut self, message: &str, at: Option<CursorPosition>) -> Result<(), VgaError> {
        self.print_at_with(message, at, None)
    }

    /// Print `message` at the hardware cursor.
    ///
    /// # Errors
    ///
    /// See [`TextConsole::print_at`].
    pub fn print(&mut self, message: &str) -> Result<(), VgaError> {
        self.print_at(message, None)
    }

    /// Print `message` at the hardware cursor in `color`.
    ///
    /// # Errors
    ///
    /// See [`TextConsole::print_at`].
    pub fn print_colored(&mut self, message: &str, color: ColorCode) -> Result<(), VgaError> {
        self.print_at_with(message, None, Some(color))
    }

    fn print_at_with(
        &mut self,
        message: &str,
        at: Option<CursorPosition>,
        attr: Option<ColorCode>,
    ) -> Result<(), VgaError> {
        let mut next = at;
        let mut first_error = None;
        for ch in message.chars() {
            let byte = if ch.is_ascii() { ch as u8 } else { REPLACEMENT_CHAR };
            let offset = match self.print_char(byte, next, attr) {
                Ok(offset) => offset.get(),
                Err(VgaError::OutOfBounds { offset }) => {
                    first_error.get_or_insert(VgaError::OutOfBounds { offset });
                    offset
                }
                Err(e) => return Err(e),
            };
            next = Some(CursorPosition::new(get_offset_col(offset), get_offset_row(offset)));
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Print one character and return the offset the cursor was moved to.
    ///
    /// `attr == None` uses the configured default attribute. `'\n'` moves to
    /// the start of the next row, [`BACKSPACE`] blanks the target cell without
    /// advancing, anything else is written and advances one cell. Running off
    /// the bottom-right scrolls the screen up by one row.
    ///
    /// # Errors
    ///
    /// [`VgaError::OutOfBounds`] when `at` or the hardware cursor is off
    /// screen. The `'E'` marker is written to the last cell before returning
    /// and neither the cursor nor any other cell is touched.
    pub fn print_char(
        &mut self,
        byte: u8,
        at: Option<CursorPosition>,
        attr: Option<ColorCode>,
    ) -> Result<ScreenOffset, VgaError> {
        let attr = attr.unwrap_or(self.config.default_attr);

        let target = match at {
            Some(pos) => match pos.offset() {
                Some(offset) => offset,
                None => return Err(self.mark_out_of_bounds(pos.raw_offset())),
            },
            None => {
                let raw = self.cursor.offset();
                match ScreenOffset::new(raw) {
                    Some(offset) => offset,
                    None => return Err(self.mark_out_of_bounds(raw)),
                }
            }
        };

        let mut next = match byte {
            b'\n' => get_offset(0, target.row() + 1),
            BACKSPACE => {
                self.buffer.write_cell(target, ScreenChar::blank(attr));
                target.get()
            }
            _ => {
                self.buffer.write_cell(target, ScreenChar::new(byte, attr));
                target.get() + BYTES_PER_CELL
            }
        };

        if next >= SCREEN_BYTES {
            self.scroll()?;
            next -= BYTES_PER_ROW;
        }

        let committed = ScreenOffset::new(next).ok_or(VgaError::OutOfBounds { offset: next })?;
        self.cursor.set_offset(committed);
        Ok(committed)
    }

    /// Blank every cell and move the cursor to the origin.
    pub fn clear_screen(&mut self) {
        let blank = ScreenChar::blank(self.config.default_attr);
        for byte in (0..SCREEN_BYTES).step_by(BYTES_PER_CELL) {
            if let Some(at) = ScreenOffset::new(byte) {
                self.buffer.write_cell(at, blank);
            }
        }
        self.cursor.set_offset(ScreenOffset::ORIGIN);
    }

    /// Erase the cell before the cursor and move the cursor onto it.
    ///
    /// At the origin there is no previous cell; the origin itself is blanked.
    ///
    /// # Errors
    ///
    /// [`VgaError::OutOfBounds`] if the hardware cursor is off screen.
    pub fn backspace(&mut self) -> Result<ScreenOffset, VgaError> {
        let at = self
            .cursor
            .offset()
            .checked_sub(BYTES_PER_CELL)
            .map(|offset| CursorPosition::new(get_offset_col(offset), get_offset_row(offset)));
        self.print_char(BACKSPACE, at, None)
    }

    /// Hardware cursor location in bytes (unvalidated)
    pub fn cursor_offset(&mut self) -> usize {
        self.cursor.offset()
    }

    /// Move the hardware cursor.
    pub fn set_cursor_offset(&mut self, offset: ScreenOffset) {
        self.cursor.set_offset(offset);
    }

    /// Number of scroll passes performed so far
    pub fn scroll_count(&self) -> u64 {
        self.scrolls
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn ports(&self) -> &P {
        self.cursor.ports()
    }

    pub fn ports_mut(&mut self) -> &mut P {
        self.cursor.ports_mut()
    }

    /// Shift rows 1.. up by one, dropping row 0, and blank the last row.
    fn scroll(&mut self) -> Result<(), VgaError> {
        self.buffer.copy_rows(1, 0, MAX_ROWS - 1)?;
        self.buffer
            .fill_row(MAX_ROWS - 1, ScreenChar::blank(self.config.default_attr))?;
        self.scrolls = self.scrolls.wrapping_add(1);
        Ok(())
    }

    fn mark_out_of_bounds(&mut self, offset: usize) -> VgaError {
        log::warn!("print outside the screen (offset {}), marking last cell", offset);
        self.buffer.write_cell(
            ScreenOffset::LAST_CELL,
            ScreenChar::new(ERROR_MARKER, self.config.error_attr),
        );
        VgaError::OutOfBounds { offset }
    }
}

impl<P: PortIo, B: TextBuffer> fmt::Write for TextConsole<P, B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print(s).map_err(|_| fmt::Error)
    }
}
