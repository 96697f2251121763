// src/vga_buffer/mod.rs

//! VGA text mode driver
//!
//! This module provides cursor-addressed output to the 80x25 text buffer:
//! - byte-offset arithmetic shared with the hardware cursor ([`offset`])
//! - the CRT controller cursor register ([`CursorController`])
//! - character printing, newline/backspace handling and scroll-on-overflow
//!   ([`TextConsole`])
//! - interchangeable framebuffer backends ([`TextModeBuffer`] for the real
//!   hardware, [`MemoryBuffer`] for tests)
//!
//! # Layout
//!
//! The buffer holds `MAX_COLS * MAX_ROWS` cells in row-major order. Each cell
//! occupies 2 bytes:
//! - Byte 0: character code
//! - Byte 1: color attribute (4 bits background | 4 bits foreground)

pub mod backend;
pub mod color;
pub mod console;
pub mod cursor;
pub mod offset;

pub use backend::{MemoryBuffer, ScreenChar, TextBuffer, TextModeBuffer};
pub use color::{ColorCode, ConsoleConfig, VgaColor};
pub use console::TextConsole;
pub use cursor::CursorController;
pub use offset::{CursorPosition, ScreenOffset, get_offset, get_offset_col, get_offset_row};

use core::fmt;

/// Errors that can occur when interacting with the VGA subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VgaError {
    /// A print targeted a cell outside the screen. `offset` is the
    /// unvalidated byte offset that was requested; do not use it for cursor
    /// arithmetic.
    OutOfBounds { offset: usize },
    /// A row range left the screen.
    InvalidRow { row: usize },
}

impl VgaError {
    /// Convert the error into a human-readable static message.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfBounds { .. } => "position outside the screen",
            Self::InvalidRow { .. } => "invalid row range",
        }
    }
}

impl fmt::Display for VgaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { offset } => write!(f, "{} (offset {})", self.as_str(), offset),
            Self::InvalidRow { row } => write!(f, "{} (row {})", self.as_str(), row),
        }
    }
}
