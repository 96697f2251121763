// src/vga_buffer/color.rs

//! VGA color definitions and color code management

/// VGA color codes (4-bit color palette)
#[allow(dead_code)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VgaColor {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    Pink = 13,
    Yellow = 14,
    White = 15,
}

/// Attribute byte combining foreground and background colors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorCode(u8);

impl ColorCode {
    /// Create a new color code from foreground and background colors
    pub const fn new(fg: VgaColor, bg: VgaColor) -> Self {
        Self((bg as u8) << 4 | (fg as u8))
    }

    /// Wrap a raw attribute byte (a zero byte is a legitimate black-on-black)
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Get the raw byte value
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// White on black
    pub const fn white_on_black() -> Self {
        Self::new(VgaColor::White, VgaColor::Black)
    }

    /// Red on white, used by the out-of-bounds marker
    pub const fn red_on_white() -> Self {
        Self::new(VgaColor::Red, VgaColor::White)
    }
}

/// Attribute configuration of a [`super::TextConsole`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Used whenever a caller does not pass an explicit attribute
    pub default_attr: ColorCode,
    /// Used for the `'E'` bounds-violation marker
    pub error_attr: ColorCode,
}

impl ConsoleConfig {
    pub const fn new() -> Self {
        Self {
            default_attr: ColorCode::white_on_black(),
            error_attr: ColorCode::red_on_white(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_code_encoding() {
        assert_eq!(ColorCode::new(VgaColor::White, VgaColor::Red).as_u8(), 0x4F);
        assert_eq!(ColorCode::white_on_black().as_u8(), 0x0F);
        assert_eq!(ColorCode::red_on_white().as_u8(), 0xF4);
    }
}
