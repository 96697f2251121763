// src/vga_buffer/cursor.rs

//! Hardware text-mode cursor.
//!
//! The cursor location lives in CRT controller registers 14 (high byte) and
//! 15 (low byte), reached through the index/data port pair at 0x3D4/0x3D5.
//! The hardware counts cells; this controller converts to and from byte
//! offsets.

use super::offset::ScreenOffset;
use crate::constants::{
    BYTES_PER_CELL, CURSOR_HIGH_INDEX, CURSOR_LOW_INDEX, REG_SCREEN_CTRL, REG_SCREEN_DATA,
};
use crate::kernel::driver::port::PortIo;

/// Reads and writes the hardware cursor register.
#[derive(Debug)]
pub struct CursorController<P: PortIo> {
    ports: P,
}

impl<P: PortIo> CursorController<P> {
    pub const fn new(ports: P) -> Self {
        Self { ports }
    }

    /// Current cursor location as a byte offset.
    ///
    /// The value comes straight from the hardware and is not validated: a
    /// cursor parked off-screen (e.g. by firmware) yields an offset at or
    /// beyond the end of the framebuffer.
    pub fn offset(&mut self) -> usize {
        self.ports.write_u8(REG_SCREEN_CTRL, CURSOR_HIGH_INDEX);
        let high = self.ports.read_u8(REG_SCREEN_DATA);
        self.ports.write_u8(REG_SCREEN_CTRL, CURSOR_LOW_INDEX);
        let low = self.ports.read_u8(REG_SCREEN_DATA);
        usize::from(u16::from_be_bytes([high, low])) * BYTES_PER_CELL
    }

    /// Move the cursor to `offset`.
    pub fn set_offset(&mut self, offset: ScreenOffset) {
        // SCREEN_BYTES / 2 < 2^16, the cell index always fits.
        let cell = offset.cell_index() as u16;
        let [high, low] = cell.to_be_bytes();
        self.ports.write_u8(REG_SCREEN_CTRL, CURSOR_HIGH_INDEX);
        self.ports.write_u8(REG_SCREEN_DATA, high);
        self.ports.write_u8(REG_SCREEN_CTRL, CURSOR_LOW_INDEX);
        self.ports.write_u8(REG_SCREEN_DATA, low);
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::driver::port::{PortAccess, SimulatedPorts};

    fn crtc() -> SimulatedPorts {
        SimulatedPorts::new().with_indexed_pair(REG_SCREEN_CTRL, REG_SCREEN_DATA)
    }

    #[test]
    fn set_offset_writes_cell_index_high_then_low() {
        let mut cursor = CursorController::new(crtc());
        cursor.set_offset(ScreenOffset::new(2 * 0x07d0 - 2).unwrap());

        assert_eq!(
            cursor.ports().log(),
            &[
                PortAccess::Write { port: REG_SCREEN_CTRL, value: 14 },
                PortAccess::Write { port: REG_SCREEN_DATA, value: 0x07 },
                PortAccess::Write { port: REG_SCREEN_CTRL, value: 15 },
                PortAccess::Write { port: REG_SCREEN_DATA, value: 0xcf },
            ]
        );
    }

    #[test]
    fn offset_reads_high_then_low_and_doubles() {
        let mut ports = crtc();
        ports.set_indexed_register(REG_SCREEN_DATA, 14, 0x01);
        ports.set_indexed_register(REG_SCREEN_DATA, 15, 0x40);
        let mut cursor = CursorController::new(ports);

        assert_eq!(cursor.offset(), 0x140 * 2);
        assert_eq!(
            cursor.ports().log(),
            &[
                PortAccess::Write { port: REG_SCREEN_CTRL, value: 14 },
                PortAccess::Read { port: REG_SCREEN_DATA, value: 0x01 },
                PortAccess::Write { port: REG_SCREEN_CTRL, value: 15 },
                PortAccess::Read { port: REG_SCREEN_DATA, value: 0x40 },
            ]
        );
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut cursor = CursorController::new(crtc());
        let target = ScreenOffset::from_col_row(17, 12).unwrap();
        cursor.set_offset(target);
        assert_eq!(cursor.offset(), target.get());
    }
}
