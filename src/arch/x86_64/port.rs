// src/arch/x86_64/port.rs

//! x86 port I/O backend.
//!
//! Implements [`PortIo`] with the `in`/`out` instructions provided by the
//! `x86_64` crate. The unsafety of port access is concentrated in the
//! constructor.

use crate::kernel::driver::port::PortIo;
use x86_64::instructions::port::Port;

/// Direct `in`/`out` access to every I/O port.
#[derive(Debug)]
pub struct HardwarePorts {
    _private: (),
}

impl HardwarePorts {
    /// Create the hardware port backend.
    ///
    /// # Safety
    ///
    /// The caller must be running at an I/O privilege level that permits
    /// port access (ring 0 in this kernel), and must ensure that the devices
    /// driven through this handle are not concurrently programmed by another
    /// owner.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl PortIo for HardwarePorts {
    #[inline]
    fn read_u8(&mut self, port: u16) -> u8 {
        // SAFETY: port access privilege was asserted by `HardwarePorts::new`.
        // The asm block is volatile, so the access is never elided or reordered.
        unsafe { Port::<u8>::new(port).read() }
    }

    #[inline]
    fn write_u8(&mut self, port: u16, value: u8) {
        // SAFETY: see `read_u8`.
        unsafe { Port::<u8>::new(port).write(value) }
    }
}
