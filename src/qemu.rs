//! Utilities for interacting with QEMU's debug exit device.

use crate::arch::{ArchCpu, Cpu};
use crate::arch::qemu;

/// Exit codes understood by QEMU's ISA debug exit device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum QemuExitCode {
    /// The kernel stopped normally (the `END` command was handled).
    Success = 0x10,
    /// The kernel stopped because of a panic.
    Failed = 0x11,
}

/// Write the exit code to QEMU's debug exit port and halt the CPU.
#[inline]
pub fn exit_qemu(code: QemuExitCode) -> ! {
    qemu::exit_qemu(code as u32);

    loop {
        ArchCpu::halt();
    }
}
