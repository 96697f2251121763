// src/arch/x86_64/qemu.rs

use crate::constants::QEMU_EXIT_PORT;
use x86_64::instructions::port::Port;

/// Write `code` to QEMU's isa-debug-exit device.
pub fn exit_qemu(code: u32) {
    // SAFETY: the isa-debug-exit device ignores everything but this write.
    unsafe {
        let mut port = Port::<u32>::new(QEMU_EXIT_PORT);
        port.write(code);
    }
}
