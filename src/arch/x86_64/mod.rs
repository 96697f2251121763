// src/arch/x86_64/mod.rs

pub mod cpu;
#[cfg(target_os = "none")]
pub mod gdt;
#[cfg(target_os = "none")]
pub mod interrupts;
pub mod pic;
pub mod port;
pub mod qemu;

pub use cpu::X86Cpu;
pub use port::HardwarePorts;

/// CPU implementation for the current architecture
pub type ArchCpu = X86Cpu;
