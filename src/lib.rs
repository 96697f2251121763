// src/lib.rs
//! textos - VGA テキストコンソールと PIT タイマーを備えた最小カーネル
//!
//! ハードウェアに触れる部分はすべて trait ([`kernel::driver::port::PortIo`],
//! [`vga_buffer::TextBuffer`], [`arch::Cpu`]) の背後にあり、ドライバのロジックは
//! ホスト上でシミュレートされたポートとメモリ上のフレームバッファを使って
//! テストできます。ベアメタル専用のコード (IDT, GDT, グローバルアロケータ) は
//! `target_os = "none"` でのみコンパイルされます。

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_os = "none", feature(abi_x86_interrupt))]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod arch;
pub mod constants;
pub mod kernel;
pub mod logger;
pub mod qemu;
pub mod serial;
pub mod vga_buffer;

use crate::arch::{ArchCpu, Cpu};

pub use qemu::{QemuExitCode, exit_qemu};

/// グローバルヒープアロケータ
///
/// `PAGE` コマンドの [`kernel::mm::PageAllocator`] も同じヒープから割り当てます。
#[cfg(target_os = "none")]
#[global_allocator]
pub static ALLOCATOR: kernel::mm::LockedHeap = kernel::mm::LockedHeap::empty();

/// 静的領域でカーネルヒープを初期化
///
/// # Errors
///
/// 二回目以降の呼び出しは `AlreadyInitialized`
#[cfg(target_os = "none")]
pub fn init_heap() -> kernel::core::KernelResult<()> {
    use crate::constants::HEAP_ARENA_SIZE;

    #[repr(C, align(4096))]
    struct Arena([u8; HEAP_ARENA_SIZE]);

    static mut HEAP_ARENA: Arena = Arena([0; HEAP_ARENA_SIZE]);

    // SAFETY: 領域は ALLOCATOR にだけ渡され、二重初期化は init_heap が拒否する
    unsafe { kernel::mm::init_heap(&ALLOCATOR, (&raw mut HEAP_ARENA).cast(), HEAP_ARENA_SIZE) }
}

/// Halt loop
#[inline]
pub fn hlt_loop() -> ! {
    loop {
        ArchCpu::halt();
    }
}
