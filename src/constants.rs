// src/constants.rs

//! Kernel constants and configuration values
//!
//! This module centralizes the hardware addresses, port numbers and
//! user-facing messages used throughout the kernel.

/// Text-mode screen width in character cells
pub const MAX_COLS: usize = 80;
/// Text-mode screen height in character cells
pub const MAX_ROWS: usize = 25;

/// Bytes per cell (1 byte character + 1 byte attribute)
pub const BYTES_PER_CELL: usize = 2;

/// Bytes per screen row
pub const BYTES_PER_ROW: usize = MAX_COLS * BYTES_PER_CELL;

/// Total framebuffer size in bytes
pub const SCREEN_BYTES: usize = MAX_ROWS * BYTES_PER_ROW;

/// VGA text buffer physical memory address
pub const VIDEO_ADDRESS: usize = 0xb8000;

/// CRT controller index register
pub const REG_SCREEN_CTRL: u16 = 0x3d4;
/// CRT controller data register
pub const REG_SCREEN_DATA: u16 = 0x3d5;
/// CRTC index of the cursor location high byte
pub const CURSOR_HIGH_INDEX: u8 = 14;
/// CRTC index of the cursor location low byte
pub const CURSOR_LOW_INDEX: u8 = 15;

/// PIT channel 0 data port
pub const PIT_CHANNEL0_DATA: u16 = 0x40;
/// PIT mode/command port
pub const PIT_COMMAND: u16 = 0x43;
/// Channel 0, lobyte/hibyte access, mode 3 (square wave), binary
pub const PIT_SQUARE_WAVE_COMMAND: u8 = 0x36;
/// PIT input clock (Hz)
pub const PIT_BASE_FREQUENCY: u32 = 1_193_180;
/// Tick rate programmed at boot (Hz)
pub const DEFAULT_TICK_HZ: u32 = 50;

/// IRQ line wired to the system timer
pub const TIMER_IRQ: u8 = 0;
/// Number of lines served by the chained 8259 PICs
pub const IRQ_LINES: usize = 16;
/// Vector offset of the master PIC after remapping
pub const PIC_1_OFFSET: u8 = 32;
/// Vector offset of the slave PIC after remapping
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

/// COM1 base port
pub const SERIAL_IO_PORT: u16 = 0x3f8;

/// QEMU isa-debug-exit port
pub const QEMU_EXIT_PORT: u16 = 0xf4;

/// Page size used by the `PAGE` command allocator
pub const PAGE_SIZE: usize = 4096;
/// Bytes requested by the `PAGE` command
pub const PAGE_COMMAND_BYTES: usize = 1000;
/// Size of the static arena backing the kernel heap
pub const HEAP_ARENA_SIZE: usize = 256 * 1024;

/// Longest line accepted by the serial line editor
pub const MAX_LINE_LEN: usize = 256;

/// Banner printed once the console is ready
pub const BANNER: &str = "Type something, it will go through the kernel! (END to stop)\n>";
/// Printed by the `END` command before the main loop stops
pub const FAREWELL: &str = "Stopping... Bye!\n";
/// Prefix of every echoed input line
pub const ECHO_PREFIX: &str = "You said: ";
/// Prompt printed after each handled line
pub const PROMPT: &str = "\n>";
