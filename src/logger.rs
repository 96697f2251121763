// src/logger.rs

//! `log` backend writing to COM1.
//!
//! Records are formatted as `[LEVEL] target: message` and sent through a
//! [`SerialPort`] guarded by a spin lock. The lock is only taken with
//! interrupts disabled so that an interrupt handler logging on the same CPU
//! cannot deadlock against the interrupted writer. The same port also serves
//! as the kernel's input line ([`read_byte`]).

use crate::arch::{ArchCpu, Cpu, HardwarePorts};
use crate::constants::SERIAL_IO_PORT;
use crate::kernel::core::{ErrorKind, KernelError, KernelResult};
use crate::serial::SerialPort;
use core::fmt::{self, Write};
use core::sync::atomic::{AtomicBool, Ordering};
use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

/// Serial-backed logger
pub struct SerialLogger {
    port: Mutex<Option<SerialPort<HardwarePorts>>>,
}

static LOGGER: SerialLogger = SerialLogger {
    port: Mutex::new(None),
};

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Format one record the way the serial log shows it.
pub fn format_record<W: Write>(out: &mut W, record: &Record<'_>) -> fmt::Result {
    writeln!(out, "[{}] {}: {}", record.level(), record.target(), record.args())
}

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        ArchCpu::without_interrupts(|| {
            if let Some(port) = self.port.lock().as_mut() {
                // Nothing sensible to do when the UART stops answering.
                let _ = format_record(port, record);
            }
        });
    }

    fn flush(&self) {}
}

/// Configure COM1 and install the serial logger.
///
/// # Errors
///
/// - `AlreadyInitialized` on every call after the first
/// - the serial probe error when COM1 is absent (the logger stays
///   uninstalled and the call may be retried)
pub fn init(level: LevelFilter) -> KernelResult<()> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(KernelError::with_context(
            ErrorKind::AlreadyInitialized,
            "logger",
        ));
    }

    // SAFETY: COM1 is owned by the logger from here on; no other driver
    // programs it.
    let mut port = SerialPort::new(unsafe { HardwarePorts::new() }, SERIAL_IO_PORT);
    if let Err(e) = port.configure() {
        LOGGER_INITIALIZED.store(false, Ordering::Release);
        return Err(e.into());
    }
    *LOGGER.port.lock() = Some(port);

    log::set_logger(&LOGGER).map_err(|_| {
        KernelError::with_context(ErrorKind::AlreadyInitialized, "log::set_logger")
    })?;
    log::set_max_level(level);
    Ok(())
}

/// Receive one byte from COM1 if one is waiting.
///
/// COM1 has a single owner; input is read through the logger's port so that
/// receive and transmit never program the UART concurrently.
pub fn read_byte() -> Option<u8> {
    ArchCpu::without_interrupts(|| LOGGER.port.lock().as_mut()?.try_read_byte())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_record_format() {
        let mut out = String::new();
        format_record(
            &mut out,
            &Record::builder()
                .level(Level::Warn)
                .target("textos::vga_buffer")
                .args(format_args!("offset {}", 4000))
                .build(),
        )
        .unwrap();
        assert_eq!(out, "[WARN] textos::vga_buffer: offset 4000\n");
    }
}
