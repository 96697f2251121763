// src/serial/mod.rs

//! Serial port driver (COM1)
//!
//! Provides UART communication on COM1 (0x3F8) with:
//! - 38400 baud rate
//! - 8 data bits, no parity, 1 stop bit (8N1)
//! - FIFO enabled and cleared at init
//! - transmit waits bounded by [`TimeoutConfig`]
//!
//! The driver is generic over [`PortIo`]; the kernel drives it with
//! [`crate::arch::HardwarePorts`], tests with
//! [`crate::kernel::driver::port::SimulatedPorts`].

pub(crate) mod constants;
mod timeout;

pub use timeout::{BackoffStrategy, TimeoutConfig};
use timeout::poll_with_timeout;

use crate::kernel::core::{DeviceError, ErrorKind, KernelError};
use crate::kernel::driver::port::PortIo;
use constants::{
    BAUD_RATE_DIVISOR, CONFIG_8N1, DLAB_ENABLE, FIFO_ENABLE_CLEAR, LSR_DATA_READY,
    LSR_TRANSMIT_EMPTY, MODEM_CTRL_ENABLE_IRQ_RTS_DSR, register_offset,
};
use core::fmt;

/// Serial port operation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialError {
    /// The transmitter did not become ready within the timeout
    Timeout,
    /// The line status register reads as all ones (no UART present)
    PortNotPresent,
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialError::Timeout => write!(f, "Serial port transmit timeout"),
            SerialError::PortNotPresent => write!(f, "Serial port hardware not present"),
        }
    }
}

impl From<SerialError> for KernelError {
    fn from(e: SerialError) -> Self {
        match e {
            SerialError::Timeout => KernelError::with_context(
                ErrorKind::Device(DeviceError::Timeout),
                "serial transmit",
            ),
            SerialError::PortNotPresent => KernelError::with_context(
                ErrorKind::Device(DeviceError::NotFound),
                "serial probe",
            ),
        }
    }
}

/// 16550-compatible UART.
#[derive(Debug)]
pub struct SerialPort<P: PortIo> {
    ports: P,
    base: u16,
    timeout: TimeoutConfig,
}

impl<P: PortIo> SerialPort<P> {
    pub const fn new(ports: P, base: u16) -> Self {
        Self {
            ports,
            base,
            timeout: TimeoutConfig::default_timeout(),
        }
    }

    /// Use `timeout` for transmit waits.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    const fn port(&self, offset: u16) -> u16 {
        self.base + offset
    }

    /// Program baud rate, line format, FIFO and modem control.
    ///
    /// # Errors
    ///
    /// [`SerialError::PortNotPresent`] when the line status register floats
    /// high after configuration.
    pub fn configure(&mut self) -> Result<(), SerialError> {
        let [divisor_high, divisor_low] = BAUD_RATE_DIVISOR.to_be_bytes();

        // Disable interrupts first
        self.ports.write_u8(self.port(register_offset::INTERRUPT_ENABLE), 0x00);

        // Set DLAB to configure baud rate
        self.ports.write_u8(self.port(register_offset::LINE_CONTROL), DLAB_ENABLE);
        self.ports.write_u8(self.port(register_offset::DATA), divisor_low);
        self.ports.write_u8(self.port(register_offset::INTERRUPT_ENABLE), divisor_high);

        // Configure 8N1 and clear DLAB
        self.ports.write_u8(self.port(register_offset::LINE_CONTROL), CONFIG_8N1);
        self.ports.write_u8(self.port(register_offset::FIFO_CONTROL), FIFO_ENABLE_CLEAR);
        self.ports.write_u8(
            self.port(register_offset::MODEM_CONTROL),
            MODEM_CTRL_ENABLE_IRQ_RTS_DSR,
        );

        if self.line_status() == 0xff {
            return Err(SerialError::PortNotPresent);
        }
        Ok(())
    }

    fn line_status(&mut self) -> u8 {
        let port = self.port(register_offset::LINE_STATUS);
        self.ports.read_u8(port)
    }

    /// Wait for the transmitter and send one byte.
    ///
    /// # Errors
    ///
    /// [`SerialError::Timeout`] if the transmit holding register stays full.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), SerialError> {
        let timeout = self.timeout;
        if !poll_with_timeout(timeout, || self.line_status() & LSR_TRANSMIT_EMPTY != 0) {
            return Err(SerialError::Timeout);
        }
        let data = self.port(register_offset::DATA);
        self.ports.write_u8(data, byte);
        Ok(())
    }

    /// Send every byte of `bytes`, translating `\n` to `\r\n`.
    ///
    /// # Errors
    ///
    /// Stops at the first [`SerialError::Timeout`].
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        for &byte in bytes {
            if byte == b'\n' {
                self.write_byte(b'\r')?;
            }
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Receive one byte if one is waiting.
    pub fn try_read_byte(&mut self) -> Option<u8> {
        if self.line_status() & LSR_DATA_READY == 0 {
            return None;
        }
        let data = self.port(register_offset::DATA);
        Some(self.ports.read_u8(data))
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }
}

impl<P: PortIo> fmt::Write for SerialPort<P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SERIAL_IO_PORT;
    use crate::kernel::driver::port::SimulatedPorts;

    const LSR: u16 = SERIAL_IO_PORT + register_offset::LINE_STATUS;

    fn ready_port() -> SerialPort<SimulatedPorts> {
        let mut ports = SimulatedPorts::new();
        ports.set_input(LSR, LSR_TRANSMIT_EMPTY);
        SerialPort::new(ports, SERIAL_IO_PORT)
    }

    #[test]
    fn test_configure_programs_divisor_under_dlab() {
        let mut serial = ready_port();
        serial.configure().unwrap();

        let lcr = serial.ports().writes_to(SERIAL_IO_PORT + register_offset::LINE_CONTROL);
        assert_eq!(lcr, [DLAB_ENABLE, CONFIG_8N1]);
        assert_eq!(serial.ports().writes_to(SERIAL_IO_PORT), [3]);
        assert_eq!(
            serial.ports().writes_to(SERIAL_IO_PORT + register_offset::INTERRUPT_ENABLE),
            [0x00, 0x00]
        );
    }

    #[test]
    fn test_configure_detects_floating_bus() {
        let mut ports = SimulatedPorts::new();
        ports.set_input(LSR, 0xff);
        let mut serial = SerialPort::new(ports, SERIAL_IO_PORT);
        assert_eq!(serial.configure(), Err(SerialError::PortNotPresent));
    }

    #[test]
    fn test_newline_becomes_crlf() {
        let mut serial = ready_port();
        serial.write_bytes(b"ok\n").unwrap();
        assert_eq!(serial.ports().writes_to(SERIAL_IO_PORT), b"ok\r\n");
    }

    #[test]
    fn test_busy_transmitter_times_out() {
        let mut serial = SerialPort::new(SimulatedPorts::new(), SERIAL_IO_PORT)
            .with_timeout(TimeoutConfig::short_timeout());
        assert_eq!(serial.write_byte(b'x'), Err(SerialError::Timeout));
        assert!(serial.ports().writes_to(SERIAL_IO_PORT).is_empty());
    }

    #[test]
    fn test_try_read_byte_honours_data_ready() {
        let mut serial = ready_port();
        assert_eq!(serial.try_read_byte(), None);

        serial.ports_mut().queue_read(LSR, LSR_DATA_READY);
        serial.ports_mut().queue_read(SERIAL_IO_PORT, b'k');
        assert_eq!(serial.try_read_byte(), Some(b'k'));
    }
}
