// src/kernel/driver/port.rs

//! Byte-granularity I/O port access.
//!
//! Drivers never execute `in`/`out` themselves. They are generic over
//! [`PortIo`] so that the same display and timer logic can run against the
//! real ports ([`crate::arch::x86_64::port::HardwarePorts`]) or against
//! [`SimulatedPorts`], which records every access and answers reads from a
//! small device model.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;

/// Ordered byte access to CPU I/O ports.
///
/// Every call is one hardware access. Implementations must not cache,
/// merge or reorder calls: index/data register pairs and the PIT's
/// low/high byte phases latch each byte in program order.
pub trait PortIo {
    /// Read one byte from `port`.
    fn read_u8(&mut self, port: u16) -> u8;

    /// Write one byte to `port`.
    fn write_u8(&mut self, port: u16, value: u8);
}

impl<P: PortIo + ?Sized> PortIo for &mut P {
    #[inline]
    fn read_u8(&mut self, port: u16) -> u8 {
        (**self).read_u8(port)
    }

    #[inline]
    fn write_u8(&mut self, port: u16, value: u8) {
        (**self).write_u8(port, value)
    }
}

/// One recorded port access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortAccess {
    Read { port: u16, value: u8 },
    Write { port: u16, value: u8 },
}

impl PortAccess {
    /// Port number of the access
    pub const fn port(&self) -> u16 {
        match *self {
            Self::Read { port, .. } | Self::Write { port, .. } => port,
        }
    }

    /// Returns `(port, value)` for writes
    pub const fn as_write(&self) -> Option<(u16, u8)> {
        match *self {
            Self::Write { port, value } => Some((port, value)),
            Self::Read { .. } => None,
        }
    }
}

/// An index/data register pair such as the VGA CRT controller.
///
/// Writing the index port selects a register; reads and writes of the data
/// port then go to that register.
#[derive(Debug, Clone)]
struct IndexedPair {
    index_port: u16,
    data_port: u16,
    selected: u8,
    registers: [u8; 256],
}

/// Recording port backend for host-side tests and tooling.
///
/// Reads are answered, in order of precedence, from:
/// 1. values queued with [`SimulatedPorts::queue_read`] (one-shot)
/// 2. a modelled index/data pair registered with
///    [`SimulatedPorts::with_indexed_pair`]
/// 3. a sticky value set with [`SimulatedPorts::set_input`]
/// 4. `0`
#[derive(Debug, Clone, Default)]
pub struct SimulatedPorts {
    log: Vec<PortAccess>,
    queued: BTreeMap<u16, VecDeque<u8>>,
    inputs: BTreeMap<u16, u8>,
    pairs: Vec<IndexedPair>,
}

impl SimulatedPorts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Model `index_port`/`data_port` as an indexed register file.
    #[must_use]
    pub fn with_indexed_pair(mut self, index_port: u16, data_port: u16) -> Self {
        self.pairs.push(IndexedPair {
            index_port,
            data_port,
            selected: 0,
            registers: [0; 256],
        });
        self
    }

    /// Queue a one-shot value for the next read of `port`.
    pub fn queue_read(&mut self, port: u16, value: u8) {
        self.queued.entry(port).or_default().push_back(value);
    }

    /// Make every read of `port` return `value` until changed.
    pub fn set_input(&mut self, port: u16, value: u8) {
        self.inputs.insert(port, value);
    }

    /// Value currently held by register `index` of the pair behind `data_port`.
    pub fn indexed_register(&self, data_port: u16, index: u8) -> Option<u8> {
        self.pairs
            .iter()
            .find(|pair| pair.data_port == data_port)
            .map(|pair| pair.registers[usize::from(index)])
    }

    /// Preload register `index` of the pair behind `data_port`.
    pub fn set_indexed_register(&mut self, data_port: u16, index: u8, value: u8) {
        if let Some(pair) = self.pairs.iter_mut().find(|pair| pair.data_port == data_port) {
            pair.registers[usize::from(index)] = value;
        }
    }

    /// Every access in program order.
    pub fn log(&self) -> &[PortAccess] {
        &self.log
    }

    /// Bytes written to `port`, in order.
    pub fn writes_to(&self, port: u16) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(PortAccess::as_write)
            .filter(|&(p, _)| p == port)
            .map(|(_, value)| value)
            .collect()
    }
}

impl PortIo for SimulatedPorts {
    fn read_u8(&mut self, port: u16) -> u8 {
        let value = if let Some(value) = self.queued.get_mut(&port).and_then(VecDeque::pop_front) {
            value
        } else if let Some(pair) = self.pairs.iter().find(|pair| pair.data_port == port) {
            pair.registers[usize::from(pair.selected)]
        } else {
            self.inputs.get(&port).copied().unwrap_or(0)
        };
        self.log.push(PortAccess::Read { port, value });
        value
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        self.log.push(PortAccess::Write { port, value });
        for pair in &mut self.pairs {
            if pair.index_port == port {
                pair.selected = value;
            } else if pair.data_port == port {
                pair.registers[usize::from(pair.selected)] = value;
            }
        }
    }
}
