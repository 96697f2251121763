//! デバイスドライバモジュール

pub mod irq;
pub mod pit;
pub mod port;

pub use irq::{InterruptContext, InterruptDispatcher, InterruptHandler};
pub use pit::{ProgrammableIntervalTimer, TickCounter};
pub use port::{PortAccess, PortIo, SimulatedPorts};
