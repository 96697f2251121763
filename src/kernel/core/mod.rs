// src/kernel/core/mod.rs
//! カーネルコア: エラー型

pub mod result;

pub use result::{DeviceError, ErrorKind, KernelError, KernelResult, MemoryError};
