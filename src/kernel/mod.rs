// src/kernel/mod.rs
//! カーネル抽象化
//!
//! デバイスドライバ、メモリ管理、コマンドループと、それらが共有する
//! エラー型・trait をまとめます。

pub mod core;
pub mod driver;
pub mod mm;
pub mod shell;

pub use shell::{Kernel, LineEditor, LineEvent};
