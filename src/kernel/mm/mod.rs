// src/kernel/mm/mod.rs
//! メモリ管理モジュール

pub mod allocator;
pub mod paging;

pub use allocator::{AlignFlag, Allocation, LockedHeap, PageAllocator, init_heap};
pub use paging::{AddressTranslator, OffsetTranslator};

#[cfg(target_os = "none")]
pub use paging::PageTableTranslator;
