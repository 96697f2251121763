// src/kernel/mm/allocator.rs
//! メモリアロケータ
//!
//! ヒープは `linked_list_allocator` の [`LockedHeap`] で管理します。
//! カーネルのグローバルアロケータと `PAGE` コマンドの割り当ては同じヒープを
//! 共有し、後者は [`PageAllocator`] を通して仮想・物理アドレスの組を返します。

use super::paging::AddressTranslator;
use crate::constants::PAGE_SIZE;
use crate::kernel::core::{ErrorKind, KernelError, KernelResult, MemoryError};
use core::alloc::Layout;
use core::ptr::NonNull;
use x86_64::{PhysAddr, VirtAddr};

pub use linked_list_allocator::LockedHeap;

/// ヒープを初期化
///
/// # Safety
///
/// - `[start, start + size)` が他の目的で使用されていない書き込み可能な領域であること
/// - この領域がヒープより長生きすること
///
/// # Errors
///
/// 既に初期化済みの場合 `AlreadyInitialized`（ヒープは変更されません）
pub unsafe fn init_heap(heap: &LockedHeap, start: *mut u8, size: usize) -> KernelResult<()> {
    let mut heap = heap.lock();
    if heap.size() != 0 {
        return Err(KernelError::with_context(
            ErrorKind::AlreadyInitialized,
            "heap",
        ));
    }
    // SAFETY: 呼び出し元が領域の有効性を保証する
    unsafe { heap.init(start, size) };
    Ok(())
}

/// 割り当てのアライメント指定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignFlag {
    /// ワード境界
    Unaligned,
    /// ページ境界 (4096)
    PageAligned,
}

impl AlignFlag {
    /// バイト単位のアライメント
    pub const fn align(self) -> usize {
        match self {
            AlignFlag::Unaligned => core::mem::align_of::<usize>(),
            AlignFlag::PageAligned => PAGE_SIZE,
        }
    }
}

/// 割り当て結果
///
/// 解放は [`PageAllocator::deallocate`] に渡して行います。
#[derive(Debug, PartialEq, Eq)]
pub struct Allocation {
    virt: VirtAddr,
    phys: PhysAddr,
    layout: Layout,
}

impl Allocation {
    /// 仮想アドレス
    pub const fn virt(&self) -> VirtAddr {
        self.virt
    }

    /// 物理アドレス
    pub const fn phys(&self) -> PhysAddr {
        self.phys
    }

    /// 割り当てサイズ
    pub const fn size(&self) -> usize {
        self.layout.size()
    }
}

/// 仮想・物理アドレスを返すアロケータ
pub struct PageAllocator<T: AddressTranslator> {
    heap: &'static LockedHeap,
    translator: T,
}

impl<T: AddressTranslator> PageAllocator<T> {
    pub const fn new(heap: &'static LockedHeap, translator: T) -> Self {
        Self { heap, translator }
    }

    /// `size` バイトを割り当て
    ///
    /// # Errors
    ///
    /// - `size == 0` の場合 `InvalidArgument`
    /// - ヒープに空きがない場合 `Memory(OutOfMemory)`
    /// - 物理アドレスに変換できない場合 `Memory(InvalidAddress)`（割り当ては戻されます）
    pub fn allocate(&self, size: usize, flag: AlignFlag) -> KernelResult<Allocation> {
        if size == 0 {
            return Err(KernelError::with_context(
                ErrorKind::InvalidArgument,
                "zero-sized allocation",
            ));
        }
        let layout = Layout::from_size_align(size, flag.align()).map_err(|_| {
            KernelError::with_context(ErrorKind::InvalidArgument, "allocation size overflow")
        })?;

        let ptr = self.heap.lock().allocate_first_fit(layout).map_err(|()| {
            log::error!("allocation of {} bytes ({:?}) failed", size, flag);
            KernelError::from(MemoryError::OutOfMemory)
        })?;

        let virt = VirtAddr::from_ptr(ptr.as_ptr());
        match self.translator.translate(virt) {
            Some(phys) => Ok(Allocation { virt, phys, layout }),
            None => {
                // SAFETY: ptr は直前に同じ layout で割り当てたもの
                unsafe { self.heap.lock().deallocate(ptr, layout) };
                Err(KernelError::with_context(
                    ErrorKind::Memory(MemoryError::InvalidAddress),
                    "allocation has no physical mapping",
                ))
            }
        }
    }

    /// 割り当てを解放
    pub fn deallocate(&self, allocation: Allocation) {
        if let Some(ptr) = NonNull::new(allocation.virt.as_mut_ptr::<u8>()) {
            // SAFETY: Allocation は allocate でのみ作られ、Clone できないため
            // 同じ領域が二重に解放されることはない
            unsafe { self.heap.lock().deallocate(ptr, allocation.layout) };
        }
    }

    /// ヒープの空き容量
    pub fn free_bytes(&self) -> usize {
        self.heap.lock().free()
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::mm::paging::OffsetTranslator;
    use alloc::boxed::Box;
    use alloc::vec;

    fn heap(size: usize) -> &'static LockedHeap {
        let heap: &'static LockedHeap = Box::leak(Box::new(LockedHeap::empty()));
        let arena: &'static mut [u8] = Box::leak(vec![0u8; size].into_boxed_slice());
        unsafe { init_heap(heap, arena.as_mut_ptr(), arena.len()) }.unwrap();
        heap
    }

    #[test]
    fn test_page_aligned_allocation() {
        let allocator = PageAllocator::new(heap(64 * 1024), OffsetTranslator::identity());
        let page = allocator.allocate(1000, AlignFlag::PageAligned).unwrap();

        assert!(page.virt().is_aligned(PAGE_SIZE as u64));
        assert_eq!(page.phys().as_u64(), page.virt().as_u64());
        assert_eq!(page.size(), 1000);
    }

    #[test]
    fn test_second_init_is_rejected() {
        let heap = heap(16 * 1024);
        let mut other = [0u8; 1024];
        let err = unsafe { init_heap(heap, other.as_mut_ptr(), other.len()) }.unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::AlreadyInitialized);
        assert!(heap.lock().size() >= 15 * 1024);
    }

    #[test]
    fn test_exhaustion_and_release() {
        let allocator = PageAllocator::new(heap(16 * 1024), OffsetTranslator::identity());
        let free = allocator.free_bytes();

        let err = allocator.allocate(64 * 1024, AlignFlag::Unaligned).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::Memory(MemoryError::OutOfMemory));

        let block = allocator.allocate(512, AlignFlag::Unaligned).unwrap();
        assert!(allocator.free_bytes() < free);
        allocator.deallocate(block);
        assert_eq!(allocator.free_bytes(), free);
    }

    #[test]
    fn test_zero_size_is_invalid() {
        let allocator = PageAllocator::new(heap(4096), OffsetTranslator::identity());
        let err = allocator.allocate(0, AlignFlag::PageAligned).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_untranslatable_allocation_is_returned() {
        let allocator = PageAllocator::new(heap(16 * 1024), OffsetTranslator::new(u64::MAX));
        let free = allocator.free_bytes();
        let err = allocator.allocate(100, AlignFlag::Unaligned).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::Memory(MemoryError::InvalidAddress));
        assert_eq!(allocator.free_bytes(), free);
    }
}
