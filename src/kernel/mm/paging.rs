// src/kernel/mm/paging.rs
//! 仮想アドレス → 物理アドレス変換
//!
//! `PAGE` コマンドは割り当てたページの物理アドレスも表示するため、
//! アロケータは [`AddressTranslator`] を通して物理アドレスを求めます。
//! 実機ではアクティブなページテーブルを辿り、テストでは固定オフセットで
//! 変換します。

use x86_64::{PhysAddr, VirtAddr};

/// 仮想アドレスを物理アドレスに変換する
pub trait AddressTranslator {
    /// マップされていなければ `None`
    fn translate(&self, virt: VirtAddr) -> Option<PhysAddr>;
}

/// `phys = virt - offset` で変換する（offset 0 なら恒等マップ）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTranslator {
    offset: u64,
}

impl OffsetTranslator {
    pub const fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// 恒等マップ
    pub const fn identity() -> Self {
        Self::new(0)
    }
}

impl AddressTranslator for OffsetTranslator {
    fn translate(&self, virt: VirtAddr) -> Option<PhysAddr> {
        let phys = virt.as_u64().checked_sub(self.offset)?;
        PhysAddr::try_new(phys).ok()
    }
}

#[cfg(target_os = "none")]
pub use self::hardware::PageTableTranslator;

#[cfg(target_os = "none")]
mod hardware {
    use super::AddressTranslator;
    use x86_64::registers::control::Cr3;
    use x86_64::structures::paging::{OffsetPageTable, PageTable, Translate};
    use x86_64::{PhysAddr, VirtAddr};

    /// アクティブなレベル 4 ページテーブルを辿って変換する
    pub struct PageTableTranslator {
        table: OffsetPageTable<'static>,
    }

    // SAFETY: ページテーブルはカーネルコンテキストからのみ参照し、
    // 変換は読み取りのみ
    unsafe impl Send for PageTableTranslator {}

    impl PageTableTranslator {
        /// # Safety
        ///
        /// 物理メモリ全体が `physical_memory_offset` から始まる仮想領域に
        /// マップされていること。また、この関数は一度だけ呼び出すこと
        /// （レベル 4 テーブルへの `&mut` を複数作らないため）。
        pub unsafe fn new(physical_memory_offset: VirtAddr) -> Self {
            let (level_4_frame, _) = Cr3::read();
            let virt = physical_memory_offset + level_4_frame.start_address().as_u64();
            let table_ptr: *mut PageTable = virt.as_mut_ptr();
            // SAFETY: 呼び出し元の保証により table_ptr は有効なレベル 4 テーブル
            let level_4_table = unsafe { &mut *table_ptr };
            Self {
                // SAFETY: 同上
                table: unsafe { OffsetPageTable::new(level_4_table, physical_memory_offset) },
            }
        }
    }

    impl AddressTranslator for PageTableTranslator {
        fn translate(&self, virt: VirtAddr) -> Option<PhysAddr> {
            self.table.translate_addr(virt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_translation() {
        let translator = OffsetTranslator::new(0x1000);
        assert_eq!(
            translator.translate(VirtAddr::new(0x5000)),
            Some(PhysAddr::new(0x4000))
        );
        assert_eq!(translator.translate(VirtAddr::new(0x0800)), None);
        assert_eq!(
            OffsetTranslator::identity().translate(VirtAddr::new(0xb8000)),
            Some(PhysAddr::new(0xb8000))
        );
    }
}
