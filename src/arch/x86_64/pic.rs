//! Programmable Interrupt Controller (8259 PIC)
//!
//! 割り込みコントローラの初期化と管理を行います。
//! 標準的なデュアルPIC構成（Master/Slave）をサポートします。

use crate::kernel::driver::port::PortIo;

/// Master PIC のコマンドポート
pub const PIC1_COMMAND: u16 = 0x20;
/// Master PIC のデータポート
pub const PIC1_DATA: u16 = 0x21;
/// Slave PIC のコマンドポート
pub const PIC2_COMMAND: u16 = 0xA0;
/// Slave PIC のデータポート
pub const PIC2_DATA: u16 = 0xA1;

/// 初期化コマンド (ICW1)
const ICW1_INIT: u8 = 0x11;
/// 8086/88 モード (ICW4)
const ICW4_8086: u8 = 0x01;
/// End of Interrupt (EOI) コマンド
const PIC_EOI: u8 = 0x20;
/// POST 診断ポート（I/O 待機用）
const WAIT_PORT: u16 = 0x80;

/// チェーン接続された PIC
pub struct ChainedPics<P: PortIo> {
    ports: P,
    offsets: [u8; 2],
}

impl<P: PortIo> ChainedPics<P> {
    /// 指定されたオフセットで新しい PIC チェーンを作成
    #[must_use]
    pub const fn new(ports: P, offset1: u8, offset2: u8) -> Self {
        Self {
            ports,
            offsets: [offset1, offset2],
        }
    }

    fn wait(&mut self) {
        self.ports.write_u8(WAIT_PORT, 0);
    }

    /// PIC を初期化（リマップ）
    ///
    /// 初期化直後は IRQ2 (Slave カスケード) 以外すべてマスクします。
    /// 必要なラインは [`ChainedPics::unmask_irq`] で個別に解除します。
    pub fn initialize(&mut self) {
        // ICW1: 初期化開始
        self.ports.write_u8(PIC1_COMMAND, ICW1_INIT);
        self.wait();
        self.ports.write_u8(PIC2_COMMAND, ICW1_INIT);
        self.wait();

        // ICW2: ベクタオフセット設定
        self.ports.write_u8(PIC1_DATA, self.offsets[0]);
        self.wait();
        self.ports.write_u8(PIC2_DATA, self.offsets[1]);
        self.wait();

        // ICW3: Master/Slave 接続設定
        self.ports.write_u8(PIC1_DATA, 4); // Master: Slave は IRQ2 に接続
        self.wait();
        self.ports.write_u8(PIC2_DATA, 2); // Slave: 自身のカスケード ID
        self.wait();

        // ICW4: モード設定 (8086)
        self.ports.write_u8(PIC1_DATA, ICW4_8086);
        self.wait();
        self.ports.write_u8(PIC2_DATA, ICW4_8086);
        self.wait();

        self.ports.write_u8(PIC1_DATA, 0xfb);
        self.ports.write_u8(PIC2_DATA, 0xff);
    }

    /// ベクタ番号がこの PIC チェーンの担当か
    pub fn handles_interrupt(&self, vector: u8) -> bool {
        self.offsets
            .iter()
            .any(|&offset| offset <= vector && vector < offset.saturating_add(8))
    }

    /// ベクタ番号を IRQ ライン番号 (0-15) に変換
    pub fn irq_of(&self, vector: u8) -> Option<u8> {
        if !self.handles_interrupt(vector) {
            return None;
        }
        if vector >= self.offsets[1] && vector < self.offsets[1].saturating_add(8) {
            Some(vector - self.offsets[1] + 8)
        } else {
            Some(vector - self.offsets[0])
        }
    }

    /// 割り込み終了を通知 (EOI)
    pub fn notify_end_of_interrupt(&mut self, vector: u8) {
        let Some(irq) = self.irq_of(vector) else {
            return;
        };
        // Slave PIC からの割り込みなら、Slave にも EOI を送る
        if irq >= 8 {
            self.ports.write_u8(PIC2_COMMAND, PIC_EOI);
        }
        // Master には常に EOI を送る
        self.ports.write_u8(PIC1_COMMAND, PIC_EOI);
    }

    /// 特定の IRQ のマスクを解除
    pub fn unmask_irq(&mut self, irq: u8) {
        let (port, bit) = if irq < 8 {
            (PIC1_DATA, irq)
        } else {
            (PIC2_DATA, irq - 8)
        };
        let value = self.ports.read_u8(port);
        self.ports.write_u8(port, value & !(1 << bit));
    }

    /// 内部のポートバックエンド
    pub fn ports(&self) -> &P {
        &self.ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::driver::port::SimulatedPorts;

    #[test]
    fn initialize_remaps_vectors() {
        let mut pics = ChainedPics::new(SimulatedPorts::new(), 32, 40);
        pics.initialize();

        assert_eq!(pics.ports().writes_to(PIC1_COMMAND), vec![ICW1_INIT]);
        assert_eq!(pics.ports().writes_to(PIC2_COMMAND), vec![ICW1_INIT]);
        assert_eq!(pics.ports().writes_to(PIC1_DATA), vec![32, 4, ICW4_8086, 0xfb]);
        assert_eq!(pics.ports().writes_to(PIC2_DATA), vec![40, 2, ICW4_8086, 0xff]);
    }

    #[test]
    fn eoi_goes_to_slave_only_for_high_lines() {
        let mut pics = ChainedPics::new(SimulatedPorts::new(), 32, 40);
        pics.notify_end_of_interrupt(32);
        assert_eq!(pics.ports().writes_to(PIC1_COMMAND), vec![PIC_EOI]);
        assert!(pics.ports().writes_to(PIC2_COMMAND).is_empty());

        pics.notify_end_of_interrupt(44);
        assert_eq!(pics.ports().writes_to(PIC2_COMMAND), vec![PIC_EOI]);

        pics.notify_end_of_interrupt(3);
        assert_eq!(pics.ports().writes_to(PIC1_COMMAND).len(), 2);
    }

    #[test]
    fn vector_to_irq_mapping() {
        let pics = ChainedPics::new(SimulatedPorts::new(), 32, 40);
        assert_eq!(pics.irq_of(32), Some(0));
        assert_eq!(pics.irq_of(39), Some(7));
        assert_eq!(pics.irq_of(40), Some(8));
        assert_eq!(pics.irq_of(47), Some(15));
        assert_eq!(pics.irq_of(48), None);
    }

    #[test]
    fn unmask_clears_only_the_requested_bit() {
        let mut ports = SimulatedPorts::new();
        ports.set_input(PIC1_DATA, 0xfb);
        let mut pics = ChainedPics::new(ports, 32, 40);
        pics.unmask_irq(0);
        assert_eq!(pics.ports().writes_to(PIC1_DATA), vec![0xfa]);
    }
}
