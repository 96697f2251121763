//! Programmable Interval Timer (PIT)
//!
//! チャンネル 0 を矩形波モードで設定し、IRQ0 ごとにティックカウンタを
//! 1 つ進めます。

use crate::constants::{
    PIT_BASE_FREQUENCY, PIT_CHANNEL0_DATA, PIT_COMMAND, PIT_SQUARE_WAVE_COMMAND, TIMER_IRQ,
};
use crate::kernel::core::{ErrorKind, KernelError, KernelResult};
use crate::kernel::driver::irq::{InterruptContext, InterruptDispatcher, InterruptHandler};
use crate::kernel::driver::port::PortIo;
use core::num::NonZeroU32;
use core::sync::atomic::{AtomicU32, Ordering};

/// 単調増加するティックカウンタ
///
/// 割り込み 1 回につき 1 だけ増え、オーバーフロー時は黙って 0 に戻ります。
#[derive(Debug, Default)]
pub struct TickCounter(AtomicU32);

impl TickCounter {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// 現在のティック数
    #[inline]
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    /// ティックを 1 つ進め、進める前の値を返す
    #[inline]
    pub fn tick(&self) -> u32 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// `frequency` Hz で割り込みが入っている前提での経過ミリ秒
    pub fn uptime_ms(&self, frequency: NonZeroU32) -> u64 {
        u64::from(self.get()) * 1000 / u64::from(frequency.get())
    }
}

impl InterruptHandler for TickCounter {
    fn handle(&self, _ctx: &InterruptContext) {
        self.tick();
    }
}

/// `frequency` Hz に対する分周値
///
/// # Errors
///
/// 分周値が 0 になる（基本周波数を超える）場合、または 16 ビットに
/// 収まらない場合 `InvalidArgument`
pub fn divisor(frequency: NonZeroU32) -> KernelResult<u16> {
    let divisor = PIT_BASE_FREQUENCY / frequency.get();
    if divisor == 0 {
        return Err(KernelError::with_context(
            ErrorKind::InvalidArgument,
            "timer frequency above the PIT input clock",
        ));
    }
    u16::try_from(divisor).map_err(|_| {
        KernelError::with_context(ErrorKind::InvalidArgument, "timer frequency too low")
    })
}

/// Programmable Interval Timer
pub struct ProgrammableIntervalTimer<P: PortIo> {
    ports: P,
    frequency: Option<NonZeroU32>,
}

impl<P: PortIo> ProgrammableIntervalTimer<P> {
    /// 新しい PIT ドライバを作成
    pub const fn new(ports: P) -> Self {
        Self {
            ports,
            frequency: None,
        }
    }

    /// IRQ0 にティックハンドラを登録し、周波数を設定
    ///
    /// ポートへの書き込み順はコマンド (0x43)、分周値下位、上位 (0x40)。
    ///
    /// 受け付ける周波数は 19 Hz 以上 1193180 Hz 以下。18 Hz 以下では分周値が
    /// 16 ビットに収まらず、上位ビットを切り捨てて書き込むと全く別の周波数に
    /// なるため、切り捨てずにエラーとします。
    ///
    /// # Errors
    ///
    /// 周波数が範囲外の場合 `InvalidArgument`（この場合ハンドラは登録されず、
    /// ポートにも触れません）
    pub fn init(
        &mut self,
        dispatcher: &InterruptDispatcher,
        counter: &'static TickCounter,
        frequency: NonZeroU32,
    ) -> KernelResult<()> {
        let divisor = divisor(frequency)?;
        dispatcher.register(TIMER_IRQ, counter)?;
        self.program(divisor);
        self.frequency = Some(frequency);
        log::debug!("PIT programmed: {} Hz, divisor {}", frequency, divisor);
        Ok(())
    }

    fn program(&mut self, divisor: u16) {
        let [low, high] = divisor.to_le_bytes();
        // モード設定: Channel 0, Access lo/hi, Mode 3 (Square Wave), Binary
        self.ports.write_u8(PIT_COMMAND, PIT_SQUARE_WAVE_COMMAND);
        self.ports.write_u8(PIT_CHANNEL0_DATA, low);
        self.ports.write_u8(PIT_CHANNEL0_DATA, high);
    }

    /// 設定済みの周波数
    pub fn frequency(&self) -> Option<NonZeroU32> {
        self.frequency
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }
}
