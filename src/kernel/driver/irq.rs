// src/kernel/driver/irq.rs
//! ハードウェア割り込みディスパッチ
//!
//! IRQ ライン番号 (0..16) ごとに 1 つのハンドラを保持し、割り込み発生時に
//! 同期的に呼び出します。IDT のスタブはベクタ番号を IRQ 番号に変換して
//! [`InterruptDispatcher::dispatch`] を呼ぶだけです。

use crate::constants::IRQ_LINES;
use crate::kernel::core::{ErrorKind, KernelError, KernelResult};
use spin::RwLock;

/// ハンドラに渡される割り込みコンテキスト
///
/// ハンドラはこれを解釈する必要はありません（タイマーは無視します）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptContext {
    irq: u8,
    vector: u8,
}

impl InterruptContext {
    #[inline]
    pub const fn new(irq: u8, vector: u8) -> Self {
        Self { irq, vector }
    }

    /// IRQ ライン番号
    #[inline]
    pub const fn irq(&self) -> u8 {
        self.irq
    }

    /// IDT ベクタ番号
    #[inline]
    pub const fn vector(&self) -> u8 {
        self.vector
    }
}

/// 割り込みハンドラ
///
/// 割り込みコンテキストで実行されるため、ブロックせず速やかに戻ること。
pub trait InterruptHandler: Sync {
    fn handle(&self, ctx: &InterruptContext);
}

type HandlerTable = [Option<&'static dyn InterruptHandler>; IRQ_LINES];

/// IRQ ライン → ハンドラの対応表
pub struct InterruptDispatcher {
    handlers: RwLock<HandlerTable>,
}

impl Default for InterruptDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptDispatcher {
    pub const fn new() -> Self {
        Self {
            handlers: RwLock::new([None; IRQ_LINES]),
        }
    }

    /// `irq` のハンドラを登録（既存のハンドラは置き換え）
    ///
    /// 割り込みハンドラと同じ CPU 上でロックを取り合わないよう、
    /// 割り込み禁止区間から呼び出すこと。
    ///
    /// # Errors
    ///
    /// `irq` が 16 以上の場合 `InvalidArgument`
    pub fn register(&self, irq: u8, handler: &'static dyn InterruptHandler) -> KernelResult<()> {
        let slot = usize::from(irq);
        if slot >= IRQ_LINES {
            return Err(KernelError::with_context(
                ErrorKind::InvalidArgument,
                "irq line out of range",
            ));
        }
        self.handlers.write()[slot] = Some(handler);
        Ok(())
    }

    /// `irq` のハンドラを解除
    pub fn unregister(&self, irq: u8) {
        if let Some(slot) = self.handlers.write().get_mut(usize::from(irq)) {
            *slot = None;
        }
    }

    /// ハンドラが登録済みか
    pub fn is_registered(&self, irq: u8) -> bool {
        self.handler(irq).is_some()
    }

    fn handler(&self, irq: u8) -> Option<&'static dyn InterruptHandler> {
        self.handlers.read().get(usize::from(irq)).copied().flatten()
    }

    /// 割り込みをハンドラへ配送
    ///
    /// ハンドラが実行された場合 `true` を返します。
    pub fn dispatch(&self, irq: u8, ctx: &InterruptContext) -> bool {
        // ハンドラ実行中はロックを保持しない
        match self.handler(irq) {
            Some(handler) => {
                handler.handle(ctx);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

    struct Counter(AtomicU32);

    impl InterruptHandler for Counter {
        fn handle(&self, _ctx: &InterruptContext) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct LastIrq(AtomicU8);

    impl InterruptHandler for LastIrq {
        fn handle(&self, ctx: &InterruptContext) {
            self.0.store(ctx.irq(), Ordering::Relaxed);
        }
    }

    #[test]
    fn test_dispatch_runs_registered_handler() {
        static COUNTER: Counter = Counter(AtomicU32::new(0));
        let dispatcher = InterruptDispatcher::new();
        dispatcher.register(0, &COUNTER).unwrap();

        let ctx = InterruptContext::new(0, 32);
        assert!(dispatcher.dispatch(0, &ctx));
        assert!(dispatcher.dispatch(0, &ctx));
        assert!(!dispatcher.dispatch(1, &ctx));
        assert_eq!(COUNTER.0.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_register_replaces_previous_handler() {
        static FIRST: Counter = Counter(AtomicU32::new(0));
        static SECOND: LastIrq = LastIrq(AtomicU8::new(0xff));
        let dispatcher = InterruptDispatcher::new();
        dispatcher.register(5, &FIRST).unwrap();
        dispatcher.register(5, &SECOND).unwrap();

        dispatcher.dispatch(5, &InterruptContext::new(5, 37));
        assert_eq!(FIRST.0.load(Ordering::Relaxed), 0);
        assert_eq!(SECOND.0.load(Ordering::Relaxed), 5);

        dispatcher.unregister(5);
        assert!(!dispatcher.is_registered(5));
    }

    #[test]
    fn test_out_of_range_line_is_rejected() {
        static COUNTER: Counter = Counter(AtomicU32::new(0));
        let dispatcher = InterruptDispatcher::new();
        let err = dispatcher.register(16, &COUNTER).unwrap_err();
        assert_eq!(*err.kind(), ErrorKind::InvalidArgument);
        assert!(!dispatcher.dispatch(16, &InterruptContext::new(16, 48)));
    }
}
