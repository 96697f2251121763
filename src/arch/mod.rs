// src/arch/mod.rs

//! Architecture-specific abstractions.

use core::marker::PhantomData;

#[cfg(target_arch = "x86_64")]
pub mod x86_64;

#[cfg(target_arch = "x86_64")]
pub use self::x86_64::*;

/// Trait for CPU-specific operations.
pub trait Cpu {
    /// Halt the CPU until the next interrupt.
    fn halt();

    /// Disable interrupts.
    fn disable_interrupts();

    /// Enable interrupts.
    fn enable_interrupts();

    /// Check if interrupts are enabled.
    fn are_interrupts_enabled() -> bool;

    /// Run `f` with interrupts disabled, restoring the previous state afterwards.
    fn without_interrupts<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
        Self: Sized,
    {
        let _guard = InterruptGuard::<Self>::new();
        f()
    }
}

/// Scoped critical section.
///
/// Interrupts are disabled for the guard's lifetime and re-enabled on drop
/// if (and only if) they were enabled when the guard was created, so every
/// exit path out of the scope restores the caller's state.
#[must_use = "interrupts are re-enabled as soon as the guard is dropped"]
pub struct InterruptGuard<C: Cpu> {
    was_enabled: bool,
    _cpu: PhantomData<C>,
}

impl<C: Cpu> InterruptGuard<C> {
    pub fn new() -> Self {
        let was_enabled = C::are_interrupts_enabled();
        if was_enabled {
            C::disable_interrupts();
        }
        Self {
            was_enabled,
            _cpu: PhantomData,
        }
    }
}

impl<C: Cpu> Default for InterruptGuard<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Cpu> Drop for InterruptGuard<C> {
    fn drop(&mut self) {
        if self.was_enabled {
            C::enable_interrupts();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    std::thread_local! {
        static ENABLED: Cell<bool> = const { Cell::new(true) };
    }

    struct FakeCpu;

    impl Cpu for FakeCpu {
        fn halt() {}
        fn disable_interrupts() {
            ENABLED.with(|e| e.set(false));
        }
        fn enable_interrupts() {
            ENABLED.with(|e| e.set(true));
        }
        fn are_interrupts_enabled() -> bool {
            ENABLED.with(Cell::get)
        }
    }

    #[test]
    fn guard_restores_enabled_state() {
        ENABLED.with(|e| e.set(true));
        let seen = FakeCpu::without_interrupts(FakeCpu::are_interrupts_enabled);
        assert!(!seen);
        assert!(FakeCpu::are_interrupts_enabled());
    }

    #[test]
    fn guard_keeps_interrupts_disabled_if_they_were() {
        ENABLED.with(|e| e.set(false));
        {
            let _guard = InterruptGuard::<FakeCpu>::new();
        }
        assert!(!FakeCpu::are_interrupts_enabled());
    }

    #[test]
    fn guard_reenables_on_early_return() {
        fn bail() -> Option<u8> {
            let _guard = InterruptGuard::<FakeCpu>::new();
            let missing: Option<u8> = None;
            missing?;
            Some(1)
        }

        ENABLED.with(|e| e.set(true));
        assert_eq!(bail(), None);
        assert!(FakeCpu::are_interrupts_enabled());
    }
}
