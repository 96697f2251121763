// src/serial/timeout.rs

//! Timeout handling for serial operations
//!
//! Polling loops over UART status bits are bounded so that a missing or
//! wedged device degrades into an error instead of a hang.

/// Timeout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Maximum iterations for polling operations
    pub max_iterations: u32,
    /// Backoff strategy
    pub backoff: BackoffStrategy,
}

impl TimeoutConfig {
    /// Default timeout (balanced for most hardware)
    pub const fn default_timeout() -> Self {
        Self {
            max_iterations: 1000,
            backoff: BackoffStrategy::Linear,
        }
    }

    /// Short timeout for quick operations
    pub const fn short_timeout() -> Self {
        Self {
            max_iterations: 100,
            backoff: BackoffStrategy::None,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::default_timeout()
    }
}

/// Backoff strategy for polling operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// No backoff, busy-wait
    None,
    /// Linear backoff (wait n iterations)
    Linear,
}

/// Timeout context for tracking operation progress
#[derive(Debug)]
struct TimeoutContext {
    config: TimeoutConfig,
    iteration: u32,
}

impl TimeoutContext {
    const fn new(config: TimeoutConfig) -> Self {
        Self {
            config,
            iteration: 0,
        }
    }

    /// Check if timeout has been reached
    const fn is_expired(&self) -> bool {
        self.iteration >= self.config.max_iterations
    }

    /// Perform one iteration with backoff
    ///
    /// Returns false if timeout expired
    fn tick(&mut self) -> bool {
        if self.is_expired() {
            return false;
        }

        self.iteration += 1;
        for _ in 0..self.backoff() {
            core::hint::spin_loop();
        }
        true
    }

    fn backoff(&self) -> u32 {
        match self.config.backoff {
            BackoffStrategy::None => 0,
            BackoffStrategy::Linear => self.iteration,
        }
    }
}

/// Poll a condition with timeout and return a value
///
/// The condition function returns `Option<T>`:
/// - `Some(value)` indicates success
/// - `None` indicates not ready yet
///
/// Returns `None` once the iteration budget is spent.
fn poll_with_timeout_value<F, T>(config: TimeoutConfig, mut condition: F) -> Option<T>
where
    F: FnMut() -> Option<T>,
{
    let mut ctx = TimeoutContext::new(config);

    while ctx.tick() {
        if let Some(value) = condition() {
            return Some(value);
        }
    }
    None
}

/// Poll a condition with timeout
pub fn poll_with_timeout<F>(config: TimeoutConfig, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    poll_with_timeout_value(config, || condition().then_some(())).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_gives_up_after_budget() {
        let mut calls = 0;
        let ready = poll_with_timeout(TimeoutConfig::short_timeout(), || {
            calls += 1;
            false
        });
        assert!(!ready);
        assert_eq!(calls, 100);
    }

    #[test]
    fn test_poll_returns_first_value() {
        let mut n = 0;
        let value = poll_with_timeout_value(TimeoutConfig::default_timeout(), || {
            n += 1;
            (n == 3).then_some(n * 10)
        });
        assert_eq!(value, Some(30));
    }

    #[test]
    fn test_linear_backoff_spends_whole_budget() {
        let mut ctx = TimeoutContext::new(TimeoutConfig {
            max_iterations: 40,
            backoff: BackoffStrategy::Linear,
        });
        let mut ticks = 0;
        while ctx.tick() {
            ticks += 1;
        }
        assert_eq!(ticks, 40);
        assert!(ctx.is_expired());
    }
}
