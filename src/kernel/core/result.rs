// src/kernel/core/result.rs
//! カーネル共通エラーハンドリング
//!
//! コンテキスト情報付きエラーで、デバッグを容易にします。

use core::fmt;

/// カーネル Result 型
pub type KernelResult<T> = Result<T, KernelError>;

/// カーネルエラー（コンテキスト情報付き）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelError {
    kind: ErrorKind,
    context: Option<&'static str>,
}

impl KernelError {
    /// 新しいエラーを作成
    #[inline]
    pub const fn new(kind: ErrorKind) -> Self {
        Self { kind, context: None }
    }

    /// コンテキスト情報付きエラーを作成
    #[inline]
    pub const fn with_context(kind: ErrorKind, ctx: &'static str) -> Self {
        Self { kind, context: Some(ctx) }
    }

    /// エラー種類を取得
    #[inline]
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// コンテキストを取得
    #[inline]
    pub const fn context(&self) -> Option<&'static str> {
        self.context
    }

    /// デバイスエラーか確認
    #[inline]
    pub const fn is_device_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Device(_))
    }

    /// メモリエラーか確認
    #[inline]
    pub const fn is_memory_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Memory(_))
    }
}

/// エラー種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// デバイスエラー
    Device(DeviceError),
    /// メモリエラー
    Memory(MemoryError),
    /// 不正な引数
    InvalidArgument,
    /// 二重初期化
    AlreadyInitialized,
}

/// デバイスエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// ハードウェアが応答しない
    Timeout,
    /// デバイスが見つからない
    NotFound,
}

/// メモリエラー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    /// メモリ不足
    OutOfMemory,
    /// 不正なアドレス
    InvalidAddress,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ErrorKind::Device(e) => write!(f, "Device error: {:?}", e)?,
            ErrorKind::Memory(e) => write!(f, "Memory error: {:?}", e)?,
            ErrorKind::InvalidArgument => write!(f, "Invalid argument")?,
            ErrorKind::AlreadyInitialized => write!(f, "Already initialized")?,
        }

        if let Some(ctx) = self.context {
            write!(f, " (context: {})", ctx)?;
        }

        Ok(())
    }
}

impl From<DeviceError> for KernelError {
    #[inline]
    fn from(e: DeviceError) -> Self {
        KernelError::new(ErrorKind::Device(e))
    }
}

impl From<MemoryError> for KernelError {
    #[inline]
    fn from(e: MemoryError) -> Self {
        KernelError::new(ErrorKind::Memory(e))
    }
}

impl From<ErrorKind> for KernelError {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        KernelError::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = KernelError::with_context(
            ErrorKind::Memory(MemoryError::OutOfMemory),
            "page arena exhausted",
        );
        assert_eq!(
            format!("{}", err),
            "Memory error: OutOfMemory (context: page arena exhausted)"
        );
    }

    #[test]
    fn conversions_pick_the_right_kind() {
        let err: KernelError = DeviceError::Timeout.into();
        assert!(err.is_device_error());
        assert!(!err.is_memory_error());

        let err: KernelError = MemoryError::InvalidAddress.into();
        assert!(err.is_memory_error());
        assert_eq!(err.context(), None);
    }
}
