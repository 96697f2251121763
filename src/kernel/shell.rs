//! カーネルコンテキストとコマンドループ
//!
//! コンソール、ティックカウンタ、ページアロケータといったカーネル全体で
//! 1 つしかない状態を [`Kernel`] にまとめ、入力行ごとにコマンドを実行します。
//!
//! | 入力   | 動作                                               |
//! |--------|----------------------------------------------------|
//! | `END`  | 画面を消去し、別れの挨拶を表示してループを止める   |
//! | `PAGE` | 1 ページ割り当て、仮想・物理アドレスを表示してエコー |
//! | その他 | `You said: ` に続けてエコー                        |

use crate::constants::{BANNER, ECHO_PREFIX, FAREWELL, MAX_LINE_LEN, PAGE_COMMAND_BYTES, PROMPT};
use crate::kernel::driver::pit::TickCounter;
use crate::kernel::driver::port::PortIo;
use crate::kernel::mm::{AddressTranslator, AlignFlag, PageAllocator};
use crate::vga_buffer::{TextBuffer, TextConsole, VgaError};
use alloc::format;

/// 入力行バッファ
///
/// 表示可能な ASCII (0x20..=0x7e) のみを保持するため、内容は常に有効な UTF-8。
#[derive(Clone)]
pub struct LineEditor {
    buf: [u8; MAX_LINE_LEN],
    len: usize,
}

/// [`LineEditor::push`] の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    /// 文字を追加した（エコーする）
    Inserted(u8),
    /// 末尾の文字を削除した
    Erased,
    /// 行が確定した
    Submitted,
    /// 何もしなかった（制御文字、バッファ満杯、空行でのバックスペース）
    Ignored,
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineEditor {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_LINE_LEN],
            len: 0,
        }
    }

    /// 1 バイトを処理
    pub fn push(&mut self, byte: u8) -> LineEvent {
        match byte {
            b'\r' | b'\n' => LineEvent::Submitted,
            0x08 | 0x7f => {
                if self.len == 0 {
                    LineEvent::Ignored
                } else {
                    self.len -= 1;
                    LineEvent::Erased
                }
            }
            0x20..=0x7e if self.len < MAX_LINE_LEN => {
                self.buf[self.len] = byte;
                self.len += 1;
                LineEvent::Inserted(byte)
            }
            _ => LineEvent::Ignored,
        }
    }

    /// 現在の行
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// カーネルコンテキスト
pub struct Kernel<P: PortIo, B: TextBuffer, T: AddressTranslator> {
    console: TextConsole<P, B>,
    ticks: &'static TickCounter,
    allocator: PageAllocator<T>,
    editor: LineEditor,
    running: bool,
}

impl<P: PortIo, B: TextBuffer, T: AddressTranslator> Kernel<P, B, T> {
    pub fn new(
        console: TextConsole<P, B>,
        ticks: &'static TickCounter,
        allocator: PageAllocator<T>,
    ) -> Self {
        Self {
            console,
            ticks,
            allocator,
            editor: LineEditor::new(),
            running: false,
        }
    }

    /// 画面を消去してバナーを表示し、コマンドループを開始状態にする
    pub fn boot(&mut self) -> Result<(), VgaError> {
        self.console.clear_screen();
        self.console.print(BANNER)?;
        self.running = true;
        Ok(())
    }

    /// 1 行分の入力を処理
    pub fn handle_input(&mut self, line: &str) -> Result<(), VgaError> {
        if line == "END" {
            self.console.clear_screen();
            self.console.print(FAREWELL)?;
            self.running = false;
            log::info!("command loop stopped after {} ticks", self.ticks.get());
            return Ok(());
        }

        if line == "PAGE" {
            self.page_command()?;
        }

        self.console.print(ECHO_PREFIX)?;
        self.console.print(line)?;
        self.console.print(PROMPT)
    }

    fn page_command(&mut self) -> Result<(), VgaError> {
        // 割り当てたページは解放しない
        match self.allocator.allocate(PAGE_COMMAND_BYTES, AlignFlag::PageAligned) {
            Ok(page) => self.console.print(&format!(
                "Page: {:#x}, physical address: {:#x}\n",
                page.virt().as_u64(),
                page.phys().as_u64()
            )),
            Err(e) => {
                let error_attr = self.console.config().error_attr;
                self.console
                    .print_colored(&format!("PAGE failed: {}\n", e), error_attr)
            }
        }
    }

    /// シリアルから受け取った 1 バイトを行エディタに渡す
    ///
    /// 表示可能文字はエコーし、バックスペースは画面上の 1 文字も消します。
    /// 改行で行が確定すると [`Kernel::handle_input`] を実行します。
    pub fn receive_byte(&mut self, byte: u8) -> Result<(), VgaError> {
        match self.editor.push(byte) {
            LineEvent::Inserted(ch) => self.console.print_char(ch, None, None).map(|_| ()),
            LineEvent::Erased => self.console.backspace().map(|_| ()),
            LineEvent::Submitted => {
                let line = core::mem::take(&mut self.editor);
                self.console.print("\n")?;
                self.handle_input(line.as_str())
            }
            LineEvent::Ignored => Ok(()),
        }
    }

    /// コマンドループを続けるか
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// 起動からのティック数
    pub fn ticks(&self) -> u32 {
        self.ticks.get()
    }

    pub fn console(&self) -> &TextConsole<P, B> {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut TextConsole<P, B> {
        &mut self.console
    }

    pub fn allocator(&self) -> &PageAllocator<T> {
        &self.allocator
    }
}
