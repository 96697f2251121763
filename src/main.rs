//! textos カーネルのエントリポイント
//!
//! 起動順: ロガー → GDT/IDT → PIC → ヒープ → コンソール → PIT → 割り込み許可 →
//! コマンドループ。ループが `END` で止まると QEMU を終了します。

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(target_os = "none")]
mod boot {
    use bootloader::{BootInfo, entry_point};
    use core::num::NonZeroU32;
    use core::panic::PanicInfo;
    use log::LevelFilter;
    use textos::arch::interrupts::{self, DISPATCHER};
    use textos::arch::{ArchCpu, Cpu, HardwarePorts, gdt};
    use textos::constants::DEFAULT_TICK_HZ;
    use textos::kernel::Kernel;
    use textos::kernel::driver::{ProgrammableIntervalTimer, TickCounter};
    use textos::kernel::mm::{PageAllocator, PageTableTranslator};
    use textos::vga_buffer::{ConsoleConfig, TextConsole, TextModeBuffer};
    use textos::{QemuExitCode, exit_qemu, hlt_loop};
    use x86_64::VirtAddr;

    const TICK_HZ: NonZeroU32 = match NonZeroU32::new(DEFAULT_TICK_HZ) {
        Some(hz) => hz,
        None => panic!("DEFAULT_TICK_HZ must be non-zero"),
    };

    static TICKS: TickCounter = TickCounter::new();

    entry_point!(kernel_main);

    fn kernel_main(boot_info: &'static BootInfo) -> ! {
        // COM1 がなくても起動は続ける（ログが出ないだけ）
        let _ = textos::logger::init(LevelFilter::Debug);
        log::info!("textos booting ({} build)", env!("TEXTOS_BUILD_PROFILE"));

        gdt::init();
        interrupts::init_idt();
        interrupts::init_pics();
        log::info!("GDT, IDT and PIC ready");

        if let Err(e) = textos::init_heap() {
            panic!("heap initialization failed: {}", e);
        }

        // SAFETY: bootloader の map_physical_memory により物理メモリ全体が
        // physical_memory_offset にマップされている。呼び出しはここだけ。
        let translator =
            unsafe { PageTableTranslator::new(VirtAddr::new(boot_info.physical_memory_offset)) };
        let allocator = PageAllocator::new(&textos::ALLOCATOR, translator);

        // SAFETY: フレームバッファと CRTC ポートはコンソールだけが操作する
        let console = unsafe {
            TextConsole::new(TextModeBuffer::new(), HardwarePorts::new(), ConsoleConfig::new())
        };
        let mut kernel = Kernel::new(console, &TICKS, allocator);

        // SAFETY: PIT のポートはこのドライバだけが操作する
        let mut pit = ProgrammableIntervalTimer::new(unsafe { HardwarePorts::new() });
        if let Err(e) = ArchCpu::without_interrupts(|| pit.init(&DISPATCHER, &TICKS, TICK_HZ)) {
            log::error!("timer setup failed: {}", e);
        }

        if let Err(e) = kernel.boot() {
            log::warn!("banner not printed: {}", e);
        }
        ArchCpu::enable_interrupts();
        log::info!("interrupts enabled, entering command loop");

        while kernel.is_running() {
            match textos::logger::read_byte() {
                Some(byte) => {
                    if let Err(e) = kernel.receive_byte(byte) {
                        log::warn!("console: {}", e);
                    }
                }
                None => ArchCpu::halt(),
            }
        }

        log::info!("stopped, uptime {} ms", TICKS.uptime_ms(TICK_HZ));
        if cfg!(feature = "qemu_exit") {
            exit_qemu(QemuExitCode::Success);
        }
        hlt_loop()
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        ArchCpu::disable_interrupts();
        log::error!("KERNEL PANIC: {}", info);
        if cfg!(feature = "qemu_exit") {
            exit_qemu(QemuExitCode::Failed);
        }
        hlt_loop()
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("textos is a bare-metal kernel; build it with `cargo kbuild` and boot the image.");
}
