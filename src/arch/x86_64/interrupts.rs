//! Interrupt Descriptor Table (IDT)
//!
//! 例外ハンドラと、PIC からのハードウェア割り込み (ベクタ 32..=47) を
//! 設定します。ハードウェア割り込みはすべて [`DISPATCHER`] に配送した後、
//! PIC に EOI を送ります。

use crate::arch::x86_64::gdt;
use crate::arch::x86_64::pic::ChainedPics;
use crate::arch::x86_64::port::HardwarePorts;
use crate::arch::{ArchCpu, Cpu};
use crate::constants::{IRQ_LINES, PIC_1_OFFSET, PIC_2_OFFSET, TIMER_IRQ};
use crate::kernel::driver::irq::{InterruptContext, InterruptDispatcher};
use lazy_static::lazy_static;
use spin::Mutex;
use x86_64::structures::idt::{InterruptDescriptorTable, InterruptStackFrame};

/// IRQ ライン → ハンドラ
pub static DISPATCHER: InterruptDispatcher = InterruptDispatcher::new();

/// チェーン接続された 8259 PIC
///
/// 割り込みハンドラからもロックするため、割り込み禁止区間の外で
/// ロックしないこと。
// SAFETY: PIC のポートはこのインスタンスだけが操作する
pub static PICS: Mutex<ChainedPics<HardwarePorts>> = Mutex::new(ChainedPics::new(
    unsafe { HardwarePorts::new() },
    PIC_1_OFFSET,
    PIC_2_OFFSET,
));

type IrqStub = extern "x86-interrupt" fn(InterruptStackFrame);

macro_rules! irq_stubs {
    ($($name:ident => $irq:expr),* $(,)?) => {
        $(
            extern "x86-interrupt" fn $name(_stack_frame: InterruptStackFrame) {
                handle_irq($irq);
            }
        )*

        const IRQ_STUBS: [IrqStub; IRQ_LINES] = [$($name),*];
    };
}

irq_stubs! {
    irq0 => 0, irq1 => 1, irq2 => 2, irq3 => 3,
    irq4 => 4, irq5 => 5, irq6 => 6, irq7 => 7,
    irq8 => 8, irq9 => 9, irq10 => 10, irq11 => 11,
    irq12 => 12, irq13 => 13, irq14 => 14, irq15 => 15,
}

lazy_static! {
    static ref IDT: InterruptDescriptorTable = {
        let mut idt = InterruptDescriptorTable::new();
        idt.breakpoint.set_handler_fn(breakpoint_handler);
        // SAFETY: IST インデックスは gdt::init で設定した TSS のエントリ
        unsafe {
            idt.double_fault
                .set_handler_fn(double_fault_handler)
                .set_stack_index(gdt::DOUBLE_FAULT_IST_INDEX);
        }
        for (irq, stub) in (0u8..).zip(IRQ_STUBS) {
            idt[PIC_1_OFFSET + irq].set_handler_fn(stub);
        }
        idt
    };
}

/// IDT をロード
pub fn init_idt() {
    IDT.load();
}

/// PIC をリマップし、タイマー割り込みだけを許可
pub fn init_pics() {
    ArchCpu::without_interrupts(|| {
        let mut pics = PICS.lock();
        pics.initialize();
        pics.unmask_irq(TIMER_IRQ);
    });
}

fn handle_irq(irq: u8) {
    let vector = PIC_1_OFFSET + irq;
    DISPATCHER.dispatch(irq, &InterruptContext::new(irq, vector));
    PICS.lock().notify_end_of_interrupt(vector);
}

extern "x86-interrupt" fn breakpoint_handler(stack_frame: InterruptStackFrame) {
    log::warn!("EXCEPTION: BREAKPOINT\n{:#?}", stack_frame);
}

extern "x86-interrupt" fn double_fault_handler(
    stack_frame: InterruptStackFrame,
    _error_code: u64,
) -> ! {
    ArchCpu::disable_interrupts();
    log::error!("EXCEPTION: DOUBLE FAULT\n{:#?}", stack_frame);
    loop {
        ArchCpu::halt();
    }
}
