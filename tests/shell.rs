//! Command loop: banner, echo, `PAGE` and `END`.

use textos::constants::{MAX_ROWS, PIC_1_OFFSET, REG_SCREEN_CTRL, REG_SCREEN_DATA, TIMER_IRQ};
use textos::kernel::Kernel;
use textos::kernel::driver::port::SimulatedPorts;
use textos::kernel::driver::{InterruptContext, InterruptDispatcher, TickCounter};
use textos::kernel::mm::{LockedHeap, OffsetTranslator, PageAllocator, init_heap};
use textos::vga_buffer::{ConsoleConfig, MemoryBuffer, TextConsole, get_offset};

type TestKernel = Kernel<SimulatedPorts, MemoryBuffer, OffsetTranslator>;

fn kernel() -> TestKernel {
    kernel_with(Box::leak(Box::new(TickCounter::new())))
}

fn kernel_with(ticks: &'static TickCounter) -> TestKernel {
    let heap: &'static LockedHeap = Box::leak(Box::new(LockedHeap::empty()));
    let arena: &'static mut [u8] = Box::leak(vec![0u8; 64 * 1024].into_boxed_slice());
    unsafe { init_heap(heap, arena.as_mut_ptr(), arena.len()) }.unwrap();

    let ports = SimulatedPorts::new().with_indexed_pair(REG_SCREEN_CTRL, REG_SCREEN_DATA);
    let console = TextConsole::new(MemoryBuffer::new(), ports, ConsoleConfig::new());
    Kernel::new(
        console,
        ticks,
        PageAllocator::new(heap, OffsetTranslator::identity()),
    )
}

fn booted() -> TestKernel {
    let mut kernel = kernel();
    kernel.boot().unwrap();
    kernel
}

fn row(kernel: &TestKernel, row: usize) -> String {
    kernel.console().buffer().row_text(row)
}

fn type_line(kernel: &mut TestKernel, text: &str) {
    for byte in text.bytes() {
        kernel.receive_byte(byte).unwrap();
    }
    kernel.receive_byte(b'\r').unwrap();
}

#[test]
fn test_boot_prints_banner_and_prompt() {
    let mut kernel = booted();
    assert!(kernel.is_running());
    assert_eq!(
        row(&kernel, 0),
        "Type something, it will go through the kernel! (END to stop)"
    );
    assert_eq!(row(&kernel, 1), ">");
    assert_eq!(kernel.console_mut().cursor_offset(), get_offset(1, 1));
}

#[test]
fn test_other_input_is_echoed() {
    let mut kernel = booted();
    kernel.handle_input("hello").unwrap();

    assert_eq!(row(&kernel, 1), ">You said: hello");
    assert_eq!(row(&kernel, 2), ">");
    assert!(kernel.is_running());
}

#[test]
fn test_typed_line_is_echoed_then_handled() {
    let mut kernel = booted();
    type_line(&mut kernel, "hi there");

    assert_eq!(row(&kernel, 1), ">hi there");
    assert_eq!(row(&kernel, 2), "You said: hi there");
    assert_eq!(row(&kernel, 3), ">");
}

#[test]
fn test_backspace_while_typing() {
    let mut kernel = booted();
    for byte in *b"abx" {
        kernel.receive_byte(byte).unwrap();
    }
    kernel.receive_byte(0x7f).unwrap();
    assert_eq!(row(&kernel, 1), ">ab");

    kernel.receive_byte(b'c').unwrap();
    kernel.receive_byte(b'\n').unwrap();
    assert_eq!(row(&kernel, 2), "You said: abc");
}

#[test]
fn test_backspace_on_empty_line_keeps_prompt() {
    let mut kernel = booted();
    kernel.receive_byte(0x08).unwrap();
    assert_eq!(row(&kernel, 1), ">");
    assert_eq!(kernel.console_mut().cursor_offset(), get_offset(1, 1));
}

#[test]
fn test_end_clears_and_stops() {
    let mut kernel = booted();
    kernel.handle_input("something").unwrap();
    kernel.handle_input("END").unwrap();

    assert!(!kernel.is_running());
    assert_eq!(row(&kernel, 0), "Stopping... Bye!");
    for r in 1..MAX_ROWS {
        assert_eq!(row(&kernel, r), "");
    }
    assert_eq!(kernel.console_mut().cursor_offset(), get_offset(0, 1));
}

#[test]
fn test_end_must_match_exactly() {
    let mut kernel = booted();
    kernel.handle_input("end").unwrap();
    kernel.handle_input("END ").unwrap();
    assert!(kernel.is_running());
    assert_eq!(row(&kernel, 1), ">You said: end");
}

#[test]
fn test_page_prints_addresses_then_echoes() {
    let mut kernel = booted();
    let free = kernel.allocator().free_bytes();
    kernel.handle_input("PAGE").unwrap();

    let line = row(&kernel, 1);
    let rest = line.strip_prefix(">Page: 0x").unwrap();
    let (virt, phys) = rest.split_once(", physical address: 0x").unwrap();
    let virt = u64::from_str_radix(virt, 16).unwrap();
    let phys = u64::from_str_radix(phys, 16).unwrap();
    assert_eq!(virt % 4096, 0);
    assert_eq!(virt, phys);

    assert_eq!(row(&kernel, 2), "You said: PAGE");
    assert_eq!(row(&kernel, 3), ">");
    assert!(kernel.allocator().free_bytes() < free);
}

#[test]
fn test_ticks_are_visible_through_the_kernel() {
    static TICKS: TickCounter = TickCounter::new();
    let dispatcher = InterruptDispatcher::new();
    dispatcher.register(TIMER_IRQ, &TICKS).unwrap();

    let mut kernel = kernel_with(&TICKS);
    kernel.boot().unwrap();
    assert_eq!(kernel.ticks(), 0);

    let ctx = InterruptContext::new(TIMER_IRQ, PIC_1_OFFSET + TIMER_IRQ);
    for _ in 0..25 {
        assert!(dispatcher.dispatch(TIMER_IRQ, &ctx));
    }
    assert_eq!(kernel.ticks(), 25);

    kernel.handle_input("END").unwrap();
    assert_eq!(kernel.ticks(), 25);
}
