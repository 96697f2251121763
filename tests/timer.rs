//! PIT programming and tick counting through the interrupt dispatcher.

use std::num::NonZeroU32;
use textos::constants::{PIT_CHANNEL0_DATA, PIT_COMMAND, TIMER_IRQ};
use textos::kernel::driver::{
    InterruptContext, InterruptDispatcher, PortAccess, ProgrammableIntervalTimer, SimulatedPorts,
    TickCounter,
};

fn hz(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

fn leak_counter() -> &'static TickCounter {
    Box::leak(Box::new(TickCounter::new()))
}

#[test]
fn test_init_100hz_port_sequence() {
    let dispatcher = InterruptDispatcher::new();
    let mut pit = ProgrammableIntervalTimer::new(SimulatedPorts::new());
    pit.init(&dispatcher, leak_counter(), hz(100)).unwrap();

    assert_eq!(
        pit.ports().log(),
        &[
            PortAccess::Write { port: PIT_COMMAND, value: 0x36 },
            PortAccess::Write { port: PIT_CHANNEL0_DATA, value: 0x9b },
            PortAccess::Write { port: PIT_CHANNEL0_DATA, value: 0x2e },
        ]
    );
}

#[test]
fn test_n_interrupts_advance_counter_by_n() {
    let dispatcher = InterruptDispatcher::new();
    let ticks = leak_counter();
    let mut pit = ProgrammableIntervalTimer::new(SimulatedPorts::new());
    pit.init(&dispatcher, ticks, hz(50)).unwrap();

    let ctx = InterruptContext::new(TIMER_IRQ, 32);
    let before = ticks.get();
    for _ in 0..1234 {
        assert!(dispatcher.dispatch(TIMER_IRQ, &ctx));
    }
    assert_eq!(ticks.get(), before.wrapping_add(1234));

    // Other lines leave the counter alone
    assert!(!dispatcher.dispatch(1, &InterruptContext::new(1, 33)));
    assert_eq!(ticks.get(), before.wrapping_add(1234));
}

#[test]
fn test_tick_callback_does_no_port_io() {
    let dispatcher = InterruptDispatcher::new();
    let mut pit = ProgrammableIntervalTimer::new(SimulatedPorts::new());
    pit.init(&dispatcher, leak_counter(), hz(100)).unwrap();
    let writes = pit.ports().log().len();

    dispatcher.dispatch(TIMER_IRQ, &InterruptContext::new(TIMER_IRQ, 32));
    assert_eq!(pit.ports().log().len(), writes);
}

#[test]
fn test_counter_increments_from_many_threads() {
    let ticks = leak_counter();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    ticks.tick();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(ticks.get(), 4000);
}
