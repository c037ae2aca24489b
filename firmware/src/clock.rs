use core::{
    cell::Cell,
    sync::atomic::{AtomicU8, Ordering},
};

use arduino_hal::pac::{tc0::tccr0b::CS0_A, TC0};
use avr_device::interrupt::Mutex;
use const_assert::{Assert, IsTrue};
use smartcar::time::{Instant, Monotonic, TICK_HZ};

pub static CLOCK: Clock<40, 8> = Clock::new();

const fn prescale_from_value<const PRESCALE: u32>() -> CS0_A {
    match PRESCALE {
        0 => CS0_A::NO_CLOCK,
        1 => CS0_A::DIRECT,
        8 => CS0_A::PRESCALE_8,
        64 => CS0_A::PRESCALE_64,
        256 => CS0_A::PRESCALE_256,
        1024 => CS0_A::PRESCALE_1024,
        _ => panic!("Invalid prescale value"),
    }
}

/// Timer0 compare match tick counter.
///
/// interrupt frequency (Hz) = (16,000,000Hz) / (prescaler * (compare match register + 1))
/// TOP = [ 16MHz / (PRESCALER * FREQ)] - 1
///
/// Ticks are collected in `part` and folded into the 32 bit `counter`
/// every 251 ticks, so most interrupts only touch one byte.
pub struct Clock<const KHZ: u32, const PRESCALE: u32> {
    part: AtomicU8,
    counter: Mutex<Cell<u32>>,
}

impl<const KHZ: u32, const PRESCALE: u32> Clock<KHZ, PRESCALE>
where
    // Assert, at compile time, this fits into a u8
    Assert<{ (16_000_000 / (PRESCALE * KHZ * 1_000)) - 1 < 256 }>: IsTrue,
    // and that it runs at the rate the library counts in.
    Assert<{ KHZ * 1_000 == TICK_HZ }>: IsTrue,
{
    pub const FREQ: u32 = KHZ * 1_000;
    const TOP: u8 = ((16_000_000 / (PRESCALE * Self::FREQ)) - 1) as u8;

    pub const fn new() -> Self {
        Self {
            part: AtomicU8::new(0),
            counter: Mutex::new(Cell::new(0)),
        }
    }

    pub fn start(&self, tc0: TC0) {
        // Configure the timer for the above interval (in CTC mode)
        tc0.tccr0a.write(|w| w.wgm0().ctc());
        tc0.ocr0a.write(|w| w.bits(Self::TOP));
        tc0.tccr0b
            .write(|w| w.cs0().variant(prescale_from_value::<PRESCALE>()));

        // Enable Interrupt
        tc0.timsk0.write(|w| w.ocie0a().set_bit());
    }

    pub fn ticks(&self) -> u32 {
        avr_device::interrupt::free(|cs| {
            self.counter
                .borrow(cs)
                .get()
                .wrapping_add(self.part.load(Ordering::SeqCst) as u32)
        })
    }

    fn tick(&self) {
        avr_device::interrupt::free(|cs| {
            let part = self.part.load(Ordering::SeqCst) + 1;
            if part > 250 {
                self.part.store(0, Ordering::SeqCst);
                let counter = self.counter.borrow(cs);
                counter.set(counter.get().wrapping_add(part as u32));
            } else {
                self.part.store(part, Ordering::SeqCst);
            }
        });
    }
}

impl<const KHZ: u32, const PRESCALE: u32> Monotonic for Clock<KHZ, PRESCALE>
where
    Assert<{ (16_000_000 / (PRESCALE * KHZ * 1_000)) - 1 < 256 }>: IsTrue,
    Assert<{ KHZ * 1_000 == TICK_HZ }>: IsTrue,
{
    fn now(&self) -> Instant {
        Instant::from_ticks(self.ticks())
    }
}

#[avr_device::interrupt(atmega328p)]
fn TIMER0_COMPA() {
    CLOCK.tick();
}
