//! Timer1 in fast PWM mode 14 (TOP = ICR1), both compare outputs inverting.
//! OC1A (d9) drives the left motor, OC1B (d10) the right one.

use arduino_hal::{
    hal::port::{PB1, PB2},
    pac::TC1,
    port::{mode::Output, Pin},
};
use smartcar::{config::PWM_PERIOD, PwmCompare};

#[derive(Clone, Copy)]
enum Channel {
    A,
    B,
}

pub struct Timer1Channel {
    channel: Channel,
}

/// Starts the timer and hands out its two compare channels. The pins are
/// taken so nothing else drives them.
pub fn start_timer1(
    tc1: TC1,
    _d9: Pin<Output, PB1>,
    _d10: Pin<Output, PB2>,
) -> (Timer1Channel, Timer1Channel) {
    tc1.icr1.write(|w| w.bits(PWM_PERIOD - 1));
    tc1.ocr1a.write(|w| w.bits(PWM_PERIOD - 1));
    tc1.ocr1b.write(|w| w.bits(PWM_PERIOD - 1));
    tc1.tccr1a.write(|w| {
        w.wgm1()
            .bits(0b10)
            .com1a()
            .match_set()
            .com1b()
            .match_set()
    });
    tc1.tccr1b.write(|w| w.wgm1().bits(0b11).cs1().direct());

    (
        Timer1Channel {
            channel: Channel::A,
        },
        Timer1Channel {
            channel: Channel::B,
        },
    )
}

fn timer1() -> &'static arduino_hal::pac::tc1::RegisterBlock {
    // Safety: the timer was configured in `start_timer1`, each channel only
    // writes its own compare register.
    unsafe { &*TC1::ptr() }
}

impl PwmCompare for Timer1Channel {
    fn set_compare(&mut self, value: u16) {
        match self.channel {
            Channel::A => timer1().ocr1a.write(|w| w.bits(value)),
            Channel::B => timer1().ocr1b.write(|w| w.bits(value)),
        }
    }
}
