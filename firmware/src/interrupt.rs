use arduino_hal::{
    hal::port::PD3,
    pac::{EXINT, PORTD},
    port::{mode::Input, Pin},
};
use smartcar::{time::Monotonic, EchoMeasurement};

use crate::clock::CLOCK;

/// Echo pulse edges seen on INT1 (d3).
pub static ECHO: EchoMeasurement = EchoMeasurement::new();

/// Sense control values for EICRA.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtIntMode {
    Change = 0x1,
}

pub trait AttachHwInterrupt {
    fn attach_hw_int(&self, exint: &EXINT, mode: ExtIntMode);
}

impl<MODE> AttachHwInterrupt for Pin<Input<MODE>, PD3> {
    fn attach_hw_int(&self, exint: &EXINT, mode: ExtIntMode) {
        exint.eicra.modify(|_, w| w.isc1().bits(mode as u8));
        exint.eimsk.modify(|_, w| w.int1().set_bit());
    }
}

#[avr_device::interrupt(atmega328p)]
fn INT1() {
    let now = CLOCK.now();
    // Safety: read only access to the input register
    let high = unsafe { &*PORTD::ptr() }.pind.read().bits() & (1 << 3) != 0;
    ECHO.on_edge(high, now);
}
