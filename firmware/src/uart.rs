//! USART0 driven straight through its registers: the receive interrupt
//! feeds [`RX_LATCH`], the main loop owns the transmit side.

use core::convert::Infallible;

use arduino_hal::pac::USART0;
use embedded_hal_nb::serial;
use smartcar::{config::UART_BAUD, ReceiveLatch};

pub static RX_LATCH: ReceiveLatch = ReceiveLatch::new();

/// UBRR for normal (16x) speed at 16 MHz.
const UBRR: u16 = (16_000_000 / (16 * UART_BAUD) - 1) as u16;

pub struct Uart0 {
    usart: USART0,
}

impl Uart0 {
    /// 8N1, receiver and transmitter on, receive interrupt enabled.
    pub fn new(usart: USART0) -> Self {
        usart.ubrr0.write(|w| w.bits(UBRR));
        usart.ucsr0a.write(|w| w.u2x0().clear_bit());
        usart.ucsr0c.write(|w| w.ucsz0().chr8());
        usart
            .ucsr0b
            .write(|w| w.rxen0().set_bit().txen0().set_bit().rxcie0().set_bit());
        Self { usart }
    }
}

impl serial::ErrorType for Uart0 {
    type Error = Infallible;
}

impl serial::Write<u8> for Uart0 {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.usart.ucsr0a.read().udre0().bit_is_clear() {
            return Err(nb::Error::WouldBlock);
        }
        self.usart.udr0.write(|w| w.bits(word));
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        if self.usart.ucsr0a.read().udre0().bit_is_clear() {
            return Err(nb::Error::WouldBlock);
        }
        Ok(())
    }
}

#[avr_device::interrupt(atmega328p)]
fn USART_RX() {
    // Safety: the data register is only read here
    let byte = unsafe { &*USART0::ptr() }.udr0.read().bits();
    RX_LATCH.store(byte);
}
