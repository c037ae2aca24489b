//! Bit-banged 8N1 serial on two plain GPIO pins.
//!
//! Timing comes from a blocking delay, so every call stalls the caller for
//! the whole frame and interrupts stretch the bit cells. Good enough for a
//! 9600 baud module when the hardware UART is taken.

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use embedded_hal_nb::serial;

use crate::{
    config::START_BIT_TIMEOUT,
    time::{Deadline, Duration, Monotonic},
    Error,
};

pub struct SoftSerial<'a, TXP, RXP, D, C> {
    tx: TXP,
    rx: RXP,
    delay: D,
    clock: &'a C,
    bit_us: u32,
    start_timeout: Duration,
}

impl<'a, TXP, RXP, D, C> SoftSerial<'a, TXP, RXP, D, C>
where
    TXP: OutputPin,
    RXP: InputPin,
    D: DelayNs,
    C: Monotonic,
{
    pub fn new(tx: TXP, rx: RXP, delay: D, clock: &'a C, baud: u32) -> Self {
        Self {
            tx,
            rx,
            delay,
            clock,
            bit_us: 1_000_000 / baud,
            start_timeout: START_BIT_TIMEOUT,
        }
    }

    /// How long [`Self::receive_byte`] waits for a start bit.
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    pub fn bit_period_us(&self) -> u32 {
        self.bit_us
    }

    /// Drives the line to its idle (mark) level.
    pub fn init(&mut self) -> Result<(), Error> {
        self.tx.set_high().map_err(Error::pin)
    }

    /// Start bit, eight data bits LSB first, stop bit.
    pub fn send_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.tx.set_low().map_err(Error::pin)?;
        self.delay.delay_us(self.bit_us);

        for bit in 0..8 {
            if byte >> bit & 1 == 1 {
                self.tx.set_high().map_err(Error::pin)?;
            } else {
                self.tx.set_low().map_err(Error::pin)?;
            }
            self.delay.delay_us(self.bit_us);
        }

        self.tx.set_high().map_err(Error::pin)?;
        self.delay.delay_us(self.bit_us);
        Ok(())
    }

    /// Waits for a start bit, then samples one frame.
    pub fn receive_byte(&mut self) -> Result<u8, Error> {
        let deadline = Deadline::start(self.clock, self.start_timeout);
        while self.rx.is_high().map_err(Error::pin)? {
            if deadline.expired() {
                return Err(Error::RxTimeout);
            }
        }
        self.sample_frame()
    }

    /// Called right after the falling edge of the start bit. Data bits are
    /// sampled at their centres; the stop bit is waited out, not checked.
    fn sample_frame(&mut self) -> Result<u8, Error> {
        self.delay.delay_us(self.bit_us / 2);

        let mut byte = 0;
        for bit in 0..8 {
            self.delay.delay_us(self.bit_us);
            if self.rx.is_high().map_err(Error::pin)? {
                byte |= 1 << bit;
            }
        }

        self.delay.delay_us(self.bit_us);
        Ok(byte)
    }
}

impl<TXP, RXP, D, C> serial::ErrorType for SoftSerial<'_, TXP, RXP, D, C> {
    type Error = Error;
}

impl<TXP, RXP, D, C> serial::Read<u8> for SoftSerial<'_, TXP, RXP, D, C>
where
    TXP: OutputPin,
    RXP: InputPin,
    D: DelayNs,
    C: Monotonic,
{
    /// `WouldBlock` while the line idles; once a start bit is seen the
    /// whole frame is read before returning.
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.rx.is_high().map_err(Error::pin)? {
            return Err(nb::Error::WouldBlock);
        }
        Ok(self.sample_frame()?)
    }
}

impl<TXP, RXP, D, C> serial::Write<u8> for SoftSerial<'_, TXP, RXP, D, C>
where
    TXP: OutputPin,
    RXP: InputPin,
    D: DelayNs,
    C: Monotonic,
{
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        Ok(self.send_byte(word)?)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}
