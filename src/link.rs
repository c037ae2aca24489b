//! Byte oriented command channel to the Bluetooth module.
//!
//! Receiving happens in the UART interrupt, which drops every byte into a
//! [`ReceiveLatch`]. Sending is polled from the main loop, one byte at a
//! time, with a bound on how long the transmitter may stay busy.

use embedded_hal::digital::OutputPin;
use embedded_hal_nb::serial::Write;
use heapless::String;

use crate::{
    command::{Command, ReceiveLatch},
    config::{FORMAT_BUFFER_LEN, READY_BANNER, TX_TIMEOUT},
    drive::{DriveController, PwmCompare},
    time::{Deadline, Duration, Monotonic},
    Error,
};

/// Renders into a [`CommandLink`] the way `uwrite!` does, but all or
/// nothing: text longer than the format buffer is dropped and reported as
/// [`Error::Overflow`].
#[macro_export]
macro_rules! send_formatted {
    ($link:expr, $($arg:tt)*) => {
        $link.send_formatted(|buf| ufmt::uwrite!(buf, $($arg)*))
    };
}

pub struct CommandLink<'a, TX, C> {
    tx: TX,
    latch: &'a ReceiveLatch,
    clock: &'a C,
    timeout: Duration,
}

impl<'a, TX, C> CommandLink<'a, TX, C>
where
    TX: Write<u8>,
    C: Monotonic,
{
    pub fn new(tx: TX, latch: &'a ReceiveLatch, clock: &'a C) -> Self {
        Self {
            tx,
            latch,
            clock,
            timeout: TX_TIMEOUT,
        }
    }

    /// How long a single byte may wait for the transmitter.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables the motor driver and announces readiness.
    pub fn init<P, PC>(&mut self, drive: &mut DriveController<P, PC>) -> Result<(), Error>
    where
        P: OutputPin,
        PC: PwmCompare,
    {
        drive.motor_on()?;
        self.send_str(READY_BANNER)
    }

    pub fn send_byte(&mut self, byte: u8) -> Result<(), Error> {
        let deadline = Deadline::start(self.clock, self.timeout);
        loop {
            match self.tx.write(byte) {
                Ok(()) => return Ok(()),
                Err(nb::Error::WouldBlock) if deadline.expired() => return Err(Error::TxTimeout),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(err)) => return Err(Error::serial(err)),
            }
        }
    }

    pub fn send_array(&mut self, bytes: &[u8]) -> Result<(), Error> {
        bytes.iter().try_for_each(|&byte| self.send_byte(byte))
    }

    /// Sends the UTF-8 bytes of `text`, nothing else.
    pub fn send_str(&mut self, text: &str) -> Result<(), Error> {
        self.send_array(text.as_bytes())
    }

    /// Exactly `width` decimal digits, most significant first. Zero padded
    /// on the left; higher digits that do not fit are cut off.
    pub fn send_number(&mut self, number: u32, width: u8) -> Result<(), Error> {
        for position in (0..width as u32).rev() {
            let digit = match 10u32.checked_pow(position) {
                Some(divisor) => number / divisor % 10,
                None => 0,
            };
            self.send_byte(b'0' + digit as u8)?;
        }
        Ok(())
    }

    /// Renders into a fixed buffer first, so an overlong message is never
    /// sent half way.
    pub fn send_formatted<F, E>(&mut self, render: F) -> Result<(), Error>
    where
        F: FnOnce(&mut String<FORMAT_BUFFER_LEN>) -> Result<(), E>,
    {
        let mut buf = String::new();
        render(&mut buf).map_err(|_| Error::Overflow)?;
        self.send_str(&buf)
    }

    /// The latest received byte, if one arrived since the last poll.
    pub fn poll_command(&mut self) -> Option<Command> {
        self.latch.take().map(Command::from)
    }

    pub fn transmitter_mut(&mut self) -> &mut TX {
        &mut self.tx
    }
}

impl<TX, C> ufmt::uWrite for CommandLink<'_, TX, C>
where
    TX: Write<u8>,
    C: Monotonic,
{
    type Error = Error;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.send_str(s)
    }
}
