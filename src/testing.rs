//! Host-side stand-ins for the board peripherals.

use std::{
    cell::{Cell, RefCell},
    convert::Infallible,
    rc::Rc,
};

use embedded_hal::digital::{self, OutputPin};
use embedded_hal_nb::serial;

use crate::{
    drive::PwmCompare,
    hc_sr04::EchoMeasurement,
    time::{Duration, Instant, Monotonic},
};

/// Output pin whose level can be inspected through any clone.
#[derive(Clone, Default)]
pub struct LevelPin(Rc<Cell<bool>>);

impl LevelPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.0.get()
    }
}

impl digital::ErrorType for LevelPin {
    type Error = Infallible;
}

impl OutputPin for LevelPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(true);
        Ok(())
    }
}

/// Records every compare value written.
#[derive(Clone, Default)]
pub struct CompareLog(Rc<RefCell<Vec<u16>>>);

impl CompareLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<u16> {
        self.0.borrow().clone()
    }

    pub fn last(&self) -> Option<u16> {
        self.0.borrow().last().copied()
    }
}

impl PwmCompare for CompareLog {
    fn set_compare(&mut self, value: u16) {
        self.0.borrow_mut().push(value);
    }
}

/// Advances one tick every time it is read.
#[derive(Default)]
pub struct StepClock {
    ticks: Cell<u32>,
}

impl StepClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ticks: u32) -> Self {
        Self {
            ticks: Cell::new(ticks),
        }
    }
}

impl Monotonic for StepClock {
    fn now(&self) -> Instant {
        let ticks = self.ticks.get();
        self.ticks.set(ticks.wrapping_add(1));
        Instant::from_ticks(ticks)
    }
}

/// Step clock that plays the echo interrupt: the first read after the
/// sensor arms raises the echo, and the falling edge is delivered once the
/// clock has advanced by the configured pulse width.
pub struct EchoClock<'a> {
    clock: StepClock,
    echo: &'a EchoMeasurement,
    pulse: Cell<Option<u32>>,
    falling: Cell<Option<Instant>>,
}

impl<'a> EchoClock<'a> {
    pub fn new(echo: &'a EchoMeasurement) -> Self {
        Self {
            clock: StepClock::new(),
            echo,
            pulse: Cell::new(None),
            falling: Cell::new(None),
        }
    }

    /// Pulse width in ticks, `None` for a silent sensor.
    pub fn set_pulse(&self, ticks: Option<u32>) {
        self.pulse.set(ticks);
    }
}

impl Monotonic for EchoClock<'_> {
    fn now(&self) -> Instant {
        let now = self.clock.now();
        if let Some(falling) = self.falling.get() {
            if now.ticks() >= falling.ticks() {
                self.falling.set(None);
                self.echo.on_edge(false, falling);
            }
        } else if let Some(ticks) = self.pulse.get() {
            if self.echo.is_armed() {
                self.echo.on_edge(true, now);
                self.falling.set(Some(now + Duration::from_ticks(ticks)));
            }
        }
        now
    }
}

/// Transmitter that reports busy `stall` times before accepting each byte.
/// `None` keeps it busy forever.
#[derive(Clone)]
pub struct SerialSink {
    sent: Rc<RefCell<Vec<u8>>>,
    stall: Option<u32>,
    pending: u32,
}

impl SerialSink {
    pub fn new() -> Self {
        Self::stalling(Some(0))
    }

    pub fn stalling(stall: Option<u32>) -> Self {
        Self {
            sent: Rc::default(),
            stall,
            pending: stall.unwrap_or(0),
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.sent.borrow().clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.bytes()).unwrap()
    }
}

impl serial::ErrorType for SerialSink {
    type Error = Infallible;
}

impl serial::Write<u8> for SerialSink {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        let Some(stall) = self.stall else {
            return Err(nb::Error::WouldBlock);
        };
        if self.pending > 0 {
            self.pending -= 1;
            return Err(nb::Error::WouldBlock);
        }
        self.sent.borrow_mut().push(word);
        self.pending = stall;
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}
