//! HC-SR04 ultrasonic ranging and the avoidance policy built on it.
//!
//! The echo pin raises an interrupt on both edges. The handler stamps the
//! edges into an [`EchoMeasurement`]; the main loop triggers a ping, waits
//! (bounded) for the measurement and turns the pulse width into a distance.

use core::cell::Cell;

use critical_section::Mutex;
use embedded_hal::{delay::DelayNs, digital::OutputPin};
use uom::si::{f32::Length, length::centimeter};

use crate::{
    config::{
        ECHO_TIMEOUT, ESCAPE_STOP_MS, ESCAPE_TURN_MS, SLOW_DISTANCE_CM, SLOW_DUTY,
        SPEED_OF_SOUND_CM_PER_US, STOP_DISTANCE_CM, TRIGGER_IDLE_US, TRIGGER_PULSE_US,
    },
    drive::{DriveController, PwmCompare},
    link::CommandLink,
    time::{elapsed, Deadline, Duration, Instant, Monotonic, TICK_HZ},
    Error,
};

#[derive(Clone, Copy, Debug, PartialEq)]
enum EchoState {
    Idle,
    /// Ping sent, waiting for the rising edge.
    Armed,
    Measuring,
    Ready,
    /// Edges beyond the first rising/falling pair.
    Invalid,
}

#[derive(Clone, Copy)]
struct Echo {
    state: EchoState,
    start: Instant,
    end: Instant,
}

impl Echo {
    const IDLE: Echo = Echo {
        state: EchoState::Idle,
        start: Instant::from_ticks(0),
        end: Instant::from_ticks(0),
    };
}

/// Echo edge timestamps, written by the edge interrupt.
pub struct EchoMeasurement {
    echo: Mutex<Cell<Echo>>,
}

impl EchoMeasurement {
    pub const fn new() -> Self {
        Self {
            echo: Mutex::new(Cell::new(Echo::IDLE)),
        }
    }

    /// Drops any previous result and expects a fresh edge pair.
    pub fn arm(&self) {
        critical_section::with(|cs| {
            self.echo.borrow(cs).set(Echo {
                state: EchoState::Armed,
                ..Echo::IDLE
            })
        });
    }

    pub fn is_armed(&self) -> bool {
        critical_section::with(|cs| self.echo.borrow(cs).get().state == EchoState::Armed)
    }

    /// Edge interrupt entry point. `rising` is the echo pin level after
    /// the edge.
    pub fn on_edge(&self, rising: bool, now: Instant) {
        critical_section::with(|cs| {
            let cell = self.echo.borrow(cs);
            let mut echo = cell.get();
            echo.state = match (echo.state, rising) {
                (EchoState::Armed, true) => {
                    echo.start = now;
                    EchoState::Measuring
                }
                // Tail of a pulse that started before the ping.
                (EchoState::Armed, false) => EchoState::Armed,
                (EchoState::Measuring, false) => {
                    echo.end = now;
                    EchoState::Ready
                }
                (EchoState::Measuring, true) | (EchoState::Ready, _) => EchoState::Invalid,
                (state, _) => state,
            };
            cell.set(echo);
        });
    }

    /// Consumes a finished measurement. `None` while still waiting.
    pub fn take(&self) -> Option<Result<Duration, Error>> {
        critical_section::with(|cs| {
            let cell = self.echo.borrow(cs);
            let echo = cell.get();
            let result = match echo.state {
                EchoState::Ready => Ok(elapsed(echo.start, echo.end)),
                EchoState::Invalid => Err(Error::InvalidEcho),
                _ => return None,
            };
            cell.set(Echo::IDLE);
            Some(result)
        })
    }
}

impl Default for EchoMeasurement {
    fn default() -> Self {
        Self::new()
    }
}

/// Distance to the reflector for a round-trip echo time.
pub fn distance(echo: Duration) -> Length {
    let micros = echo.ticks() as f32 * (1_000_000 / TICK_HZ) as f32;
    Length::new::<centimeter>(micros * SPEED_OF_SOUND_CM_PER_US / 2.0)
}

/// Distance in tenths of a centimetre, rounded half up.
pub fn tenths(distance: Length) -> u32 {
    (distance.get::<centimeter>() * 10.0 + 0.5) as u32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ufmt::derive::uDebug)]
pub enum Avoidance {
    /// Closer than 20 cm: stop, then turn right for a while.
    StopAndTurn,
    /// 20 cm up to 30 cm: creep forward.
    Slow,
    Proceed,
}

impl Avoidance {
    pub fn for_distance(distance: Length) -> Self {
        if distance < Length::new::<centimeter>(STOP_DISTANCE_CM) {
            Avoidance::StopAndTurn
        } else if distance < Length::new::<centimeter>(SLOW_DISTANCE_CM) {
            Avoidance::Slow
        } else {
            Avoidance::Proceed
        }
    }
}

pub struct RangeSensor<'a, TRIG, D, C> {
    trigger: TRIG,
    delay: D,
    echo: &'a EchoMeasurement,
    clock: &'a C,
    timeout: Duration,
}

impl<'a, TRIG, D, C> RangeSensor<'a, TRIG, D, C>
where
    TRIG: OutputPin,
    D: DelayNs,
    C: Monotonic,
{
    pub fn new(trigger: TRIG, delay: D, echo: &'a EchoMeasurement, clock: &'a C) -> Self {
        Self {
            trigger,
            delay,
            echo,
            clock,
            timeout: ECHO_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parks the trigger line low. The echo interrupt itself is set up by
    /// the board code.
    pub fn init(&mut self) -> Result<(), Error> {
        self.trigger.set_low().map_err(Error::pin)
    }

    /// Sends one ping and re-arms the echo measurement.
    pub fn trigger(&mut self) -> Result<(), Error> {
        self.trigger.set_low().map_err(Error::pin)?;
        self.delay.delay_us(TRIGGER_IDLE_US);

        self.trigger.set_high().map_err(Error::pin)?;
        self.delay.delay_us(TRIGGER_PULSE_US);

        self.trigger.set_low().map_err(Error::pin)?;
        self.echo.arm();
        Ok(())
    }

    pub fn wait_for_echo(&mut self) -> Result<Duration, Error> {
        let deadline = Deadline::start(self.clock, self.timeout);
        loop {
            match self.echo.take() {
                Some(result) => return result,
                None if deadline.expired() => return Err(Error::NoEcho),
                None => {}
            }
        }
    }

    pub fn measure(&mut self) -> Result<Length, Error> {
        self.trigger()?;
        let echo = self.wait_for_echo()?;
        Ok(distance(echo))
    }

    /// One trigger, measure, react cycle. Meant to be called repeatedly.
    pub fn avoid_obstacle<P, PC, TX, LC>(
        &mut self,
        drive: &mut DriveController<P, PC>,
        link: &mut CommandLink<'_, TX, LC>,
    ) -> Result<Avoidance, Error>
    where
        P: OutputPin,
        PC: PwmCompare,
        TX: embedded_hal_nb::serial::Write<u8>,
        LC: Monotonic,
    {
        let distance = self.measure()?;
        let shown = tenths(distance);
        link.send_formatted(|buf| ufmt::uwrite!(buf, "距离: {}.{} cm\n", shown / 10, shown % 10))?;

        let avoidance = Avoidance::for_distance(distance);
        match avoidance {
            Avoidance::StopAndTurn => {
                drive.stop()?;
                self.delay.delay_ms(ESCAPE_STOP_MS);
                drive.turn_right()?;
                self.delay.delay_ms(ESCAPE_TURN_MS);
            }
            Avoidance::Slow => drive.set_speeds(SLOW_DUTY, SLOW_DUTY)?,
            Avoidance::Proceed => drive.forward()?,
        }
        Ok(avoidance)
    }
}
