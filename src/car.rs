use embedded_hal::{delay::DelayNs, digital::OutputPin};
use embedded_hal_nb::serial::Write;

use crate::{
    command::Command,
    drive::{DriveController, PwmCompare},
    hc_sr04::{Avoidance, RangeSensor},
    link::CommandLink,
    time::Monotonic,
    Error,
};

mod builder;

pub use builder::{Builder, Drive, Link, NoDrive, NoLink, NoRangeSensor, Sensor};

/// What the car is doing, derived from the duties last applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ufmt::derive::uDebug)]
pub enum Mode {
    Idle,
    Driving,
}

pub struct SmartCar<'a, P, PC, TX, C, TRIG, D> {
    drive: DriveController<P, PC>,
    link: CommandLink<'a, TX, C>,
    sensor: RangeSensor<'a, TRIG, D, C>,
    /// Last command that moved the motors.
    last_command: Option<Command>,
}

impl SmartCar<'_, (), (), (), (), (), ()> {
    pub fn builder() -> Builder<NoDrive, NoLink, NoRangeSensor> {
        Builder::default()
    }
}

impl<'a, P, PC, TX, C, TRIG, D> SmartCar<'a, P, PC, TX, C, TRIG, D>
where
    P: OutputPin,
    PC: PwmCompare,
    TX: Write<u8>,
    C: Monotonic,
    TRIG: OutputPin,
    D: DelayNs,
{
    /// Brings the driver out of standby, parks the trigger pin and sends
    /// the ready banner.
    pub fn init(&mut self) -> Result<(), Error> {
        self.sensor.init()?;
        self.link.init(&mut self.drive)
    }

    /// One dispatch cycle. Applies the pending command, if any, and echoes
    /// its confirmation; unknown bytes only get the error reply.
    pub fn handle_command(&mut self) -> Result<Option<Command>, Error> {
        let Some(command) = self.link.poll_command() else {
            return Ok(None);
        };
        if let Some(maneuver) = command.maneuver() {
            self.drive.apply(maneuver)?;
            self.last_command = Some(command);
        }
        self.link.send_str(command.reply())?;
        Ok(Some(command))
    }

    pub fn avoid_obstacle(&mut self) -> Result<Avoidance, Error> {
        self.sensor.avoid_obstacle(&mut self.drive, &mut self.link)
    }

    /// Prints `err` on the link. A failing link is not reported again.
    pub fn report(&mut self, err: Error) {
        ufmt::uwriteln!(&mut self.link, "错误: {:?}", err).ok();
    }

    pub fn mode(&self) -> Mode {
        if self.drive.state().is_idle() {
            Mode::Idle
        } else {
            Mode::Driving
        }
    }

    /// The last command that selected a maneuver. Unknown bytes and
    /// avoidance cycles leave it alone.
    pub fn last_command(&self) -> Option<Command> {
        self.last_command
    }

    /// True after a Forward command, the only maneuver avoidance may
    /// override.
    pub fn wants_avoidance(&self) -> bool {
        self.last_command == Some(Command::Forward) && self.mode() == Mode::Driving
    }

    pub fn drive(&self) -> &DriveController<P, PC> {
        &self.drive
    }

    pub fn link_mut(&mut self) -> &mut CommandLink<'a, TX, C> {
        &mut self.link
    }
}
