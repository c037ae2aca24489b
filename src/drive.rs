//! Differential drive on a dual H-bridge (TB6612 style: two direction pins
//! per side, one PWM input per side, a shared standby pin).

use embedded_hal::digital::OutputPin;

use crate::{
    config::{CRUISE_DUTY, MAX_COMPARE, TURN_INNER_DUTY},
    Error,
};

/// Output compare channel feeding one motor's PWM input.
///
/// The timer runs in inverting mode, so a lower compare value means a
/// longer on-time.
pub trait PwmCompare {
    fn set_compare(&mut self, value: u16);
}

/// Compare value for a signed duty in percent.
///
/// `MAX_COMPARE - MAX_COMPARE * |duty| / 100`, truncated. Only the
/// magnitude matters; the direction pins carry the sign.
pub fn compare_value(duty: i8) -> u16 {
    let magnitude = duty.clamp(-100, 100).unsigned_abs() as u32;
    let max = MAX_COMPARE as u32;
    (max - (max * magnitude).div_ceil(100)) as u16
}

/// Duties currently applied to the two sides, in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriveState {
    pub left: i8,
    pub right: i8,
}

impl DriveState {
    pub const IDLE: DriveState = DriveState { left: 0, right: 0 };

    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }
}

/// Fixed presets the serial commands map onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Maneuver {
    Forward,
    Backward,
    Stop,
    /// Skid turn, left wheel slowed.
    TurnLeft,
    /// Skid turn, right wheel slowed.
    TurnRight,
    /// Spin in place.
    Clockwise,
    CounterClockwise,
}

impl Maneuver {
    /// `(left, right)` duty pair.
    pub const fn duties(self) -> (i8, i8) {
        match self {
            Maneuver::Forward => (CRUISE_DUTY, CRUISE_DUTY),
            Maneuver::Backward => (-CRUISE_DUTY, -CRUISE_DUTY),
            Maneuver::Stop => (0, 0),
            Maneuver::TurnLeft => (TURN_INNER_DUTY, CRUISE_DUTY),
            Maneuver::TurnRight => (CRUISE_DUTY, TURN_INNER_DUTY),
            Maneuver::Clockwise => (CRUISE_DUTY, -CRUISE_DUTY),
            Maneuver::CounterClockwise => (-CRUISE_DUTY, CRUISE_DUTY),
        }
    }
}

/// One side of the bridge.
pub struct MotorSide<P, C> {
    forward: P,
    reverse: P,
    pwm: C,
}

impl<P: OutputPin, C: PwmCompare> MotorSide<P, C> {
    pub fn new(forward: P, reverse: P, pwm: C) -> Self {
        Self {
            forward,
            reverse,
            pwm,
        }
    }

    fn set(&mut self, duty: i8) -> Result<(), Error> {
        if duty > 0 {
            self.pwm.set_compare(compare_value(duty));
            self.forward.set_high().map_err(Error::pin)?;
            self.reverse.set_low().map_err(Error::pin)
        } else if duty < 0 {
            self.pwm.set_compare(compare_value(duty));
            self.reverse.set_high().map_err(Error::pin)?;
            self.forward.set_low().map_err(Error::pin)
        } else {
            self.release()
        }
    }

    /// Both direction pins low; the compare register is left alone.
    fn release(&mut self) -> Result<(), Error> {
        self.reverse.set_low().map_err(Error::pin)?;
        self.forward.set_low().map_err(Error::pin)
    }
}

pub struct DriveController<P, C> {
    left: MotorSide<P, C>,
    right: MotorSide<P, C>,
    /// Driver enable, active high.
    standby: P,
    state: DriveState,
}

impl<P: OutputPin, C: PwmCompare> DriveController<P, C> {
    pub fn new(left: MotorSide<P, C>, right: MotorSide<P, C>, standby: P) -> Self {
        Self {
            left,
            right,
            standby,
            state: DriveState::IDLE,
        }
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    pub fn motor_on(&mut self) -> Result<(), Error> {
        self.standby.set_high().map_err(Error::pin)
    }

    /// Disables the driver and drops every direction pin.
    pub fn motor_off(&mut self) -> Result<(), Error> {
        self.standby.set_low().map_err(Error::pin)?;
        self.left.release()?;
        self.right.release()?;
        self.state = DriveState::IDLE;
        Ok(())
    }

    /// `duty` in percent, clamped to `-100..=100`.
    pub fn set_left_speed(&mut self, duty: i8) -> Result<(), Error> {
        let duty = duty.clamp(-100, 100);
        self.left.set(duty)?;
        self.state.left = duty;
        Ok(())
    }

    /// `duty` in percent, clamped to `-100..=100`.
    pub fn set_right_speed(&mut self, duty: i8) -> Result<(), Error> {
        let duty = duty.clamp(-100, 100);
        self.right.set(duty)?;
        self.state.right = duty;
        Ok(())
    }

    pub fn set_speeds(&mut self, left: i8, right: i8) -> Result<(), Error> {
        self.set_left_speed(left)?;
        self.set_right_speed(right)
    }

    pub fn apply(&mut self, maneuver: Maneuver) -> Result<(), Error> {
        let (left, right) = maneuver.duties();
        self.set_speeds(left, right)
    }

    pub fn forward(&mut self) -> Result<(), Error> {
        self.apply(Maneuver::Forward)
    }

    pub fn backward(&mut self) -> Result<(), Error> {
        self.apply(Maneuver::Backward)
    }

    pub fn stop(&mut self) -> Result<(), Error> {
        self.apply(Maneuver::Stop)
    }

    pub fn turn_left(&mut self) -> Result<(), Error> {
        self.apply(Maneuver::TurnLeft)
    }

    pub fn turn_right(&mut self) -> Result<(), Error> {
        self.apply(Maneuver::TurnRight)
    }

    pub fn clockwise_rotation(&mut self) -> Result<(), Error> {
        self.apply(Maneuver::Clockwise)
    }

    pub fn counter_clockwise_rotation(&mut self) -> Result<(), Error> {
        self.apply(Maneuver::CounterClockwise)
    }
}
