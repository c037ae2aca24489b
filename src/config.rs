//! Fixed configuration of the reference car.

use crate::time::Duration;

/// Baud rate of both the hardware UART and the bit-banged line.
pub const UART_BAUD: u32 = 9600;

/// Timer counts per PWM period.
pub const PWM_PERIOD: u16 = 3200;
/// Largest compare value, i.e. the shortest on-time.
pub const MAX_COMPARE: u16 = PWM_PERIOD - 1;

pub const CRUISE_DUTY: i8 = 50;
pub const TURN_INNER_DUTY: i8 = 10;
pub const SLOW_DUTY: i8 = 30;

/// Below this the car stops and turns away.
pub const STOP_DISTANCE_CM: f32 = 20.0;
/// Below this (and at or above [`STOP_DISTANCE_CM`]) the car creeps.
pub const SLOW_DISTANCE_CM: f32 = 30.0;

/// Speed of sound in cm/µs. Halved again for the round trip.
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.03432;

pub const TRIGGER_IDLE_US: u32 = 2;
pub const TRIGGER_PULSE_US: u32 = 10;

pub const ESCAPE_STOP_MS: u32 = 500;
pub const ESCAPE_TURN_MS: u32 = 800;

/// Capacity of the buffer used by [`crate::CommandLink::send_formatted`].
pub const FORMAT_BUFFER_LEN: usize = 100;

pub const TX_TIMEOUT: Duration = Duration::millis(10);
/// HC-SR04 ends the echo itself after ~38 ms when nothing is in range,
/// so the wait has to outlast that pulse.
pub const ECHO_TIMEOUT: Duration = Duration::millis(50);
pub const START_BIT_TIMEOUT: Duration = Duration::millis(1_000);

pub const READY_BANNER: &str = "蓝牙控制已就绪\n";
