#![no_std]
#![no_main]
#![allow(incomplete_features)]
#![feature(abi_avr_interrupt)]
#![feature(generic_const_exprs)]

use arduino_hal::{Delay, Pins};
use panic_halt as _;
use smartcar::{CommandLink, DriveController, MotorSide, RangeSensor, SmartCar};

#[cfg(feature = "soft-serial")]
use smartcar::{config::UART_BAUD, time::Duration, Error, SoftSerial};

mod clock;
mod interrupt;
mod pwm;
mod uart;

use clock::CLOCK;
use interrupt::{AttachHwInterrupt, ExtIntMode, ECHO};
use uart::RX_LATCH;

/// Main loop period.
const LOOP_MS: u16 = 5;
/// Loop iterations between two avoidance cycles.
#[cfg(feature = "avoidance")]
const AVOID_EVERY: u16 = 20;

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins: Pins = arduino_hal::pins!(dp);

    // Disable interrupts while we initialize them
    avr_device::interrupt::disable();

    // Monotonic clock for timeouts and echo timing.
    CLOCK.start(dp.TC0);

    // Echo on INT1, both edges.
    pins.d3.attach_hw_int(&dp.EXINT, ExtIntMode::Change);

    let (left_pwm, right_pwm) =
        pwm::start_timer1(dp.TC1, pins.d9.into_output(), pins.d10.into_output());
    let drive = DriveController::new(
        MotorSide::new(
            pins.d4.into_output().downgrade(),
            pins.d5.into_output().downgrade(),
            left_pwm,
        ),
        MotorSide::new(
            pins.d6.into_output().downgrade(),
            pins.d7.into_output().downgrade(),
            right_pwm,
        ),
        pins.d8.into_output().downgrade(),
    );

    #[cfg(not(feature = "soft-serial"))]
    let transport = uart::Uart0::new(dp.USART0);
    #[cfg(feature = "soft-serial")]
    let transport = SoftSerial::new(
        pins.d11.into_output_high(),
        pins.a0.into_pull_up_input(),
        Delay::new(),
        &CLOCK,
        UART_BAUD,
    )
    .with_start_timeout(Duration::millis(2));

    let mut car = SmartCar::builder()
        .drive(drive)
        .link(CommandLink::new(transport, &RX_LATCH, &CLOCK))
        .range_sensor(RangeSensor::new(
            pins.d12.into_output(),
            Delay::new(),
            &ECHO,
            &CLOCK,
        ))
        .build();

    // Enable interrupts now that every handler has its state
    unsafe { avr_device::interrupt::enable() };

    if let Err(err) = car.init() {
        car.report(err);
    }

    let mut counter: u16 = 0;

    loop {
        #[cfg(feature = "soft-serial")]
        match car.link_mut().transmitter_mut().receive_byte() {
            Ok(byte) => RX_LATCH.store(byte),
            Err(Error::RxTimeout) => {}
            Err(err) => car.report(err),
        }

        if let Err(err) = car.handle_command() {
            car.report(err);
        }

        // Only while cruising forward; other maneuvers are left alone.
        #[cfg(feature = "avoidance")]
        if counter % AVOID_EVERY == 0 && car.wants_avoidance() {
            if let Err(err) = car.avoid_obstacle() {
                car.report(err);
            }
        }

        counter = counter.wrapping_add(1);
        arduino_hal::delay_ms(LOOP_MS);
    }
}
