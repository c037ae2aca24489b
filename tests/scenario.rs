use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_nb::serial;
use smartcar::{
    time::{Duration, Instant},
    Avoidance, Command, CommandLink, DriveController, DriveState, EchoMeasurement, Mode,
    Monotonic, MotorSide, PwmCompare, RangeSensor, ReceiveLatch, SmartCar,
};

// --- Board stand-ins ---

#[derive(Clone, Default)]
struct Pin(Rc<Cell<bool>>);

impl digital::ErrorType for Pin {
    type Error = Infallible;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(true);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Compare(Rc<Cell<Option<u16>>>);

impl PwmCompare for Compare {
    fn set_compare(&mut self, value: u16) {
        self.0.set(Some(value));
    }
}

#[derive(Clone, Default)]
struct Uart(Rc<RefCell<Vec<u8>>>);

impl Uart {
    fn drain(&self) -> String {
        String::from_utf8(self.0.borrow_mut().drain(..).collect()).unwrap()
    }
}

impl serial::ErrorType for Uart {
    type Error = Infallible;
}

impl serial::Write<u8> for Uart {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.0.borrow_mut().push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

/// Tick counter that also plays the ranger: once a ping is armed the next
/// read delivers an echo `pulse` ticks wide.
struct Board<'a> {
    ticks: Cell<u32>,
    echo: &'a EchoMeasurement,
    pulse: Cell<Option<u32>>,
}

impl Monotonic for Board<'_> {
    fn now(&self) -> Instant {
        let now = Instant::from_ticks(self.ticks.get());
        self.ticks.set(self.ticks.get().wrapping_add(7));
        if let (Some(pulse), true) = (self.pulse.get(), self.echo.is_armed()) {
            self.echo.on_edge(true, now);
            self.echo.on_edge(false, now + Duration::from_ticks(pulse));
        }
        now
    }
}

struct Wiring {
    uart: Uart,
    standby: Pin,
    left_fwd: Pin,
    right_rev: Pin,
    left_pwm: Compare,
}

impl Wiring {
    fn new() -> Self {
        Self {
            uart: Uart::default(),
            standby: Pin::default(),
            left_fwd: Pin::default(),
            right_rev: Pin::default(),
            left_pwm: Compare::default(),
        }
    }
}

type Car<'a> = SmartCar<'a, Pin, Compare, Uart, Board<'a>, Pin, NoopDelay>;

fn assemble<'a>(wiring: &Wiring, latch: &'a ReceiveLatch, board: &'a Board<'a>) -> Car<'a> {
    let left = MotorSide::new(wiring.left_fwd.clone(), Pin::default(), wiring.left_pwm.clone());
    let right = MotorSide::new(Pin::default(), wiring.right_rev.clone(), Compare::default());
    SmartCar::builder()
        .drive(DriveController::new(left, right, wiring.standby.clone()))
        .link(CommandLink::new(wiring.uart.clone(), latch, board))
        .range_sensor(RangeSensor::new(Pin::default(), NoopDelay::new(), board.echo, board))
        .build()
}

#[test]
fn bluetooth_session() {
    let wiring = Wiring::new();
    let latch = ReceiveLatch::new();
    let echo = EchoMeasurement::new();
    let board = Board {
        ticks: Cell::new(u32::MAX - 100),
        echo: &echo,
        pulse: Cell::new(None),
    };
    let mut car = assemble(&wiring, &latch, &board);

    car.init().unwrap();
    assert!(wiring.standby.0.get());
    assert_eq!(wiring.uart.drain(), "蓝牙控制已就绪\n");

    // Forward: both sides at 50 %, left bridge driven forward.
    latch.store(b'F');
    assert_eq!(car.handle_command().unwrap(), Some(Command::Forward));
    assert_eq!(car.drive().state(), DriveState { left: 50, right: 50 });
    assert!(wiring.left_fwd.0.get());
    assert_eq!(wiring.left_pwm.0.get(), Some(1599));
    assert_eq!(wiring.uart.drain(), "前进\n");

    // Unmapped byte: reply only.
    latch.store(b'X');
    assert_eq!(car.handle_command().unwrap(), Some(Command::Unknown(b'X')));
    assert_eq!(car.drive().state(), DriveState { left: 50, right: 50 });
    assert_eq!(wiring.uart.drain(), "未知指令，请重新发送\n");

    // Two bytes before a poll: only the second survives.
    latch.store(b'F');
    latch.store(b'A');
    assert_eq!(car.handle_command().unwrap(), Some(Command::RotateCcw));
    assert_eq!(car.handle_command().unwrap(), None);
    assert_eq!(car.drive().state(), DriveState { left: -50, right: 50 });
    assert_eq!(wiring.uart.drain(), "逆时针旋转\n");

    latch.store(b'S');
    car.handle_command().unwrap();
    assert_eq!(car.mode(), Mode::Idle);
    assert!(!wiring.left_fwd.0.get());
    assert!(!wiring.right_rev.0.get());
    assert_eq!(wiring.uart.drain(), "停止\n");
}

#[test]
fn obstacle_ahead() {
    let wiring = Wiring::new();
    let latch = ReceiveLatch::new();
    let echo = EchoMeasurement::new();
    let board = Board {
        ticks: Cell::new(0),
        echo: &echo,
        pulse: Cell::new(Some(35)),
    };
    let mut car = assemble(&wiring, &latch, &board);
    car.init().unwrap();
    wiring.uart.drain();

    // 875 us round trip, 15 cm.
    assert_eq!(car.avoid_obstacle(), Ok(Avoidance::StopAndTurn));
    assert_eq!(car.drive().state(), DriveState { left: 50, right: 10 });
    assert_eq!(car.mode(), Mode::Driving);
    assert_eq!(wiring.uart.drain(), "距离: 15.0 cm\n");

    // Nothing in front any more.
    board.pulse.set(Some(800));
    assert_eq!(car.avoid_obstacle(), Ok(Avoidance::Proceed));
    assert_eq!(car.drive().state(), DriveState { left: 50, right: 50 });

    // Sensor unplugged.
    board.pulse.set(None);
    wiring.uart.drain();
    let err = car.avoid_obstacle().unwrap_err();
    car.report(err);
    assert_eq!(wiring.uart.drain(), "错误: NoEcho\n");
    assert_eq!(car.drive().state(), DriveState { left: 50, right: 50 });
}
