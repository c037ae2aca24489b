use core::cell::Cell;

use critical_section::Mutex;

use crate::drive::Maneuver;

pub const FORWARD: u8 = b'F';
pub const BACKWARD: u8 = b'B';
pub const LEFT: u8 = b'L';
pub const RIGHT: u8 = b'R';
pub const ANTICLOCKWISE: u8 = b'A';
pub const CLOCKWISE: u8 = b'C';
pub const STOP: u8 = b'S';

pub const UNKNOWN_REPLY: &str = "未知指令，请重新发送\n";

/// One command byte as received over the serial link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    RotateCcw,
    RotateCw,
    Stop,
    /// Anything else; the raw byte is kept for reporting.
    Unknown(u8),
}

impl From<u8> for Command {
    fn from(value: u8) -> Self {
        match value {
            FORWARD => Command::Forward,
            BACKWARD => Command::Backward,
            LEFT => Command::TurnLeft,
            RIGHT => Command::TurnRight,
            ANTICLOCKWISE => Command::RotateCcw,
            CLOCKWISE => Command::RotateCw,
            STOP => Command::Stop,
            other => Command::Unknown(other),
        }
    }
}

impl Command {
    /// The drive preset this command selects, `None` for [`Command::Unknown`].
    pub fn maneuver(self) -> Option<Maneuver> {
        match self {
            Command::Forward => Some(Maneuver::Forward),
            Command::Backward => Some(Maneuver::Backward),
            Command::TurnLeft => Some(Maneuver::TurnLeft),
            Command::TurnRight => Some(Maneuver::TurnRight),
            Command::RotateCcw => Some(Maneuver::CounterClockwise),
            Command::RotateCw => Some(Maneuver::Clockwise),
            Command::Stop => Some(Maneuver::Stop),
            Command::Unknown(_) => None,
        }
    }

    /// Text echoed back once the command has been handled.
    pub fn reply(self) -> &'static str {
        match self {
            Command::Forward => "前进\n",
            Command::Backward => "后退\n",
            Command::TurnLeft => "左转\n",
            Command::TurnRight => "右转\n",
            Command::RotateCcw => "逆时针旋转\n",
            Command::RotateCw => "顺时针旋转\n",
            Command::Stop => "停止\n",
            Command::Unknown(_) => UNKNOWN_REPLY,
        }
    }
}

/// Single slot hand-off from the receive interrupt to the main loop.
///
/// A byte stored before the previous one was taken replaces it; the older
/// byte is gone for good. There is no flow control on the link, so this
/// is the same loss the bare UART data register would show.
pub struct ReceiveLatch {
    slot: Mutex<Cell<Option<u8>>>,
}

impl ReceiveLatch {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(None)),
        }
    }

    /// Called from the receive interrupt only.
    pub fn store(&self, byte: u8) {
        critical_section::with(|cs| self.slot.borrow(cs).set(Some(byte)));
    }

    /// Reads and clears the slot in one critical section.
    pub fn take(&self) -> Option<u8> {
        critical_section::with(|cs| self.slot.borrow(cs).take())
    }
}

impl Default for ReceiveLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_protocol_bytes() {
        assert_eq!(Command::from(b'F'), Command::Forward);
        assert_eq!(Command::from(b'B'), Command::Backward);
        assert_eq!(Command::from(b'L'), Command::TurnLeft);
        assert_eq!(Command::from(b'R'), Command::TurnRight);
        assert_eq!(Command::from(b'A'), Command::RotateCcw);
        assert_eq!(Command::from(b'C'), Command::RotateCw);
        assert_eq!(Command::from(b'S'), Command::Stop);
        assert_eq!(Command::from(b'f'), Command::Unknown(b'f'));
        assert_eq!(Command::from(0xFF), Command::Unknown(0xFF));
    }

    #[test]
    fn unknown_has_no_maneuver() {
        assert_eq!(Command::Unknown(b'X').maneuver(), None);
        assert_eq!(Command::Unknown(b'X').reply(), "未知指令，请重新发送\n");
        assert_eq!(Command::Stop.maneuver(), Some(Maneuver::Stop));
    }

    #[test]
    fn latch_is_consumed_by_one_take() {
        let latch = ReceiveLatch::new();
        assert_eq!(latch.take(), None);
        latch.store(b'F');
        assert_eq!(latch.take(), Some(b'F'));
        assert_eq!(latch.take(), None);
    }

    #[test]
    fn overrun_keeps_only_the_newest_byte() {
        let latch = ReceiveLatch::new();
        latch.store(b'F');
        latch.store(b'S');
        assert_eq!(latch.take(), Some(b'S'));
        assert_eq!(latch.take(), None);
    }
}
