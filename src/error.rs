use embedded_hal::digital;
use embedded_hal_nb::serial;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A GPIO pin reported a failure.
    Pin(digital::ErrorKind),
    /// The serial peripheral reported a failure.
    Serial(serial::ErrorKind),
    /// The transmitter never became ready.
    TxTimeout,
    /// No start bit on the bit-banged line.
    RxTimeout,
    /// No complete echo pulse before the deadline.
    NoEcho,
    /// More than one echo pulse since the last trigger.
    InvalidEcho,
    /// Formatted text did not fit the output buffer.
    Overflow,
}

impl Error {
    pub fn pin<E: digital::Error>(err: E) -> Self {
        Error::Pin(err.kind())
    }

    pub fn serial<E: serial::Error>(err: E) -> Self {
        Error::Serial(err.kind())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Error::Pin(_) => "Pin",
            Error::Serial(_) => "Serial",
            Error::TxTimeout => "TxTimeout",
            Error::RxTimeout => "RxTimeout",
            Error::NoEcho => "NoEcho",
            Error::InvalidEcho => "InvalidEcho",
            Error::Overflow => "Overflow",
        }
    }
}

/// Lets [`crate::SoftSerial`] stand in for a hardware UART.
impl serial::Error for Error {
    fn kind(&self) -> serial::ErrorKind {
        match self {
            Error::Serial(kind) => *kind,
            _ => serial::ErrorKind::Other,
        }
    }
}

impl ufmt::uDebug for Error {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}
