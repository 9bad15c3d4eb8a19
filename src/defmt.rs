use defmt::Formatter;

use crate::framing::{EncodeError, Unescaped};
use crate::reader::{Error, State};
use crate::telegram::Telegram;

impl defmt::Format for Error {
    fn format(&self, fmt: Formatter<'_>) {
        match self {
            Error::FrameTooLarge => defmt::write!(fmt, "Error::FrameTooLarge"),
            Error::FrameNotAcknowledged => defmt::write!(fmt, "Error::FrameNotAcknowledged"),
            Error::BufferTooSmall => defmt::write!(fmt, "Error::BufferTooSmall"),
            Error::PositionOutOfRange => defmt::write!(fmt, "Error::PositionOutOfRange"),
            Error::AddressTooLong => defmt::write!(fmt, "Error::AddressTooLong"),
            Error::TruncatedTelegram => defmt::write!(fmt, "Error::TruncatedTelegram"),
        }
    }
}

impl defmt::Format for State {
    fn format(&self, fmt: Formatter<'_>) {
        match self {
            State::Idle => defmt::write!(fmt, "State::Idle"),
            State::Accumulating => defmt::write!(fmt, "State::Accumulating"),
            State::FrameReady => defmt::write!(fmt, "State::FrameReady"),
        }
    }
}

impl defmt::Format for EncodeError {
    fn format(&self, fmt: Formatter<'_>) {
        match self {
            EncodeError::BufferTooSmall => defmt::write!(fmt, "EncodeError::BufferTooSmall"),
        }
    }
}

impl defmt::Format for Unescaped {
    fn format(&self, fmt: Formatter<'_>) {
        match self {
            Unescaped::Introducer => defmt::write!(fmt, "Unescaped::Introducer"),
            Unescaped::Literal(b) => defmt::write!(fmt, "Unescaped::Literal({=u8:#x})", *b),
            Unescaped::Plain(b) => defmt::write!(fmt, "Unescaped::Plain({=u8:#x})", *b),
        }
    }
}

impl defmt::Format for Telegram<'_> {
    fn format(&self, fmt: Formatter<'_>) {
        defmt::write!(
            fmt,
            "Telegram frame_format={=u8:#x} destination={=[u8]:#x} source={=[u8]:#x} fcs={=u16:#x} length={=usize}",
            self.frame_format(),
            self.destination(),
            self.source(),
            self.frame_check_sequence(),
            self.raw().len()
        )
    }
}
