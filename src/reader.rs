//! Byte at a time assembly of telegrams
//!
//! The meter pushes telegrams over the serial line continuously. The byte source is supposed to
//! hand every received byte to [`FrameAssembler::feed`], which returns `Ok(true)` once a complete
//! telegram sits in the assembler's buffer. The consumer then reads it using
//! [`FrameAssembler::telegram`], [`FrameAssembler::extract_telegram`] and the positional
//! accessors, and finally calls [`FrameAssembler::acknowledge`] so that the next frame can be
//! assembled. Until then every fed byte is rejected with [`Error::FrameNotAcknowledged`].
#[cfg(feature = "std")]
use core::fmt;
use core::marker::PhantomData;
use heapless::Vec;

use crate::framing::{unescape, Aidon, Framing, Unescaped};

pub const DEFAULT_BUFFER_LENGTH: usize = 512;
pub const MAX_ADDRESS_LENGTH: usize = 5;
/// Set on the last byte of an address field
const ADDRESS_END_BIT: u8 = 0x01;

pub type Address = Vec<u8, MAX_ADDRESS_LENGTH>;
pub type AidonAssembler = FrameAssembler<Aidon, DEFAULT_BUFFER_LENGTH>;

#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum Error {
    /// Frame did not fit into the buffer, it was discarded and the byte starts a new frame
    FrameTooLarge,
    /// Completed frame has not been acknowledged yet, the byte was not consumed
    FrameNotAcknowledged,
    BufferTooSmall,
    PositionOutOfRange,
    AddressTooLong,
    TruncatedTelegram,
}

#[cfg(feature = "std")]
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::FrameTooLarge => write!(f, "Frame exceeded the buffer capacity and was dropped"),
            Error::FrameNotAcknowledged => write!(
                f,
                "Byte rejected: previous telegram has not been acknowledged yet"
            ),
            Error::BufferTooSmall => write!(f, "Output buffer is too small"),
            Error::PositionOutOfRange => write!(f, "Position is outside of the received data"),
            Error::AddressTooLong => write!(
                f,
                "Address field is longer than {} bytes",
                MAX_ADDRESS_LENGTH
            ),
            Error::TruncatedTelegram => write!(f, "Telegram is too short for its header"),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum State {
    /// Waiting for a start marker
    Idle,
    Accumulating,
    /// Complete telegram held until acknowledged
    FrameReady,
}

/// Reassembles byte stuffed telegrams from a serial byte stream.
///
/// `C` is the buffer capacity; frames longer than that are dropped. It has to be larger than
/// [`Framing::MIN_FRAME_LENGTH`] or no frame will ever complete.
pub struct FrameAssembler<F = Aidon, const C: usize = DEFAULT_BUFFER_LENGTH> {
    buffer: Vec<u8, C>,
    frame_length: usize,
    escape_pending: bool,
    overflow_count: u32,
    framing: PhantomData<F>,
}

impl<F: Framing, const C: usize> FrameAssembler<F, C> {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            frame_length: 0,
            escape_pending: false,
            overflow_count: 0,
            framing: PhantomData,
        }
    }

    /// Forgets the frame in progress (or the completed one) and waits for the next start marker
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.frame_length = 0;
        self.escape_pending = false;
    }

    /// Releases a completed telegram so the next frame can be assembled
    pub fn acknowledge(&mut self) {
        self.clear();
    }

    pub fn state(&self) -> State {
        if self.is_frame_ready() {
            State::FrameReady
        } else if self.buffer.is_empty() {
            State::Idle
        } else {
            State::Accumulating
        }
    }

    /// Number of de-stuffed bytes received for the current frame
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Frames dropped so far because they did not fit into the buffer
    pub fn overflow_count(&self) -> u32 {
        self.overflow_count
    }

    fn is_frame_ready(&self) -> bool {
        self.frame_length > 0 && self.buffer.len() == self.frame_length
    }

    /// Processes one byte received from the wire.
    ///
    /// Returns `Ok(true)` when the byte completed a telegram. Bytes received before a start marker
    /// are silently discarded. When a frame outgrows the buffer it is dropped, the byte that did
    /// not fit is stored at the start of the cleared buffer and [`Error::FrameTooLarge`] is
    /// returned.
    pub fn feed(&mut self, byte: u8) -> Result<bool, Error> {
        if self.is_frame_ready() {
            #[cfg(feature = "defmt-impl")]
            ::defmt::trace!("byte {=u8:#x} rejected, telegram not acknowledged", byte);
            return Err(Error::FrameNotAcknowledged);
        }

        if self.buffer.is_empty() && byte != F::START {
            return Ok(false);
        }

        match unescape::<F>(self.escape_pending, byte) {
            Unescaped::Introducer => {
                self.escape_pending = true;
                Ok(false)
            }
            Unescaped::Literal(literal) => {
                self.escape_pending = false;
                self.store(literal)?;
                Ok(false)
            }
            Unescaped::Plain(plain) => {
                self.escape_pending = false;
                self.store(plain)?;
                if plain == F::END && self.buffer.len() > F::MIN_FRAME_LENGTH {
                    self.frame_length = self.buffer.len();
                    #[cfg(feature = "defmt-impl")]
                    ::defmt::debug!("telegram complete, {=usize} bytes", self.frame_length);
                    return Ok(true);
                }
                Ok(false)
            }
        }
    }

    fn store(&mut self, byte: u8) -> Result<(), Error> {
        if self.buffer.push(byte).is_err() {
            #[cfg(feature = "defmt-impl")]
            ::defmt::warn!("frame exceeded {=usize} bytes, dropped", C);
            self.clear();
            self.overflow_count = self.overflow_count.saturating_add(1);
            // empty after clear, only a zero capacity buffer refuses the byte
            let _ = self.buffer.push(byte);
            return Err(Error::FrameTooLarge);
        }
        Ok(())
    }

    /// Completed telegram without the end marker, `None` while no telegram is ready
    pub fn telegram(&self) -> Option<&[u8]> {
        if self.is_frame_ready() {
            Some(&self.buffer[..self.frame_length - 1])
        } else {
            None
        }
    }

    /// Copies the completed telegram (without the end marker) to `out`.
    ///
    /// Returns number of bytes copied, 0 if there is no complete telegram yet.
    pub fn extract_telegram(&self, out: &mut [u8]) -> Result<usize, Error> {
        let telegram = match self.telegram() {
            Some(telegram) => telegram,
            None => return Ok(0),
        };
        out.get_mut(..telegram.len())
            .ok_or(Error::BufferTooSmall)?
            .copy_from_slice(telegram);
        Ok(telegram.len())
    }

    /// Copies out the completed telegram and acknowledges it
    pub fn take_telegram(&mut self) -> Option<Vec<u8, C>> {
        let telegram = Vec::from_slice(self.telegram()?).ok()?;
        self.acknowledge();
        Some(telegram)
    }

    /// Copies an LSB terminated address field starting at `start_offset` to `out[out_start..]`.
    ///
    /// Returns the field length, or 0 when the terminating byte has not been received yet and
    /// the call should be retried with more data.
    pub fn extract_address_field(
        &self,
        start_offset: usize,
        out: &mut [u8],
        out_start: usize,
    ) -> Result<usize, Error> {
        let mut copied = 0;
        for &byte in self.buffer.iter().skip(start_offset) {
            let slot = out
                .get_mut(out_start + copied)
                .ok_or(Error::BufferTooSmall)?;
            *slot = byte;
            copied += 1;

            if byte & ADDRESS_END_BIT == ADDRESS_END_BIT {
                return Ok(copied);
            }
        }
        Ok(0)
    }

    /// Address field at `start_offset`, `None` while it is incomplete
    pub fn address_field(&self, start_offset: usize) -> Result<Option<Address>, Error> {
        let mut field = [0u8; MAX_ADDRESS_LENGTH];
        match self.extract_address_field(start_offset, &mut field, 0) {
            Ok(0) => Ok(None),
            Ok(length) => Ok(Some(
                Address::from_slice(&field[..length]).map_err(|_| Error::AddressTooLong)?,
            )),
            Err(Error::BufferTooSmall) => Err(Error::AddressTooLong),
            Err(e) => Err(e),
        }
    }

    /// Reads the checksum stored right after `position`, low byte first.
    ///
    /// Nothing is computed or verified here.
    pub fn extract_checksum(&self, position: usize) -> Result<u16, Error> {
        let low = position.checked_add(1).ok_or(Error::PositionOutOfRange)?;
        let high = position.checked_add(2).ok_or(Error::PositionOutOfRange)?;
        Ok(u16::from_le_bytes([self.byte_at(low)?, self.byte_at(high)?]))
    }

    pub fn byte_at(&self, position: usize) -> Result<u8, Error> {
        self.buffer
            .get(position)
            .copied()
            .ok_or(Error::PositionOutOfRange)
    }

    pub fn is_valid_frame_format(frame_format: u8) -> bool {
        F::is_valid_frame_format(frame_format)
    }
}

impl<F: Framing, const C: usize> Default for FrameAssembler<F, C> {
    fn default() -> Self {
        Self::new()
    }
}
