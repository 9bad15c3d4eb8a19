//! Header fields of a completed telegram
//!
//! The meter sends HDLC style frames:
//!
//! | offset       | length | description                               |
//! |--------------|--------|-------------------------------------------|
//! | 0            | 1      | start marker                              |
//! | 1            | 1      | frame format                              |
//! | 2            | 1      | frame length                              |
//! | 3            | 1 - 5  | destination address, LSB of last byte set |
//! | ..           | 1 - 5  | source address, LSB of last byte set      |
//! | ..           | ..     | control, header checksum, information     |
//! | len - 3      | 2      | frame check sequence, low byte first      |
//! | len - 1      | 1      | end marker (not part of the telegram)     |
#[cfg(feature = "std")]
use core::fmt;

use crate::framing::Framing;
use crate::reader::{Address, Error, FrameAssembler};

pub const FRAME_FORMAT_OFFSET: usize = 1;
pub const DESTINATION_ADDRESS_OFFSET: usize = 3;

/// Borrowed view of the telegram held by a [`FrameAssembler`]
pub struct Telegram<'a> {
    raw: &'a [u8],
    frame_format: u8,
    valid_frame_format: bool,
    destination: Address,
    source: Address,
    frame_check_sequence: u16,
}

impl<'a> Telegram<'a> {
    /// Reads the header of the completed telegram, `None` while no telegram is ready.
    ///
    /// The telegram is complete, so an address that is not terminated before the end marker means
    /// the frame is truncated.
    pub fn parse<F: Framing, const C: usize>(
        assembler: &'a FrameAssembler<F, C>,
    ) -> Result<Option<Telegram<'a>>, Error> {
        let raw = match assembler.telegram() {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let frame_format = *raw
            .get(FRAME_FORMAT_OFFSET)
            .ok_or(Error::TruncatedTelegram)?;
        let destination = assembler
            .address_field(DESTINATION_ADDRESS_OFFSET)?
            .ok_or(Error::TruncatedTelegram)?;
        let source = assembler
            .address_field(DESTINATION_ADDRESS_OFFSET + destination.len())?
            .ok_or(Error::TruncatedTelegram)?;

        // two checksum bytes right before the end marker
        let header_length = DESTINATION_ADDRESS_OFFSET + destination.len() + source.len();
        let checksum_position = raw
            .len()
            .checked_sub(3)
            .filter(|position| position + 1 >= header_length)
            .ok_or(Error::TruncatedTelegram)?;
        let frame_check_sequence = assembler.extract_checksum(checksum_position)?;

        Ok(Some(Telegram {
            raw,
            frame_format,
            valid_frame_format: F::is_valid_frame_format(frame_format),
            destination,
            source,
            frame_check_sequence,
        }))
    }

    /// Telegram bytes starting with the start marker, end marker excluded
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    pub fn frame_format(&self) -> u8 {
        self.frame_format
    }

    pub fn has_valid_frame_format(&self) -> bool {
        self.valid_frame_format
    }

    pub fn destination(&self) -> &[u8] {
        &self.destination
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// As received, not verified
    pub fn frame_check_sequence(&self) -> u16 {
        self.frame_check_sequence
    }
}

#[cfg(feature = "std")]
impl fmt::Debug for Telegram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Telegram {{ frame_format: {:02x?}, destination: {:02x?}, source: {:02x?}, frame_check_sequence: {:04x?}, raw: {:02x?} }}",
            self.frame_format,
            self.destination(),
            self.source(),
            self.frame_check_sequence,
            self.raw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{encode_frame, max_encoding_length, Aidon};
    use crate::reader::{AidonAssembler, DEFAULT_BUFFER_LENGTH};
    use heapless::Vec;

    /// Payload (start and end marker excluded) of a telegram with the given addresses
    fn payload(
        destination: &[u8],
        source: &[u8],
        length: usize,
    ) -> Vec<u8, DEFAULT_BUFFER_LENGTH> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&[0xa0, 0x7d]).unwrap();
        payload.extend_from_slice(destination).unwrap();
        payload.extend_from_slice(source).unwrap();
        payload.push(0x13).unwrap();
        payload.resize(length - 2, 0x10).unwrap();
        // frame check sequence 0xc012, needs escaping
        payload.extend_from_slice(&[0x12, 0xc0]).unwrap();
        payload
    }

    fn assemble(payload: &[u8]) -> AidonAssembler {
        let mut wire = [0u8; max_encoding_length(DEFAULT_BUFFER_LENGTH)];
        let written = encode_frame::<Aidon>(payload, &mut wire).unwrap();
        let mut assembler = AidonAssembler::new();
        let completed = wire[..written]
            .iter()
            .filter(|byte| assembler.feed(**byte).unwrap())
            .count();
        assert_eq!(completed, 1);
        assembler
    }

    #[test]
    fn test_parse_header() {
        let payload = payload(&[0x41], &[0x08, 0x83], 120);
        let assembler = assemble(&payload);

        let telegram = Telegram::parse(&assembler).unwrap().unwrap();
        assert_eq!(telegram.frame_format(), 0xa0);
        assert!(telegram.has_valid_frame_format());
        assert_eq!(telegram.destination(), &[0x41]);
        assert_eq!(telegram.source(), &[0x08, 0x83]);
        assert_eq!(telegram.frame_check_sequence(), 0xc012);
        assert_eq!(telegram.raw().len(), 121);
        assert_eq!(telegram.raw()[0], 0x37);
        assert_eq!(&telegram.raw()[1..], &payload[..]);
    }

    #[test]
    fn test_parse_invalid_frame_format() {
        let mut payload = payload(&[0x41], &[0x21], 100);
        payload[0] = 0xa8;
        let assembler = assemble(&payload);

        let telegram = Telegram::parse(&assembler).unwrap().unwrap();
        assert_eq!(telegram.frame_format(), 0xa8);
        assert!(!telegram.has_valid_frame_format());
    }

    #[test]
    fn test_parse_without_complete_frame() {
        let mut assembler = AidonAssembler::new();
        assert!(Telegram::parse(&assembler).unwrap().is_none());

        for byte in &[0x37, 0xa0, 0x7d, 0x41, 0x21] {
            assembler.feed(*byte).unwrap();
        }
        assert!(Telegram::parse(&assembler).unwrap().is_none());
    }

    struct ShortFraming {}

    impl Framing for ShortFraming {
        const START: u8 = 0x7e;
        const END: u8 = 0x7e;
        const ESCAPE: u8 = 0x7d;
        const ESC_END: u8 = 0x5e;
        const ESC_ESC: u8 = 0x5d;
        const MIN_FRAME_LENGTH: usize = 2;
        const VALID_FRAME_FORMAT: u8 = 0xa0;
    }

    fn assemble_short(wire: &[u8]) -> FrameAssembler<ShortFraming, 16> {
        let mut assembler = FrameAssembler::<ShortFraming, 16>::new();
        for byte in wire {
            assembler.feed(*byte).unwrap();
        }
        assembler
    }

    #[test]
    fn test_parse_unterminated_address() {
        let assembler = assemble_short(&[0x7e, 0xa0, 0x05, 0x02, 0x04, 0x7e]);
        assert!(assembler.telegram().is_some());

        assert_eq!(
            Telegram::parse(&assembler).unwrap_err(),
            Error::TruncatedTelegram
        );
    }

    #[test]
    fn test_parse_missing_frame_check_sequence() {
        let assembler = assemble_short(&[0x7e, 0xa0, 0x05, 0x41, 0x21, 0x7e]);
        assert!(assembler.telegram().is_some());

        assert_eq!(
            Telegram::parse(&assembler).unwrap_err(),
            Error::TruncatedTelegram
        );
    }

    #[test]
    fn test_parse_address_too_long() {
        let payload = payload(&[0x02, 0x02, 0x02, 0x02, 0x02, 0x03], &[0x21], 100);
        let assembler = assemble(&payload);

        assert_eq!(
            Telegram::parse(&assembler).unwrap_err(),
            Error::AddressTooLong
        );
    }
}
