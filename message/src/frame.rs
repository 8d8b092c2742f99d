use std::fmt::{
    Display,
    Formatter,
};

use bytes::Bytes;
use packed_struct::prelude::*;

use crate::MalformedFrame;

/// SHDLC checksum: the inverted low byte of the sum of every byte between the frame
/// delimiters, checksum excluded.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Fixed prefix of a response frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "4")]
pub struct Header {
    pub address: u8,
    pub command: u8,
    pub state:   u8,
    pub length:  u8,
}

/// A response frame from the sensor, with stuffing and delimiters already removed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Frame {
    pub address:  u8,
    pub command:  u8,
    pub state:    u8,
    pub payload:  Bytes,
    pub checksum: u8,
}

impl Frame {
    pub const HEADER_LEN: usize = 4;
    pub const MIN_LEN: usize = Self::HEADER_LEN + 1;

    /// Bit 7 of the state byte flags a device error; the low bits carry the command
    /// execution error code.
    pub const DEVICE_ERROR_FLAG: u8 = 0x80;

    /// Interpret without checksum verification.
    #[inline]
    pub fn parse(body: &[u8]) -> Result<Self, MalformedFrame> {
        Interpreter::default().interpret(body)
    }

    /// Build a frame with a correct checksum.
    pub fn new(address: u8, command: u8, state: u8, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        debug_assert!(payload.len() <= u8::MAX as usize);

        let mut result = Self {
            address,
            command,
            state,
            payload,
            checksum: 0,
        };

        result.checksum = result.computed_checksum();
        result
    }

    #[inline]
    pub fn header(&self) -> Header {
        Header {
            address: self.address,
            command: self.command,
            state:   self.state,
            length:  self.payload.len() as u8,
        }
    }

    pub fn computed_checksum(&self) -> u8 {
        let bytes = self.to_bytes();

        checksum(&bytes[..bytes.len() - 1])
    }

    #[inline]
    pub fn checksum_valid(&self) -> bool {
        self.checksum == self.computed_checksum()
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.state == 0
    }

    #[inline]
    pub fn error_code(&self) -> u8 {
        self.state & !Self::DEVICE_ERROR_FLAG
    }

    #[inline]
    pub fn device_error(&self) -> bool {
        self.state & Self::DEVICE_ERROR_FLAG != 0
    }

    /// Unstuffed body bytes, as they would appear between the delimiters before stuffing.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::MIN_LEN + self.payload.len());

        let header = self.header();

        out.extend_from_slice(&[header.address, header.command, header.state, header.length]);
        out.extend_from_slice(&self.payload);
        out.push(self.checksum);

        out
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "addr {:#04x} cmd {:#04x} state {:#04x} [{}]",
            self.address,
            self.command,
            self.state,
            hex::encode(&self.payload)
        )
    }
}

/// Splits an unstuffed frame body into its fields and checks the declared length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Interpreter {
    verify_checksums: bool,
}

impl Interpreter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject frames whose checksum does not match. Off by default.
    #[inline]
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    #[tracing::instrument(skip_all, level = "trace", fields(len = body.len()))]
    pub fn interpret(&self, body: &[u8]) -> Result<Frame, MalformedFrame> {
        if body.len() < Frame::MIN_LEN {
            return Err(MalformedFrame::TooShort(body.len()));
        }

        let (header, rest) = body.split_at(Frame::HEADER_LEN);
        let (payload, checksum) = rest.split_at(rest.len() - 1);

        let header = Header::unpack_from_slice(header)
            .map_err(|_| MalformedFrame::TooShort(body.len()))?;

        if header.length as usize != payload.len() {
            return Err(MalformedFrame::LengthMismatch {
                declared: header.length as usize,
                actual:   payload.len(),
            });
        }

        let frame = Frame {
            address:  header.address,
            command:  header.command,
            state:    header.state,
            payload:  Bytes::copy_from_slice(payload),
            checksum: checksum[0],
        };

        if self.verify_checksums {
            let computed = frame.computed_checksum();

            if computed != frame.checksum {
                return Err(MalformedFrame::ChecksumMismatch {
                    received: frame.checksum,
                    computed,
                });
            }
        }

        Ok(frame)
    }
}
