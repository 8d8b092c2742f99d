use std::fmt::{
    Display,
    Formatter,
};

use packed_struct::prelude::*;

use crate::{
    DecodeMode,
    Error,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SerialNumber(pub String);

impl SerialNumber {
    /// The sensor sends a NUL-terminated ASCII string; anything after the terminator is
    /// ignored.
    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        let bytes = &payload[..end];

        if let Some(offset) = bytes.iter().position(|b| !b.is_ascii()) {
            return Err(Error::Encoding {
                offset,
                byte: bytes[offset],
            });
        }

        Ok(Self(bytes.iter().map(|&b| b as char).collect()))
    }
}

impl AsRef<str> for SerialNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for SerialNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wire layout of the version response. Kept private so the packed_struct derive's
/// formatting impls stay off the public type.
#[derive(Debug, Copy, Clone, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "7")]
struct RawVersion {
    major:             i8,
    minor:             i8,
    _r0:               u8,
    hardware_revision: i8,
    _r1:               u8,
    shdlc_major:       i8,
    shdlc_minor:       i8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FirmwareVersion {
    pub major: i8,
    pub minor: i8,

    pub hardware_revision: i8,

    pub shdlc_major: i8,
    pub shdlc_minor: i8,
}

impl From<RawVersion> for FirmwareVersion {
    fn from(raw: RawVersion) -> Self {
        Self {
            major:             raw.major,
            minor:             raw.minor,
            hardware_revision: raw.hardware_revision,
            shdlc_major:       raw.shdlc_major,
            shdlc_minor:       raw.shdlc_minor,
        }
    }
}

impl FirmwareVersion {
    pub const SIZE_BYTES: usize = 7;

    pub fn decode(payload: &[u8]) -> Result<Self, Error> {
        if payload.len() != Self::SIZE_BYTES {
            return Err(Error::PayloadLength {
                mode:     DecodeMode::FirmwareVersion,
                expected: Self::SIZE_BYTES,
                actual:   payload.len(),
            });
        }

        Ok(RawVersion::unpack_from_slice(payload)?.into())
    }

    #[inline]
    pub fn display(&self) -> String {
        format!(
            "firmware {self}, hardware rev {}, shdlc {}.{}",
            self.hardware_revision, self.shdlc_major, self.shdlc_minor
        )
    }
}

impl Display for FirmwareVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
