//! SHDLC byte-stuffing.
//!
//! Inside a frame, the reserved bytes `0x7E`, `0x7D`, `0x11` and `0x13` are sent as
//! `0x7D` followed by the original byte with bit 5 flipped.

pub const FLAG: u8 = 0x7e;
pub const ESCAPE: u8 = 0x7d;
pub const XON: u8 = 0x11;
pub const XOFF: u8 = 0x13;

const XOR: u8 = 0x20;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("escape byte at end of frame")]
    TrailingEscape,

    #[error("escape byte followed by unrecognized byte {0:#04x}")]
    InvalidEscape(u8),
}

#[inline]
pub fn needs_escape(b: u8) -> bool {
    matches!(b, FLAG | ESCAPE | XON | XOFF)
}

/// Maps the second byte of an escape pair back to the reserved byte it stands for.
#[inline]
fn unescape(b: u8) -> Option<u8> {
    let orig = b ^ XOR;

    needs_escape(orig).then(|| orig)
}

pub fn stuff(data: impl AsRef<[u8]>) -> Vec<u8> {
    let data = data.as_ref();
    let mut out = Vec::with_capacity(data.len() + data.len() / 4);

    for &b in data {
        if needs_escape(b) {
            out.push(ESCAPE);
            out.push(b ^ XOR);
        } else {
            out.push(b);
        }
    }

    out
}

/// Reverse [`stuff`]. Escape pairs are resolved left to right and never overlap, so
/// `7D 5D 5E` decodes to `7D 5E` and not `7E`.
pub fn unstuff(data: impl AsRef<[u8]>) -> Result<Vec<u8>, Error> {
    let data = data.as_ref();
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().copied();

    while let Some(b) = iter.next() {
        if b != ESCAPE {
            out.push(b);
            continue;
        }

        match iter.next() {
            Some(next) => out.push(unescape(next).ok_or(Error::InvalidEscape(next))?),
            None => return Err(Error::TrailingEscape),
        }
    }

    Ok(out)
}
