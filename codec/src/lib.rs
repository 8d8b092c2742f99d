//! SHDLC framing: byte-stuffing and frame boundary detection for Sensirion serial
//! devices.

pub use ::tokio_util::codec as tokio_codec;

pub mod shdlc;
pub mod stuffing;

pub use self::{
    shdlc::{
        Error,
        FrameAssembler,
        ShdlcCodec,
        MAX_BODY_LEN,
    },
    stuffing::{
        stuff,
        unstuff,
    },
};
