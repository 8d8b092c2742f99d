//! SPS30 frame interpretation and payload decoding.

pub mod command;
mod device_info;
mod error;
pub mod frame;
pub mod measurement;

pub use command::{
    Command,
    DecodeMode,
    Decoded,
};
pub use device_info::{
    FirmwareVersion,
    SerialNumber,
};
pub use error::{
    Error,
    MalformedFrame,
};
pub use frame::{
    Frame,
    Interpreter,
};
pub use measurement::Measurement;
