use bytes::Bytes;

use crate::{
    frame::checksum,
    Error,
    FirmwareVersion,
    Measurement,
    SerialNumber,
};

/// The SPS30 answers on SHDLC address 0.
pub const DEVICE_ADDRESS: u8 = 0x00;

pub mod id {
    pub const START_MEASUREMENT: u8 = 0x00;
    pub const STOP_MEASUREMENT: u8 = 0x01;
    pub const READ_MEASURED_VALUES: u8 = 0x03;
    pub const DEVICE_INFORMATION: u8 = 0xd0;
    pub const READ_VERSION: u8 = 0xd1;
}

/// Big-endian IEEE-754 float output, the only format [`Measurement`] understands.
const FLOAT_OUTPUT_FORMAT: [u8; 2] = [0x01, 0x03];

/// Device information subcommand selecting the serial number string.
const SERIAL_NUMBER: [u8; 1] = [0x03];

/// Requests the host sends to the sensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    StartMeasurement,
    StopMeasurement,
    ReadMeasuredValues,
    ReadSerialNumber,
    ReadVersion,
}

impl Command {
    #[inline]
    pub fn id(&self) -> u8 {
        match self {
            Command::StartMeasurement => id::START_MEASUREMENT,
            Command::StopMeasurement => id::STOP_MEASUREMENT,
            Command::ReadMeasuredValues => id::READ_MEASURED_VALUES,
            Command::ReadSerialNumber => id::DEVICE_INFORMATION,
            Command::ReadVersion => id::READ_VERSION,
        }
    }

    #[inline]
    pub fn data(&self) -> &'static [u8] {
        match self {
            Command::StartMeasurement => &FLOAT_OUTPUT_FORMAT,
            Command::ReadSerialNumber => &SERIAL_NUMBER,
            _ => &[],
        }
    }

    /// How to decode the payload of the response, if the response carries one.
    #[inline]
    pub fn response_mode(&self) -> Option<DecodeMode> {
        match self {
            Command::ReadMeasuredValues => Some(DecodeMode::Measurement),
            Command::ReadSerialNumber => Some(DecodeMode::SerialNumber),
            Command::ReadVersion => Some(DecodeMode::FirmwareVersion),
            Command::StartMeasurement | Command::StopMeasurement => None,
        }
    }

    /// Unstuffed request body: address, command, length, data and checksum.
    pub fn to_bytes(&self) -> Bytes {
        let data = self.data();

        let mut out = Vec::with_capacity(data.len() + 4);
        out.extend_from_slice(&[DEVICE_ADDRESS, self.id(), data.len() as u8]);
        out.extend_from_slice(data);
        out.push(checksum(&out));

        out.into()
    }
}

/// Payload interpretations. The caller picks one based on the command it issued.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DecodeMode {
    Measurement,
    FirmwareVersion,
    SerialNumber,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Decoded {
    Measurement(Measurement),
    FirmwareVersion(FirmwareVersion),
    SerialNumber(SerialNumber),
}

impl DecodeMode {
    /// Measurements of the wrong size decode as zero rather than failing; the other
    /// modes report the error.
    pub fn decode(self, payload: &[u8]) -> Result<Decoded, Error> {
        let result = match self {
            DecodeMode::Measurement => Decoded::Measurement(Measurement::decode_or_zero(payload)),
            DecodeMode::FirmwareVersion => {
                Decoded::FirmwareVersion(FirmwareVersion::decode(payload)?)
            },
            DecodeMode::SerialNumber => Decoded::SerialNumber(SerialNumber::decode(payload)?),
        };

        Ok(result)
    }
}
