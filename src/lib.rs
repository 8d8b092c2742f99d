//! Decoding and burst smoothing for the Sensirion SPS30 particulate matter sensor's
//! SHDLC serial protocol.

pub use codec;
pub use message;
pub use util::build;

mod error;
pub mod monitor;
pub mod output;
pub mod sensor;
pub mod smoother;
pub mod trace;

pub use error::{
    Error,
    Result,
};
pub use monitor::{
    Monitor,
    Sample,
};
pub use sensor::Sensor;
pub use smoother::{
    Averaged,
    BurstSmoother,
};

/// Open a serial port with the sensor's line settings (8N1).
pub fn open_port(path: &str, baud: u32) -> Result<tokio_serial::SerialStream> {
    let builder = tokio_serial::new(path, baud)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One);

    let stream = tokio_serial::SerialStream::open(&builder).map_err(std::io::Error::from)?;
    tracing::info!(port = path, baud, "opened serial port");

    Ok(stream)
}
