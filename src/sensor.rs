use std::time::Duration;

use futures::{
    SinkExt,
    StreamExt,
};
use tokio::io::{
    AsyncRead,
    AsyncWrite,
};

use codec::{
    tokio_codec::Framed,
    ShdlcCodec,
};
use message::{
    Command,
    Decoded,
    FirmwareVersion,
    Frame,
    Interpreter,
    Measurement,
    SerialNumber,
};

use crate::{
    Error,
    Result,
};

/// How long a query waits for its response.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// State byte for a command that is not allowed in the current mode, e.g. starting a
/// measurement that is already running.
pub const STATE_NOT_ALLOWED: u8 = 0x43;

/// Request/response access to a sensor over a duplex byte channel.
pub struct Sensor<T> {
    framed:      Framed<T, ShdlcCodec>,
    interpreter: Interpreter,
    timeout:     Duration,
}

impl<T> Sensor<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: T) -> Self {
        Self {
            framed:      Framed::new(io, ShdlcCodec::new()),
            interpreter: Interpreter::default(),
            timeout:     DEFAULT_TIMEOUT,
        }
    }

    #[inline]
    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send `command` and decode the matching response.
    ///
    /// Anything already buffered is discarded first, so a response is never matched to
    /// an earlier request. Frames for other commands and malformed frames are skipped.
    /// Returns `None` for commands whose response carries no payload.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn query(&mut self, command: Command) -> Result<Option<Decoded>> {
        self.framed.read_buffer_mut().clear();
        self.framed.codec_mut().reset();

        tracing::debug!(request = %hex::encode(command.to_bytes()), "sending command");
        self.framed.send(command.to_bytes()).await?;

        let timeout = self.timeout;
        let frame = tokio::time::timeout(timeout, self.response(command))
            .await
            .map_err(|_| Error::Timeout(command, timeout))??;

        if !frame.is_ok() {
            return Err(Error::DeviceState {
                command,
                state: frame.state,
            });
        }

        match command.response_mode() {
            Some(mode) => Ok(Some(mode.decode(&frame.payload)?)),
            None => Ok(None),
        }
    }

    async fn response(&mut self, command: Command) -> Result<Frame> {
        loop {
            let body = match self.framed.next().await {
                Some(body) => body?,
                None => return Err(Error::Closed),
            };

            let frame = match self.interpreter.interpret(&body) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, frame = %hex::encode(&body), "discarding frame");
                    continue;
                },
            };

            if frame.command != command.id() {
                tracing::debug!(%frame, "skipping frame for another command");
                continue;
            }

            return Ok(frame);
        }
    }

    /// Start measuring. A sensor left measuring by an earlier session rejects the command
    /// as not allowed, which counts as success here.
    pub async fn start_measurement(&mut self) -> Result<()> {
        match self.query(Command::StartMeasurement).await {
            Ok(_) => Ok(()),
            Err(Error::DeviceState {
                state: STATE_NOT_ALLOWED,
                ..
            }) => {
                tracing::info!("measurement already running");
                Ok(())
            },
            Err(e) => Err(e),
        }
    }

    pub async fn stop_measurement(&mut self) -> Result<()> {
        self.query(Command::StopMeasurement).await.map(|_| ())
    }

    pub async fn read_values(&mut self) -> Result<Measurement> {
        match self.query(Command::ReadMeasuredValues).await? {
            Some(Decoded::Measurement(m)) => Ok(m),
            _ => Err(Error::UnexpectedResponse(Command::ReadMeasuredValues)),
        }
    }

    pub async fn serial_number(&mut self) -> Result<SerialNumber> {
        match self.query(Command::ReadSerialNumber).await? {
            Some(Decoded::SerialNumber(sn)) => Ok(sn),
            _ => Err(Error::UnexpectedResponse(Command::ReadSerialNumber)),
        }
    }

    pub async fn firmware_version(&mut self) -> Result<FirmwareVersion> {
        match self.query(Command::ReadVersion).await? {
            Some(Decoded::FirmwareVersion(v)) => Ok(v),
            _ => Err(Error::UnexpectedResponse(Command::ReadVersion)),
        }
    }
}
