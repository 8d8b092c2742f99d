use std::time::Duration;

use futures::StreamExt;
use tokio::{
    io::AsyncRead,
    time::Instant,
};

use codec::{
    tokio_codec::FramedRead,
    ShdlcCodec,
};
use message::{
    command,
    Interpreter,
    Measurement,
};

use crate::{
    smoother::{
        Averaged,
        BurstSmoother,
    },
    Result,
};

/// One decoded measurement frame, plus the average of the previous burst if this frame
/// started a new one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub measurement: Measurement,
    pub averaged:    Option<Averaged>,
    pub elapsed:     Duration,
}

/// Passive reader for a sensor that reports measured values on its own.
///
/// Only successful "read measured values" responses are decoded; every other frame is
/// logged and skipped.
pub struct Monitor<R> {
    frames:      FramedRead<R, ShdlcCodec>,
    interpreter: Interpreter,
    smoother:    BurstSmoother,
}

impl<R> Monitor<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, smoother: BurstSmoother) -> Self {
        Self {
            frames: FramedRead::new(reader, ShdlcCodec::new()),
            interpreter: Interpreter::default(),
            smoother,
        }
    }

    #[inline]
    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Frames the decoder threw away as malformed.
    #[inline]
    pub fn dropped_frames(&self) -> u64 {
        self.frames.decoder().dropped()
    }

    /// Wait for the next measurement frame. `None` once the byte source is exhausted.
    pub async fn next_measurement(&mut self) -> Result<Option<Measurement>> {
        while let Some(body) = self.frames.next().await {
            let body = body?;

            let frame = match self.interpreter.interpret(&body) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, frame = %hex::encode(&body), "discarding frame");
                    continue;
                },
            };

            if frame.command != command::id::READ_MEASURED_VALUES || !frame.is_ok() {
                tracing::debug!(command = frame.command, state = frame.state, "skipping frame");
                continue;
            }

            return Ok(Some(Measurement::decode_or_zero(&frame.payload)));
        }

        Ok(None)
    }

    /// Read one measurement and run it through the burst smoother. The time spent waiting
    /// for the frame decides whether it starts a new burst.
    pub async fn next_sample(&mut self) -> Result<Option<Sample>> {
        let start = Instant::now();

        let measurement = match self.next_measurement().await? {
            Some(m) => m,
            None => return Ok(None),
        };

        let elapsed = start.elapsed();
        let averaged = self.smoother.observe(elapsed, &measurement);

        tracing::trace!(?elapsed, averaged = averaged.is_some(), "measurement read");

        Ok(Some(Sample {
            measurement,
            averaged,
            elapsed,
        }))
    }

    /// Stop monitoring, returning the average of the burst still in progress.
    pub fn finish(mut self) -> Option<Averaged> {
        self.smoother.flush()
    }
}
