use bytes::{
    Buf,
    BufMut,
    Bytes,
    BytesMut,
};
use tokio_util::codec::{
    Decoder,
    Encoder,
};

use crate::stuffing::{
    self,
    FLAG,
};

/// Largest stuffed body a sensor can produce: four header bytes, 255 payload bytes and
/// the checksum, every one of them escaped.
pub const MAX_BODY_LEN: usize = 2 * (4 + 255 + 1);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed byte stuffing in frame {}", hex::encode(.body))]
    Stuffing {
        #[source]
        source: stuffing::Error,
        body:   Bytes,
    },

    #[error("no end marker within {0} bytes")]
    FrameTooLong(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum State {
    Idle,
    Collecting,
}

/// Byte-at-a-time frame boundary detection.
///
/// Bytes before the first `0x7E` are discarded. Everything up to the next `0x7E` is
/// collected and unstuffed. Two markers in a row are read as end-of-frame followed by
/// start-of-frame, which is what a receiver sees when it joins a stream between frames.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    state:   State,
    buf:     BytesMut,
    max_len: usize,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::with_max_len(MAX_BODY_LEN)
    }
}

impl FrameAssembler {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            state: State::Idle,
            buf: BytesMut::with_capacity(max_len.min(MAX_BODY_LEN)),
            max_len,
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Drop any partially collected frame and wait for the next start marker.
    #[inline]
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.buf.clear();
    }

    /// Feed a single byte. Returns `Some` when a frame is completed or rejected; the
    /// assembler is idle again in both cases.
    pub fn push(&mut self, b: u8) -> Option<Result<Bytes, Error>> {
        match self.state {
            State::Idle => {
                if b == FLAG {
                    self.state = State::Collecting;
                }

                None
            },

            State::Collecting if b == FLAG => {
                if self.buf.is_empty() {
                    return None;
                }

                self.state = State::Idle;
                let body = self.buf.split().freeze();

                let result = stuffing::unstuff(&body).map(Bytes::from).map_err(|source| {
                    Error::Stuffing {
                        source,
                        body,
                    }
                });

                Some(result)
            },

            State::Collecting => {
                if self.buf.len() >= self.max_len {
                    self.reset();
                    return Some(Err(Error::FrameTooLong(self.max_len)));
                }

                self.buf.put_u8(b);
                None
            },
        }
    }
}

/// Splits a byte stream into unstuffed SHDLC frame bodies and wraps outgoing bodies in
/// stuffing and delimiters.
///
/// Malformed frames are logged and skipped so a single corrupt frame never ends a
/// [`FramedRead`](tokio_util::codec::FramedRead) stream. The only error surfaced from
/// decoding is I/O.
#[derive(Debug, Clone, Default)]
pub struct ShdlcCodec {
    assembler: FrameAssembler,
    dropped:   u64,
}

impl ShdlcCodec {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames discarded as malformed since creation.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[inline]
    pub fn reset(&mut self) {
        self.assembler.reset();
    }
}

impl<T> Encoder<T> for ShdlcCodec
where
    T: AsRef<[u8]>,
{
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let stuffed = stuffing::stuff(item);

        dst.reserve(stuffed.len() + 2);
        dst.put_u8(FLAG);
        dst.put_slice(&stuffed);
        dst.put_u8(FLAG);

        Ok(())
    }
}

impl Decoder for ShdlcCodec {
    type Error = Error;
    type Item = Bytes;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            match self.assembler.push(src.get_u8()) {
                None => continue,
                Some(Ok(frame)) => return Ok(Some(frame)),
                Some(Err(e)) => {
                    self.dropped += 1;
                    tracing::warn!(error = %e, "dropping malformed frame");
                },
            }
        }

        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let result @ Some(_) = self.decode(buf)? {
            return Ok(result);
        }

        if !self.assembler.is_idle() {
            tracing::debug!("stream ended inside a frame, discarding partial data");
            self.assembler.reset();
        }

        Ok(None)
    }
}
