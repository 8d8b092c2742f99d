use message::Command;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] codec::Error),

    #[error(transparent)]
    Message(#[from] message::Error),

    #[error("{command:?} failed with state {state:#04x}")]
    DeviceState { command: Command, state: u8 },

    #[error("no response to {0:?} within {1:?}")]
    Timeout(Command, std::time::Duration),

    #[error("{0:?} response did not decode as expected")]
    UnexpectedResponse(Command),

    #[error("byte stream closed")]
    Closed,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
