use std::path::PathBuf;

use sps30::output::Format;

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct Options {
    /// e.g. /dev/ttyUSB0 or COM10
    #[structopt(short, long = "serial_port")]
    pub serial_port: String,

    #[structopt(short, long, default_value = "115200")]
    pub baud: u32,

    /// How long to wait for a response to a command.
    #[structopt(long, default_value = "2000")]
    pub timeout_ms: u64,

    /// Drop frames whose checksum does not match.
    #[structopt(long)]
    pub verify_checksums: bool,

    #[structopt(long)]
    pub pretty: bool,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub enum Command {
    /// Decode measurements the sensor sends unprompted, averaging bursts.
    Monitor {
        #[structopt(flatten)]
        output: OutputOptions,

        /// Reads faster than this extend the current burst.
        #[structopt(long, default_value = "80")]
        threshold_ms: u64,
    },

    /// Start measuring and request values at a fixed interval.
    Poll {
        #[structopt(flatten)]
        output: OutputOptions,

        #[structopt(long, default_value = "1000")]
        interval_ms: u64,
    },

    /// Print serial number and firmware version.
    Info,

    /// Stop measuring.
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct OutputOptions {
    /// Append decoded samples to this file.
    #[structopt(short, long)]
    pub output: Option<PathBuf>,

    /// Comment line for the file header.
    #[structopt(long, default_value = "")]
    pub comment: String,

    /// csv or json
    #[structopt(long, default_value = "csv")]
    pub format: Format,
}
