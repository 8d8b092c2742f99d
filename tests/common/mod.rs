#![allow(dead_code)]

use std::str::FromStr;

use tracing_subscriber::{
    fmt::format::FmtSpan,
    EnvFilter,
};

use sps30::message::{
    measurement::Measurement,
    Frame,
};

pub fn trace_init() {
    let level_filter = EnvFilter::from_str("debug").unwrap();

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(level_filter)
        .try_init();
}

/// A response frame as the sensor would put it on the wire.
pub fn wire(command: u8, state: u8, payload: &[u8]) -> Vec<u8> {
    let body = Frame::new(0x00, command, state, payload.to_vec()).to_bytes();

    let mut out = vec![0x7e];
    out.extend(sps30::codec::stuff(body));
    out.push(0x7e);

    out
}

pub fn measurement_wire(m: &Measurement) -> Vec<u8> {
    wire(0x03, 0x00, &m.encode())
}
