use std::time::Duration;

use eyre::Result;
use structopt::StructOpt as _;
use tokio::io::{
    AsyncRead,
    AsyncWrite,
};

use sps30::{
    build,
    message::Interpreter,
    output::Output,
    BurstSmoother,
    Monitor,
    Sensor,
};

use crate::options::{
    Command,
    OutputOptions,
};

use crate::options::Options;

mod options;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    util::bootstrap!(
        "starting {} {} (built at {} with rustc {})",
        build::PACKAGE,
        build::VERSION,
        build::BUILD_TIMESTAMP,
        build::RUSTC_VERSION,
    );

    let options: Options = Options::from_args();

    sps30::trace::init(options.pretty);

    tracing::info!(
        application = build::PACKAGE,
        version = build::VERSION,
        built_at = build::BUILD_TIMESTAMP,
        using_rustc = build::RUSTC_COMMIT_HASH,
        "tracing subsystem initialized"
    );

    let port = sps30::open_port(&options.serial_port, options.baud)?;
    let interpreter = Interpreter::new().verify_checksums(options.verify_checksums);

    match options.command {
        Command::Monitor {
            ref output,
            threshold_ms,
        } => {
            let smoother = BurstSmoother::new(Duration::from_millis(threshold_ms));
            let monitor = Monitor::new(port, smoother).with_interpreter(interpreter);

            monitor_loop(monitor, output).await
        },

        Command::Poll {
            ref output,
            interval_ms,
        } => {
            let sensor = Sensor::new(port)
                .with_interpreter(interpreter)
                .with_timeout(Duration::from_millis(options.timeout_ms));

            poll_loop(sensor, output, Duration::from_millis(interval_ms)).await
        },

        Command::Info => {
            let mut sensor = Sensor::new(port)
                .with_interpreter(interpreter)
                .with_timeout(Duration::from_millis(options.timeout_ms));

            let serial = sensor.serial_number().await?;
            let version = sensor.firmware_version().await?;

            println!("serial number: {serial}");
            println!("{}", version.display());

            Ok(())
        },

        Command::Stop => {
            let mut sensor = Sensor::new(port)
                .with_interpreter(interpreter)
                .with_timeout(Duration::from_millis(options.timeout_ms));

            sensor.stop_measurement().await?;
            tracing::info!("measurement stopped");

            Ok(())
        },
    }
}

async fn monitor_loop<R>(mut monitor: Monitor<R>, opts: &OutputOptions) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut output =
        Output::open(opts.format, tokio::io::stdout(), opts.output.as_deref(), &opts.comment)
            .await?;

    loop {
        let sample = tokio::select! {
            sample = monitor.next_sample() => sample?,
            _ = tokio::signal::ctrl_c() => break,
        };

        let sample = match sample {
            Some(sample) => sample,
            None => {
                tracing::info!("serial port closed");
                break;
            },
        };

        if let Some(ref avg) = sample.averaged {
            output.average(avg).await?;
        }

        output.sample(&sample.measurement).await?;
    }

    tracing::info!(dropped_frames = monitor.dropped_frames(), "data logging stopped");

    if let Some(avg) = monitor.finish() {
        output.average(&avg).await?;
    }

    Ok(())
}

async fn poll_loop<T>(mut sensor: Sensor<T>, opts: &OutputOptions, interval: Duration) -> Result<()>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut output =
        Output::open(opts.format, tokio::io::stdout(), opts.output.as_deref(), &opts.comment)
            .await?;

    sensor.start_measurement().await?;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {},
            _ = tokio::signal::ctrl_c() => break,
        }

        let reading = sensor.read_values().await;

        if let Some(m) = util::warn_catch!(reading, "reading measured values") {
            output.sample(&m).await?;
        }
    }

    util::trace_catch!(sensor.stop_measurement().await, "stopping measurement");
    tracing::info!("data logging stopped");

    Ok(())
}
