use std::time::Duration;

use tokio::io::{
    AsyncReadExt,
    AsyncWriteExt,
    DuplexStream,
};

use sps30::{
    message::{
        Command,
        Interpreter,
        Measurement,
    },
    Error,
    Sensor,
};

mod common;

async fn expect_request(device: &mut DuplexStream, expected: &[u8]) -> eyre::Result<()> {
    let mut buf = vec![0; expected.len()];
    device.read_exact(&mut buf).await?;

    assert_eq!(hex::encode(&buf), hex::encode(expected));

    Ok(())
}

fn serial_payload() -> Vec<u8> {
    let mut payload = b"F3B2C8A1E0D4F5A6".to_vec();
    payload.resize(32, 0);
    payload
}

#[tokio::test]
async fn test_serial_number() -> eyre::Result<()> {
    common::trace_init();

    let (client, mut device) = tokio::io::duplex(256);
    let mut sensor = Sensor::new(client);

    let device = async move {
        expect_request(&mut device, &[0x7e, 0x00, 0xd0, 0x01, 0x03, 0x2b, 0x7e]).await?;
        device.write_all(&common::wire(0xd0, 0x00, &serial_payload())).await?;

        eyre::Result::<_>::Ok(device)
    };

    let (sn, device) = tokio::join!(sensor.serial_number(), device);
    device?;

    assert_eq!(sn?.as_ref(), "F3B2C8A1E0D4F5A6");

    Ok(())
}

#[tokio::test]
async fn test_firmware_version() -> eyre::Result<()> {
    let (client, mut device) = tokio::io::duplex(256);
    let mut sensor = Sensor::new(client);

    let device = async move {
        expect_request(&mut device, &[0x7e, 0x00, 0xd1, 0x00, 0x2e, 0x7e]).await?;
        device.write_all(&common::wire(0xd1, 0x00, &[2, 2, 0, 7, 0, 2, 0])).await?;

        eyre::Result::<_>::Ok(device)
    };

    let (version, device) = tokio::join!(sensor.firmware_version(), device);
    device?;

    let version = version?;
    assert_eq!(version.to_string(), "2.2");
    assert_eq!(version.hardware_revision, 7);

    Ok(())
}

#[tokio::test]
async fn test_start_and_read() -> eyre::Result<()> {
    let (client, mut device) = tokio::io::duplex(256);
    let mut sensor = Sensor::new(client);

    let reading = Measurement::from([1.0, 2.5, 4.0, 10.0, 3.0, 4.0, 5.0, 6.0, 7.0, 0.5]);

    let device = async move {
        expect_request(&mut device, &[0x7e, 0x00, 0x00, 0x02, 0x01, 0x03, 0xf9, 0x7e]).await?;
        device.write_all(&common::wire(0x00, 0x00, &[])).await?;

        expect_request(&mut device, &[0x7e, 0x00, 0x03, 0x00, 0xfc, 0x7e]).await?;
        device.write_all(&common::measurement_wire(&reading)).await?;

        expect_request(&mut device, &[0x7e, 0x00, 0x01, 0x00, 0xfe, 0x7e]).await?;
        device.write_all(&common::wire(0x01, 0x00, &[])).await?;

        eyre::Result::<_>::Ok(device)
    };

    let client = async {
        sensor.start_measurement().await?;
        let m = sensor.read_values().await?;
        sensor.stop_measurement().await?;

        sps30::Result::<_>::Ok(m)
    };

    let (m, device) = tokio::join!(client, device);
    device?;

    assert_eq!(m?, reading);

    Ok(())
}

#[tokio::test]
async fn test_device_error_state() -> eyre::Result<()> {
    let (client, mut device) = tokio::io::duplex(256);
    let mut sensor = Sensor::new(client);

    let device = async move {
        expect_request(&mut device, &[0x7e, 0x00, 0x00, 0x02, 0x01, 0x03, 0xf9, 0x7e]).await?;
        device.write_all(&common::wire(0x00, 0x04, &[])).await?;

        eyre::Result::<_>::Ok(device)
    };

    let (result, device) = tokio::join!(sensor.start_measurement(), device);
    device?;

    assert!(matches!(result, Err(Error::DeviceState {
        command: Command::StartMeasurement,
        state: 0x04,
    })));

    Ok(())
}

#[tokio::test]
async fn test_start_while_already_measuring() -> eyre::Result<()> {
    let (client, mut device) = tokio::io::duplex(256);
    let mut sensor = Sensor::new(client);

    let reading = Measurement::from([5.0; Measurement::FIELDS]);

    let device = async move {
        expect_request(&mut device, &[0x7e, 0x00, 0x00, 0x02, 0x01, 0x03, 0xf9, 0x7e]).await?;
        device.write_all(&common::wire(0x00, 0x43, &[])).await?;

        expect_request(&mut device, &[0x7e, 0x00, 0x03, 0x00, 0xfc, 0x7e]).await?;
        device.write_all(&common::measurement_wire(&reading)).await?;

        eyre::Result::<_>::Ok(device)
    };

    let client = async {
        sensor.start_measurement().await?;
        sensor.read_values().await
    };

    let (m, device) = tokio::join!(client, device);
    device?;

    assert_eq!(m?, reading);

    Ok(())
}

#[tokio::test]
async fn test_not_allowed_is_still_an_error_for_other_commands() -> eyre::Result<()> {
    let (client, mut device) = tokio::io::duplex(256);
    let mut sensor = Sensor::new(client);

    let device = async move {
        expect_request(&mut device, &[0x7e, 0x00, 0x01, 0x00, 0xfe, 0x7e]).await?;
        device.write_all(&common::wire(0x01, 0x43, &[])).await?;

        eyre::Result::<_>::Ok(device)
    };

    let (result, device) = tokio::join!(sensor.stop_measurement(), device);
    device?;

    assert!(matches!(result, Err(Error::DeviceState {
        command: Command::StopMeasurement,
        state: 0x43,
    })));

    Ok(())
}

#[tokio::test]
async fn test_skips_unrelated_frames() -> eyre::Result<()> {
    let (client, mut device) = tokio::io::duplex(512);
    let mut sensor = Sensor::new(client);

    let device = async move {
        expect_request(&mut device, &[0x7e, 0x00, 0xd1, 0x00, 0x2e, 0x7e]).await?;

        // a stale measurement, line noise, a truncated frame, then the real answer
        device.write_all(&common::measurement_wire(&Measurement::ZERO)).await?;
        device.write_all(&[0x13, 0x11, 0x55]).await?;
        device.write_all(&[0x7e, 0x00, 0xd1, 0x7e]).await?;
        device.write_all(&common::wire(0xd1, 0x00, &[2, 3, 0, 7, 0, 2, 0])).await?;

        eyre::Result::<_>::Ok(device)
    };

    let (version, device) = tokio::join!(sensor.firmware_version(), device);
    device?;

    assert_eq!(version?.minor, 3);

    Ok(())
}

#[tokio::test]
async fn test_checksum_verification() -> eyre::Result<()> {
    let (client, mut device) = tokio::io::duplex(512);
    let mut sensor = Sensor::new(client).with_interpreter(Interpreter::new().verify_checksums(true));

    let device = async move {
        expect_request(&mut device, &[0x7e, 0x00, 0xd1, 0x00, 0x2e, 0x7e]).await?;

        let mut corrupt = common::wire(0xd1, 0x00, &[9, 9, 0, 7, 0, 2, 0]);
        let chk = corrupt.len() - 2;
        corrupt[chk] ^= 0x01;

        device.write_all(&corrupt).await?;
        device.write_all(&common::wire(0xd1, 0x00, &[2, 2, 0, 7, 0, 2, 0])).await?;

        eyre::Result::<_>::Ok(device)
    };

    let (version, device) = tokio::join!(sensor.firmware_version(), device);
    device?;

    assert_eq!(version?.major, 2);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_timeout() -> eyre::Result<()> {
    let (client, _device) = tokio::io::duplex(256);
    let mut sensor = Sensor::new(client).with_timeout(Duration::from_millis(100));

    let result = sensor.serial_number().await;

    assert!(matches!(
        result,
        Err(Error::Timeout(Command::ReadSerialNumber, t)) if t == Duration::from_millis(100)
    ));

    Ok(())
}

#[tokio::test]
async fn test_closed() {
    let (client, device) = tokio::io::duplex(256);
    let mut sensor = Sensor::new(client);

    drop(device);

    assert!(sensor.stop_measurement().await.is_err());
}
