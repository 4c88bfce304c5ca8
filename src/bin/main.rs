//! Interactive console variant: prompt for a sampling interval, collect the
//! force channel until Enter is pressed or the device ends the stream, and
//! print one line per sample.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use gdx_acquire::{
    cancel_on_enter, parse_interval_ms, CancelToken, Connection, ConsoleSink, Recorder, RunLimit,
    SensorDevice, SensorSelection, Session, SimulatedDevice,
};

const DEVICE_NAME: &str = "GDX-HD 15600161";
const FORCE_CHANNEL: u8 = 1;

fn main() -> ExitCode {
    env_logger::init();

    print!("Enter sampling interval in milliseconds (e.g., 1000 for 1 second): ");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        line.clear();
    }
    let interval_ms = parse_interval_ms(&line);

    let mut device = match SimulatedDevice::open(Connection::Usb, DEVICE_NAME) {
        Ok(device) => device,
        Err(e) => {
            eprintln!("Could not open sensor interface: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = device.select_sensors(&[FORCE_CHANNEL]) {
        eprintln!("Could not select sensors: {}", e);
        return ExitCode::FAILURE;
    }
    println!("\nSelected Sensors: {}\n", device.enabled_sensor_info());

    let token = CancelToken::new();
    println!("Press Enter to stop data collection...");
    cancel_on_enter(token.clone());

    let mut session = Session::new(device);
    let recorder = Recorder::new(RunLimit::UntilCancelled, token);
    match recorder.run(
        &mut session,
        SensorSelection::new(vec![FORCE_CHANNEL], interval_ms),
        &mut ConsoleSink,
    ) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error reading sensor data: {}", e);
            ExitCode::FAILURE
        }
    }
}
