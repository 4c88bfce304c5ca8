//! Fixed-duration variant: collect the default channel for a number of
//! seconds, then print every collected row as a table.

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use gdx_acquire::{
    CancelToken, Connection, Recorder, RunLimit, SensorSelection, Session, SimulatedDevice,
    TableSink,
};

fn main() -> ExitCode {
    env_logger::init();

    // recording duration in seconds; the original frontend defaulted to 10
    let seconds: u64 = env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(10);

    let device = match SimulatedDevice::open(Connection::Usb, "GDX-HD 15600161") {
        Ok(device) => device,
        Err(e) => {
            eprintln!("Could not open sensor interface: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut session = Session::new(device);
    let mut table = TableSink::new();
    let recorder = Recorder::new(
        RunLimit::For(Duration::from_secs(seconds)),
        CancelToken::new(),
    );

    println!("Recording for {} seconds...", seconds);
    match recorder.run(&mut session, SensorSelection::default(), &mut table) {
        Ok(reason) => {
            println!("\nRecording complete ({}). Data points collected:", reason);
            print!("{}", table.render());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error reading sensor data: {}", e);
            ExitCode::FAILURE
        }
    }
}
