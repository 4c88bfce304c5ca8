//! Timer-driven acquisition sessions for Go Direct style sensor interfaces.
//!
//! The vendor interface is modeled by the [SensorDevice] trait: select some
//! sensor channels, start sampling at a fixed period, read one value per
//! channel per tick, then stop and close. A [Session](acquisition::Session)
//! owns one device for one start-to-stop collection run and turns readings
//! into timestamped [Sample](acquisition::Sample)s; a
//! [Recorder](recorder::Recorder) drives the session on a best-effort timer
//! and hands every sample to a [SampleSink](sink::SampleSink) consumer.
//!
//! No wire protocol lives in this crate. [SimulatedDevice] is the shipped
//! implementation of the device seam and produces deterministic signals, so
//! everything here runs (and is tested) without hardware attached.
//!
//! # Examples
//!
//! ```
//! use gdx_acquire::{
//!     CancelToken, Recorder, RunLimit, SensorSelection, Session, SimulatedDevice, TableSink,
//! };
//!
//! let device = SimulatedDevice::scripted(vec![vec![1.2], vec![1.4], vec![1.5]]);
//! let mut session = Session::new(device);
//! let mut table = TableSink::new();
//!
//! let recorder = Recorder::new(RunLimit::UntilCancelled, CancelToken::new());
//! let reason = recorder
//!     .run(&mut session, SensorSelection::new(vec![1], 1), &mut table)
//!     .expect("scripted run completes");
//!
//! println!("stopped: {}, {} rows", reason, table.rows().len());
//! ```

use std::error::Error;

#[macro_use]
extern crate derive_more;

pub mod acquisition;
pub mod recorder;
pub mod simulate;
pub mod sink;

pub use acquisition::{Polled, Sample, SensorSelection, Session, SessionState, StopReason};
pub use recorder::{cancel_on_enter, parse_interval_ms, CancelToken, Recorder, RunLimit};
pub use simulate::SimulatedDevice;
pub use sink::{ConsoleSink, SampleSink, TableSink};

/// Error that occurred while opening or configuring the device
#[derive(Debug, Display)]
pub enum OpenError {
    /// No interface matching the requested name was found
    #[display(fmt = "NoDevice {{ wanted: {} }}", _0)]
    NoDevice(String),

    /// A sensor channel id the interface does not expose
    #[display(fmt = "UnknownChannel {{ id: {} }}", _0)]
    UnknownChannel(u8),

    /// The handle was already released; a closed device cannot be configured
    #[display(fmt = "device handle is closed")]
    Closed,

    /// IO error on the underlying connection
    PipeError(std::io::Error),
}

impl Error for OpenError {}

impl From<std::io::Error> for OpenError {
    fn from(value: std::io::Error) -> Self {
        Self::PipeError(value)
    }
}

/// Error that occurred while reading a measurement back from the device
#[derive(Debug, Display)]
pub enum ReadError {
    /// IO error when communicating with the device
    PipeError(std::io::Error),

    /// The device produced a reading that could not be interpreted
    ParseError(String),

    /// read was called while the device was not sampling
    #[display(fmt = "read called outside of sampling")]
    NotSampling,
}

impl Error for ReadError {}

impl From<std::io::Error> for ReadError {
    fn from(value: std::io::Error) -> Self {
        Self::PipeError(value)
    }
}

/// Umbrella error for a collection run. Everything here resolves the same
/// way at the call site: log the message and force the session to stop.
#[derive(Debug, Display)]
pub enum AcquireError {
    /// Error occurred while opening/configuring the device
    OpenError(OpenError),

    /// Error occurred while reading a measurement
    ReadError(ReadError),

    /// The session was driven outside its state machine
    SessionError(String),
}

impl Error for AcquireError {}

impl From<OpenError> for AcquireError {
    fn from(value: OpenError) -> Self {
        Self::OpenError(value)
    }
}

impl From<ReadError> for AcquireError {
    fn from(value: ReadError) -> Self {
        Self::ReadError(value)
    }
}

/// Transport used to reach the sensor interface
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    /// USB cable
    #[display(fmt = "usb")]
    Usb,

    /// Bluetooth Low Energy
    #[display(fmt = "ble")]
    Ble,
}

/// The vendor SDK surface: one already-open sensor interface.
///
/// Opening belongs to the implementor's constructor (see
/// [SimulatedDevice::open]), the way a transport-backed handle would own its
/// port. A session calls the remaining operations in a fixed order:
/// [select_sensors](SensorDevice::select_sensors), then
/// [start](SensorDevice::start), then [read](SensorDevice::read) once per
/// tick, then [stop](SensorDevice::stop) and [close](SensorDevice::close)
/// exactly once when the run ends.
pub trait SensorDevice {
    /// Chooses which sensor channels report on subsequent reads. An empty
    /// list selects the interface's default channel.
    fn select_sensors(&mut self, channels: &[u8]) -> Result<(), OpenError>;

    /// Begins sampling at the given period in milliseconds.
    fn start(&mut self, period_ms: u32) -> Result<(), OpenError>;

    /// Takes one measurement: one value per selected channel, in selection
    /// order. `Ok(None)` is the end-of-stream signal; the device will not
    /// produce again and the caller must stop the run.
    fn read(&mut self) -> Result<Option<Vec<f64>>, ReadError>;

    /// Stops sampling. Idempotent.
    fn stop(&mut self);

    /// Releases the handle. Idempotent.
    fn close(&mut self);

    /// Human-readable description of the selected channels (name and unit),
    /// suitable for printing as column headers.
    fn enabled_sensor_info(&self) -> String;
}
