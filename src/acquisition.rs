//! The collection run state machine: one device, one start-to-stop session.

use std::fmt;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::sink::SampleSink;
use crate::{AcquireError, ReadError, SensorDevice};

/// One timestamped sensor reading. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time since the session started collecting.
    pub elapsed: Duration,

    /// The measured value, in the channel's native unit.
    pub value: f64,
}

impl Sample {
    /// The timestamp as float seconds since the start of collection.
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Timestamp: {:.3}s / {}ms: {}",
            self.elapsed.as_secs_f64(),
            self.elapsed.as_millis(),
            self.value
        )
    }
}

/// Which channels to collect and how often. Immutable for the duration of a
/// run; build a new one to change either field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSelection {
    channels: Vec<u8>,
    period_ms: u32,
}

impl SensorSelection {
    /// Sampling period used when the requested one is unusable.
    pub const DEFAULT_PERIOD_MS: u32 = 1000;

    /// Builds a selection. A zero period cannot drive a timer, so it falls
    /// back to [Self::DEFAULT_PERIOD_MS] with a logged warning rather than
    /// failing, matching how invalid interactive input is handled.
    pub fn new(channels: Vec<u8>, period_ms: u32) -> Self {
        let period_ms = if period_ms == 0 {
            warn!(
                "sampling period of 0 ms is invalid; using default {} ms",
                Self::DEFAULT_PERIOD_MS
            );
            Self::DEFAULT_PERIOD_MS
        } else {
            period_ms
        };
        Self {
            channels,
            period_ms,
        }
    }

    /// Channel ids, in the order the device will report them.
    pub fn channels(&self) -> &[u8] {
        &self.channels
    }

    /// Sampling period in milliseconds. Always positive.
    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Sampling period as a [Duration].
    pub fn period(&self) -> Duration {
        Duration::from_millis(u64::from(self.period_ms))
    }
}

impl Default for SensorSelection {
    /// The original tool's defaults: the first channel at one sample per second.
    fn default() -> Self {
        Self::new(vec![1], Self::DEFAULT_PERIOD_MS)
    }
}

/// Lifecycle of a collection run. Exactly one state is active at a time and
/// the only transitions are Idle→Collecting and Collecting→Stopped.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed, device not yet configured
    Idle,

    /// Sampling; the device handle is held exclusively
    Collecting,

    /// Run over, device released. Terminal.
    Stopped,
}

/// Why a run ended.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// stop was called, directly or through a cancellation token
    #[display(fmt = "stop requested")]
    Requested,

    /// The configured collection duration ran out
    #[display(fmt = "collection duration elapsed")]
    DurationElapsed,

    /// The device signalled end of stream (a null reading)
    #[display(fmt = "device ended the stream")]
    EndOfStream,

    /// The device failed during open or read
    #[display(fmt = "device fault")]
    DeviceFault,
}

/// Outcome of one successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polled {
    /// This many samples were appended, one per selected channel
    Samples(usize),

    /// The device ended the stream; the session is now stopped
    EndOfStream,
}

/// Samples collected for one selected channel.
#[derive(Debug, Clone)]
pub struct ChannelSeries {
    /// The channel id these samples came from.
    pub channel: u8,

    /// Samples in arrival order. Timestamps are monotonically non-decreasing.
    pub samples: Vec<Sample>,
}

/// One start-to-stop collection run against one device.
///
/// The session owns the device handle exclusively for its whole lifetime and
/// releases it exactly once, no matter how the run ends. Any device error
/// forces an unconditional stop; there are no retries.
pub struct Session<D: SensorDevice> {
    device: D,
    state: SessionState,
    started_at: Instant,
    series: Vec<ChannelSeries>,
    stop_reason: Option<StopReason>,
}

impl<D: SensorDevice> Session<D> {
    /// Wraps an open device in an idle session.
    pub fn new(device: D) -> Self {
        Self {
            device,
            state: SessionState::Idle,
            started_at: Instant::now(),
            series: Vec::new(),
            stop_reason: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Why the run ended, once it has.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// The wrapped device. The session keeps exclusive ownership; this is a
    /// read-only view for status queries.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Collected samples for every selected channel, in selection order.
    pub fn series(&self) -> &[ChannelSeries] {
        &self.series
    }

    /// Collected samples for one channel id, if it was selected.
    pub fn samples(&self, channel: u8) -> Option<&[Sample]> {
        self.series
            .iter()
            .find(|s| s.channel == channel)
            .map(|s| s.samples.as_slice())
    }

    /// Configures the device and begins collecting: Idle→Collecting.
    ///
    /// On any device error the session is forced straight to Stopped with
    /// the handle released, and the error is returned.
    pub fn start(&mut self, selection: SensorSelection) -> Result<(), AcquireError> {
        if self.state != SessionState::Idle {
            return Err(AcquireError::SessionError(format!(
                "start called in state {}",
                self.state
            )));
        }

        if let Err(e) = self
            .device
            .select_sensors(selection.channels())
            .and_then(|_| self.device.start(selection.period_ms()))
        {
            warn!("could not configure device: {}", e);
            self.finish(StopReason::DeviceFault);
            return Err(e.into());
        }

        info!(
            "collecting {} every {} ms",
            self.device.enabled_sensor_info(),
            selection.period_ms()
        );

        self.series = selection
            .channels()
            .iter()
            .map(|&channel| ChannelSeries {
                channel,
                samples: Vec::new(),
            })
            .collect();
        self.started_at = Instant::now();
        self.state = SessionState::Collecting;
        Ok(())
    }

    /// Takes one reading and appends one timestamped sample per channel,
    /// notifying the sink for each.
    ///
    /// A null reading from the device stops the session and releases the
    /// handle; a device error does the same and is then returned.
    pub fn poll<S: SampleSink>(&mut self, sink: &mut S) -> Result<Polled, AcquireError> {
        if self.state != SessionState::Collecting {
            return Err(AcquireError::SessionError(format!(
                "poll called in state {}",
                self.state
            )));
        }

        let values = match self.device.read() {
            Ok(Some(values)) => values,
            Ok(None) => {
                self.finish(StopReason::EndOfStream);
                return Ok(Polled::EndOfStream);
            }
            Err(e) => {
                warn!("error reading sensor data: {}", e);
                self.finish(StopReason::DeviceFault);
                return Err(e.into());
            }
        };

        if values.len() != self.series.len() {
            let e = ReadError::ParseError(format!(
                "expected {} channel values, device reported {}",
                self.series.len(),
                values.len()
            ));
            warn!("error reading sensor data: {}", e);
            self.finish(StopReason::DeviceFault);
            return Err(e.into());
        }

        let elapsed = self.started_at.elapsed();
        for (series, value) in self.series.iter_mut().zip(values) {
            let sample = Sample { elapsed, value };
            series.samples.push(sample);
            sink.on_sample(series.channel, &sample);
        }
        Ok(Polled::Samples(self.series.len()))
    }

    /// Ends the run: Collecting→Stopped. Idempotent; a second call is a
    /// no-op and the device is released exactly once.
    pub fn stop(&mut self, reason: StopReason) {
        self.finish(reason);
    }

    fn finish(&mut self, reason: StopReason) {
        if self.state == SessionState::Stopped {
            return;
        }
        self.device.stop();
        self.device.close();
        self.state = SessionState::Stopped;
        self.stop_reason = Some(reason);
        info!("collection stopped: {}", reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::SimulatedDevice;
    use crate::sink::TableSink;

    fn scripted_session(readings: Vec<Vec<f64>>) -> Session<SimulatedDevice> {
        Session::new(SimulatedDevice::scripted(readings))
    }

    #[test]
    fn poll_appends_one_sample_per_channel() {
        let mut session = scripted_session(vec![vec![1.5, -0.25]]);
        session
            .start(SensorSelection::new(vec![1, 2], 100))
            .expect("starts");
        assert_eq!(session.state(), SessionState::Collecting);

        let mut table = TableSink::new();
        let polled = session.poll(&mut table).expect("polls");
        assert_eq!(polled, Polled::Samples(2));

        assert_eq!(session.samples(1).expect("channel 1 selected").len(), 1);
        assert_eq!(session.samples(1).unwrap()[0].value, 1.5);
        assert_eq!(session.samples(2).unwrap()[0].value, -0.25);
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn timestamps_are_monotonically_non_decreasing() {
        let readings: Vec<Vec<f64>> = (0..5).map(|i| vec![f64::from(i)]).collect();
        let mut session = scripted_session(readings);
        session
            .start(SensorSelection::new(vec![1], 100))
            .expect("starts");

        let mut sink = ();
        for _ in 0..5 {
            session.poll(&mut sink).expect("polls");
        }

        let samples = session.samples(1).unwrap();
        assert_eq!(samples.len(), 5);
        assert!(samples.windows(2).all(|w| w[0].elapsed <= w[1].elapsed));
    }

    #[test]
    fn null_reading_stops_and_releases_the_device() {
        let mut session = scripted_session(vec![vec![1.0]]);
        session
            .start(SensorSelection::new(vec![1], 100))
            .expect("starts");

        let mut sink = ();
        assert_eq!(session.poll(&mut sink).expect("first poll"), Polled::Samples(1));
        assert_eq!(
            session.poll(&mut sink).expect("script exhausted"),
            Polled::EndOfStream
        );

        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(session.stop_reason(), Some(StopReason::EndOfStream));
        assert_eq!(session.device().close_calls(), 1);

        // and only a null reading does: a stopped session refuses to poll
        assert!(session.poll(&mut sink).is_err());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut session = scripted_session(vec![vec![1.0]]);
        session
            .start(SensorSelection::new(vec![1], 100))
            .expect("starts");

        session.stop(StopReason::Requested);
        session.stop(StopReason::DurationElapsed);

        assert_eq!(session.state(), SessionState::Stopped);
        // the first stop wins; the second was a no-op
        assert_eq!(session.stop_reason(), Some(StopReason::Requested));
        assert_eq!(session.device().stop_calls(), 1);
        assert_eq!(session.device().close_calls(), 1);
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut session = scripted_session(vec![vec![1.0]]);
        session
            .start(SensorSelection::default())
            .expect("first start");
        assert!(session.start(SensorSelection::default()).is_err());
    }

    #[test]
    fn channel_count_mismatch_is_a_device_fault() {
        // two channels selected but the script reports a single value
        let mut session = scripted_session(vec![vec![1.0]]);
        session
            .start(SensorSelection::new(vec![1, 2], 100))
            .expect("starts");

        let mut sink = ();
        assert!(session.poll(&mut sink).is_err());
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(session.stop_reason(), Some(StopReason::DeviceFault));
        assert_eq!(session.device().close_calls(), 1);
    }

    #[test]
    fn zero_period_falls_back_to_default() {
        let selection = SensorSelection::new(vec![1], 0);
        assert_eq!(selection.period_ms(), SensorSelection::DEFAULT_PERIOD_MS);
    }

    #[test]
    fn sample_renders_the_console_line_format() {
        let sample = Sample {
            elapsed: Duration::from_millis(1003),
            value: 2.5,
        };
        assert_eq!(sample.to_string(), "Timestamp: 1.003s / 1003ms: 2.5");
    }
}
