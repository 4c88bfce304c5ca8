//! The timer half of a run: drives a session's poll at the sampling period
//! until something ends it.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::warn;

use crate::acquisition::{Polled, SensorSelection, Session, StopReason};
use crate::sink::SampleSink;
use crate::{AcquireError, SensorDevice};

/// Sampling interval used when interactive input is not a positive integer.
pub const DEFAULT_INTERVAL_MS: u32 = SensorSelection::DEFAULT_PERIOD_MS;

/// Parses an interactive sampling interval in milliseconds.
///
/// Anything that is not a positive integer falls back to
/// [DEFAULT_INTERVAL_MS] with a logged warning; bad input never aborts a
/// recording the user is about to start.
pub fn parse_interval_ms(input: &str) -> u32 {
    match input.trim().parse::<u32>() {
        Ok(ms) if ms > 0 => ms,
        _ => {
            warn!(
                "invalid sampling interval {:?}; using default of {} ms",
                input.trim(),
                DEFAULT_INTERVAL_MS
            );
            DEFAULT_INTERVAL_MS
        }
    }
}

/// Clonable cancellation handle. One clone goes into the loop, the others go
/// to whatever may want to stop it (a keypress listener, a signal handler,
/// another thread). A single atomic flag written once; cancelling an
/// already-cancelled token is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the run stop at the next tick.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Spawns a helper thread that blocks on one line of stdin and cancels the
/// token. The thread exits after the first line (or on stdin closing, which
/// also cancels, so a run never outlives its controlling terminal).
pub fn cancel_on_enter(token: CancelToken) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut line = String::new();
        if let Err(e) = std::io::stdin().lock().read_line(&mut line) {
            warn!("could not read stdin: {}", e);
        }
        token.cancel();
    })
}

/// How long a run may last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunLimit {
    /// Collect until the token is cancelled or the device ends the stream.
    #[default]
    UntilCancelled,

    /// Collect for at most this long, then stop on the next tick.
    For(Duration),
}

impl RunLimit {
    fn expired(&self, started: Instant) -> bool {
        match self {
            RunLimit::UntilCancelled => false,
            RunLimit::For(limit) => started.elapsed() >= *limit,
        }
    }
}

/// Runs a session to completion on a best-effort timer.
///
/// The loop polls immediately on start and then sleeps one sampling period
/// between polls, so cadence is approximate: a slow consumer stretches the
/// tick rather than queueing ticks, and a cancel lands before the next poll.
pub struct Recorder {
    limit: RunLimit,
    token: CancelToken,
}

impl Recorder {
    pub fn new(limit: RunLimit, token: CancelToken) -> Self {
        Self { limit, token }
    }

    /// Starts the session with the given selection and polls it at the
    /// selection's period until the token is cancelled, the limit expires,
    /// the device ends the stream, or the device fails.
    ///
    /// The session is always Stopped when this returns, with the device
    /// released exactly once. The returned [StopReason] is the cause that
    /// actually ended the run.
    pub fn run<D: SensorDevice, S: SampleSink>(
        &self,
        session: &mut Session<D>,
        selection: SensorSelection,
        sink: &mut S,
    ) -> Result<StopReason, AcquireError> {
        let period = selection.period();
        session.start(selection)?;
        let started = Instant::now();

        loop {
            if self.token.is_cancelled() {
                session.stop(StopReason::Requested);
                sink.on_stop(StopReason::Requested);
                return Ok(StopReason::Requested);
            }
            if self.limit.expired(started) {
                session.stop(StopReason::DurationElapsed);
                sink.on_stop(StopReason::DurationElapsed);
                return Ok(StopReason::DurationElapsed);
            }

            match session.poll(sink) {
                Ok(Polled::Samples(_)) => {}
                Ok(Polled::EndOfStream) => {
                    sink.on_stop(StopReason::EndOfStream);
                    return Ok(StopReason::EndOfStream);
                }
                Err(e) => {
                    // the session already forced itself to Stopped
                    sink.on_stop(StopReason::DeviceFault);
                    return Err(e);
                }
            }

            thread::sleep(period);
        }
    }
}
